//! Bounded async tick loop.
//!
//! [`run_colony`] wraps [`run_tick`](crate::tick::run_tick) with the
//! control plane from [`RunControl`]: pause/resume, variable tick speed,
//! a tick bound, and a clean stop.

use std::sync::Arc;

use tracing::{info, warn};

use crate::colony::ColonyState;
use crate::control::{EndReason, RunControl};
use crate::tick::{self, TickError, TickSummary};

/// Errors that can occur during a run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A tick execution failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },
}

/// Outcome of a run.
#[derive(Debug)]
pub struct RunResult {
    /// Why the run ended.
    pub end_reason: EndReason,
    /// The last tick summary, if any tick completed.
    pub final_summary: Option<TickSummary>,
    /// Ticks executed by this run.
    pub total_ticks: u64,
}

/// Called after each tick completes.
pub trait TickCallback: Send {
    /// Inspect the finished tick.
    fn on_tick(&mut self, summary: &TickSummary, colony: &ColonyState);
}

/// A callback that does nothing.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary, _colony: &ColonyState) {}
}

/// Run the colony until the tick bound is reached or a stop is requested.
///
/// # Errors
///
/// Returns [`RunnerError`] if a tick fails unrecoverably.
pub async fn run_colony(
    colony: &mut ColonyState,
    control: &Arc<RunControl>,
    callback: &mut dyn TickCallback,
) -> Result<RunResult, RunnerError> {
    let mut last_summary: Option<TickSummary> = None;
    let mut total_ticks: u64 = 0;

    info!(
        start_tick = colony.clock.tick(),
        max_ticks = control.max_ticks(),
        tick_interval_ms = control.tick_interval_ms(),
        "colony starting"
    );

    loop {
        // --- Check pause ---
        if control.is_paused() {
            info!("colony paused, waiting for resume");
            control.wait_if_paused().await;
            info!("colony resumed");
        }

        // --- Check stop request (before tick) ---
        if control.is_stop_requested() {
            info!("stop requested");
            return Ok(RunResult {
                end_reason: EndReason::Stopped,
                final_summary: last_summary,
                total_ticks,
            });
        }

        // --- Execute tick ---
        let summary = tick::run_tick(colony)?;
        total_ticks = total_ticks.saturating_add(1);

        callback.on_tick(&summary, colony);

        // --- Check tick limit (after tick) ---
        if control.tick_limit_reached(total_ticks) {
            info!(
                tick = summary.tick,
                max_ticks = control.max_ticks(),
                "tick limit reached"
            );
            return Ok(RunResult {
                end_reason: EndReason::MaxTicksReached,
                final_summary: Some(summary),
                total_ticks,
            });
        }

        last_summary = Some(summary);

        let interval_ms = control.tick_interval_ms();
        if interval_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(interval_ms)).await;
        }
    }
}

/// Log how a run ended.
pub fn log_run_end(result: &RunResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        final_tick = result.final_summary.as_ref().map(|s| s.tick),
        "colony run ended"
    );

    if let Some(ref summary) = result.final_summary {
        info!(
            tick = summary.tick,
            open_tasks = summary.open_tasks,
            creeps = summary.creeps,
            "final tick summary"
        );
    } else {
        warn!("colony run ended with no ticks executed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ColonyConfig;
    use hive_world::create_starting_colony;

    fn colony() -> ColonyState {
        let (world, _) = create_starting_colony(42).unwrap();
        ColonyState::new(&ColonyConfig::default(), world, None)
    }

    struct Counting {
        ticks: Vec<u64>,
    }

    impl TickCallback for Counting {
        fn on_tick(&mut self, summary: &TickSummary, colony: &ColonyState) {
            assert_eq!(summary.tick, colony.clock.tick());
            self.ticks.push(summary.tick);
        }
    }

    #[tokio::test]
    async fn bounded_by_max_ticks() {
        let mut colony = colony();
        let control = Arc::new(RunControl::new(0, 5));
        let mut cb = Counting { ticks: Vec::new() };

        let result = run_colony(&mut colony, &control, &mut cb).await.unwrap();

        assert_eq!(result.end_reason, EndReason::MaxTicksReached);
        assert_eq!(result.total_ticks, 5);
        assert_eq!(cb.ticks, vec![1, 2, 3, 4, 5]);
        assert_eq!(result.final_summary.map(|s| s.tick), Some(5));
    }

    #[tokio::test]
    async fn stop_before_first_tick() {
        let mut colony = colony();
        let control = Arc::new(RunControl::new(0, 0));
        control.request_stop();

        let result = run_colony(&mut colony, &control, &mut NoOpCallback)
            .await
            .unwrap();

        assert_eq!(result.end_reason, EndReason::Stopped);
        assert_eq!(result.total_ticks, 0);
        assert!(result.final_summary.is_none());
        assert_eq!(colony.clock.tick(), 0);
    }

    #[tokio::test]
    async fn resumed_colony_counts_from_its_clock() {
        let mut colony = colony();
        colony.clock = crate::clock::TickClock::starting_at(10);
        let control = Arc::new(RunControl::new(0, 3));

        let result = run_colony(&mut colony, &control, &mut NoOpCallback)
            .await
            .unwrap();

        assert_eq!(result.total_ticks, 3);
        assert_eq!(result.final_summary.map(|s| s.tick), Some(13));
    }
}
