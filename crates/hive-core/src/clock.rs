//! Tick clock for the colony.
//!
//! The clock is the single source of truth for the current tick. The world
//! host, the ledger, and every job read the tick the clock hands them at
//! the start of a cycle; nothing else advances time.

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,
}

/// Monotonic tick counter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickClock {
    /// Last tick started (0 before the first tick).
    tick: u64,
}

impl TickClock {
    /// A clock that has not started a tick yet.
    pub const fn new() -> Self {
        Self { tick: 0 }
    }

    /// Resume from a known tick (state restoration and tests).
    pub const fn starting_at(tick: u64) -> Self {
        Self { tick }
    }

    /// Advance the clock by one tick. Returns the new tick number.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the tick counter would exceed
    /// `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.tick = self.tick.checked_add(1).ok_or(ClockError::TickOverflow)?;
        Ok(self.tick)
    }

    /// Return the current tick number.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Whether `tick` is a multiple of `interval` (never for interval 0).
    pub const fn every(&self, interval: u64) -> bool {
        match self.tick.checked_rem(interval) {
            Some(rem) => rem == 0,
            None => false,
        }
    }
}
