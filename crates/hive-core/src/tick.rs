//! Tick cycle: the per-tick driver of the colony.
//!
//! Each tick runs these phases in order:
//!
//! 1. **Wake** -- advance the clock, the world host, and the ledger's tick;
//!    drain world events and let the resource directory forget objects
//!    that vanished.
//! 2. **Scan** -- register new structures and issue jobs for owned rooms.
//! 3. **Reissue** -- retry deferred job requests that fell due.
//! 4. **Check** -- prune jobs whose self check reports them dead. This
//!    always runs before execution.
//! 5. **Hire** -- offer idle creeps the best-paying open job, oldest creep
//!    first.
//! 6. **Run** -- step every job's workers through their projects.
//! 7. **Center** -- execute one queued same-room transfer per room.
//! 8. **Spawn** -- realize spawn requests for understaffed jobs.
//! 9. **Terminal** -- hand cross-room purchase requests to the terminal.
//!
//! The cycle is deterministic given the same starting state.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use hive_ledger::ConservationResult;
use hive_resources::{PurchaseRequest, ResourceManager};
use hive_tasks::{RunReport, Services, reissue_due};
use hive_types::RoomName;
use hive_world::{AdvanceReport, World, WorldEvent};

use crate::clock::ClockError;
use crate::colony::ColonyState;
use crate::scanner::{ScanReport, Scanner};
use crate::spawner::Spawned;

/// Settled transactions are dropped and the money journal compacted this
/// often.
pub const LEDGER_PRUNE_INTERVAL: u64 = 100;

/// Errors that can occur during tick execution.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// A world operation failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: hive_world::WorldError,
    },
}

/// Summary of a single tick's execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// The tick number that was executed.
    pub tick: u64,
    /// What the world host did on wake.
    pub world: AdvanceReport,
    /// Events drained from the world.
    pub events: usize,
    /// Registrations and jobs from the scanner.
    pub scan: ScanReport,
    /// Deferred requests reissued.
    pub reissued: usize,
    /// Jobs pruned by their self check.
    pub removed: usize,
    /// Creeps hired this tick.
    pub hired: usize,
    /// What job execution did.
    pub run: RunReport,
    /// Units moved by center transfers.
    pub center_moved: u32,
    /// Creeps spawned.
    pub spawned: Vec<Spawned>,
    /// Purchase requests handed to the terminal.
    pub purchases: Vec<PurchaseRequest>,
    /// Jobs open at end of tick.
    pub open_tasks: usize,
    /// Creeps alive at end of tick.
    pub creeps: usize,
}

/// Execute one complete tick of the colony.
///
/// # Errors
///
/// Returns [`TickError`] if the clock overflows or the world host fails to
/// advance. Job-level failures never surface here; they are handled by the
/// jobs themselves.
pub fn run_tick(colony: &mut ColonyState) -> Result<TickSummary, TickError> {
    // --- Phase 1: Wake ---
    let tick = colony.clock.advance()?;
    let world = colony.world.advance(tick)?;
    colony.ledger.begin_tick(tick);
    let events = colony.world.drain_events();
    forget_vanished(&mut colony.resources, &mut colony.scanner, &colony.world, &events);
    debug!(tick, events = events.len(), regenerated = world.regenerated, "tick woke");

    let ColonyState {
        world: host,
        ledger,
        resources,
        tasks,
        timer,
        settings,
        scanner,
        ..
    } = colony;
    let mut services = Services {
        world: host,
        ledger,
        resources,
        timer,
        settings,
    };

    // --- Phase 2: Scan ---
    let scan = scanner.scan(tasks, &mut services);

    // --- Phase 3: Reissue ---
    let reissued = reissue_due(tasks, &mut services).len();

    // --- Phase 4: Check ---
    let removed = tasks.check(&mut services).len();

    // --- Phase 5: Hire ---
    let hired = tasks.assign_idle(&mut services).len();

    // --- Phase 6: Run ---
    let run = tasks.run(&mut services);

    // --- Phase 7: Center ---
    let center_moved = colony
        .resources
        .run_center_transfers(&mut colony.world)
        .into_iter()
        .fold(0_u32, |acc, (_, units)| acc.saturating_add(units));

    // --- Phase 8: Spawn ---
    let spawned = colony.spawner.run(&colony.tasks, &mut colony.world);

    // --- Phase 9: Terminal ---
    let purchases = colony.resources.take_purchase_requests();
    for request in &purchases {
        info!(
            tick,
            room = %request.room,
            resource = ?request.resource,
            amount = request.amount,
            "purchase requested"
        );
    }

    if colony.clock.every(LEDGER_PRUNE_INTERVAL) {
        let pruned = colony.ledger.prune_settled();
        debug!(tick, pruned, "settled transactions pruned");
        if let ConservationResult::Anomaly(anomaly) = colony.ledger.compact_journal() {
            warn!(tick, message = %anomaly.message, "money journal left uncompacted");
        }
    }

    let summary = TickSummary {
        tick,
        world,
        events: events.len(),
        scan,
        reissued,
        removed,
        hired,
        run,
        center_moved,
        spawned,
        purchases,
        open_tasks: colony.tasks.len(),
        creeps: colony.world.creeps().len(),
    };
    info!(
        tick,
        open_tasks = summary.open_tasks,
        creeps = summary.creeps,
        issued = summary.scan.issued,
        removed,
        hired,
        ran = summary.run.ran,
        spawned = summary.spawned.len(),
        "tick complete"
    );
    Ok(summary)
}

/// Drop cached sums and descriptors for rooms where objects disappeared.
fn forget_vanished(
    resources: &mut ResourceManager,
    scanner: &mut Scanner,
    world: &dyn World,
    events: &[WorldEvent],
) {
    let mut rooms: BTreeSet<&RoomName> = BTreeSet::new();
    for event in events {
        match event {
            WorldEvent::ObjectRemoved { id, .. } => scanner.forget(*id),
            WorldEvent::SiteCompleted { site, .. } => scanner.forget(*site),
        }
        rooms.insert(event.room());
    }
    for room in rooms {
        resources.on_structure_destroyed(world, room);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ColonyConfig;
    use hive_types::{ObjectKind, ResourceType};
    use hive_world::create_starting_colony;

    fn colony() -> (ColonyState, hive_world::StartingColonyIds) {
        let (world, ids) = create_starting_colony(42).unwrap();
        (ColonyState::new(&ColonyConfig::default(), world, None), ids)
    }

    #[test]
    fn tick_advances_every_clock() {
        let (mut colony, _) = colony();
        let summary = run_tick(&mut colony).unwrap();
        assert_eq!(summary.tick, 1);
        assert_eq!(colony.clock.tick(), 1);
        assert_eq!(colony.world.tick(), 1);
        assert_eq!(colony.ledger.tick(), 1);
    }

    #[test]
    fn first_tick_registers_and_hires() {
        let (mut colony, ids) = colony();
        let summary = run_tick(&mut colony).unwrap();
        assert!(summary.scan.registered > 0);
        assert!(summary.scan.issued > 0);
        assert!(summary.hired > 0);
        assert!(colony.scanner.is_registered(ids.storage));
        assert_eq!(colony.tasks.fetch(ids.sites.first().copied(), "build").len(), 1);
    }

    #[test]
    fn extensions_fill_over_time() {
        let (mut colony, ids) = colony();
        for _ in 0..60 {
            run_tick(&mut colony).unwrap();
        }
        let stored: u32 = ids
            .extensions
            .iter()
            .filter_map(|id| colony.world.object(*id))
            .map(|o| o.stored(ResourceType::Energy))
            .sum();
        assert!(stored > 0, "no extension received energy");
    }

    #[test]
    fn vanished_objects_are_forgotten() {
        let (mut colony, ids) = colony();
        run_tick(&mut colony).unwrap();
        assert!(colony.scanner.is_registered(ids.container));

        assert!(colony.world.remove_object(ids.container).is_some());
        run_tick(&mut colony).unwrap();
        assert!(!colony.scanner.is_registered(ids.container));
        assert!(
            colony
                .world
                .room_objects(&ids.home)
                .iter()
                .all(|o| o.kind != ObjectKind::Container)
        );
    }

    #[test]
    fn ledger_stays_conserved() {
        let (mut colony, _) = colony();
        for _ in 0..120 {
            run_tick(&mut colony).unwrap();
        }
        assert_eq!(colony.ledger.verify_conservation(), ConservationResult::Balanced);
    }

    #[test]
    fn journal_is_compacted_on_the_prune_interval() {
        let (mut colony, _) = colony();
        for _ in 1..LEDGER_PRUNE_INTERVAL {
            run_tick(&mut colony).unwrap();
        }
        assert!(!colony.ledger.journal().is_empty());

        run_tick(&mut colony).unwrap();
        assert!(colony.ledger.journal().is_empty());
        assert_eq!(colony.ledger.verify_conservation(), ConservationResult::Balanced);

        for _ in 0..10 {
            run_tick(&mut colony).unwrap();
        }
        assert_eq!(colony.ledger.verify_conservation(), ConservationResult::Balanced);
    }
}
