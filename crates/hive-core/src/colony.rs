//! The colony's long-lived state: the world host and every service the
//! task market needs, owned in one place and lent out per tick.

use rust_decimal::Decimal;
use tracing::info;

use hive_ledger::{BankSnapshot, Ledger};
use hive_resources::ResourceManager;
use hive_tasks::{
    Issue, Services, TaskManager, TaskSettings, Timer, claim_task, reserve_task, scout_task,
};
use hive_types::{ObjectKind, RoomName};
use hive_world::{World, WorldState};

use crate::clock::TickClock;
use crate::config::ColonyConfig;
use crate::scanner::Scanner;
use crate::spawner::Spawner;

/// Everything the tick driver mutates.
#[derive(Debug)]
pub struct ColonyState {
    /// The tick clock.
    pub clock: TickClock,
    /// The game host.
    pub world: WorldState,
    /// Accounts, transactions, and the bank.
    pub ledger: Ledger,
    /// Resource directory.
    pub resources: ResourceManager,
    /// Task market.
    pub tasks: TaskManager,
    /// Deferred job requests.
    pub timer: Timer,
    /// Task tunables.
    pub settings: TaskSettings,
    /// Registration and job scanner for owned rooms.
    pub scanner: Scanner,
    /// Spawn request realizer.
    pub spawner: Spawner,
}

impl ColonyState {
    /// Assemble a colony around `world` from configuration.
    ///
    /// With a `snapshot` the bank's loan book is restored as saved;
    /// otherwise every owned spawn is granted `economy.starting_cash`.
    pub fn new(config: &ColonyConfig, world: WorldState, snapshot: Option<BankSnapshot>) -> Self {
        let policy = config.lending_policy();
        let restored = snapshot.is_some();
        let ledger = snapshot.map_or_else(
            || Ledger::new(policy),
            |snapshot| Ledger::restore(snapshot, policy),
        );
        let clock = TickClock::starting_at(world.tick());
        let mut colony = Self {
            clock,
            world,
            ledger,
            resources: ResourceManager::new(),
            tasks: TaskManager::new(),
            timer: Timer::new(),
            settings: config.task_settings(),
            scanner: Scanner::new(),
            spawner: Spawner::new(config.colony.max_creeps),
        };
        if !restored {
            colony.grant_starting_cash(config.economy.starting_cash);
        }
        colony
    }

    fn grant_starting_cash(&mut self, amount: Decimal) {
        if amount <= Decimal::ZERO {
            return;
        }
        let spawns: Vec<_> = self
            .world
            .owned_rooms()
            .iter()
            .flat_map(|room| self.world.room_objects(room))
            .filter(|o| o.kind == ObjectKind::Spawn)
            .map(|o| o.id)
            .collect();
        for spawn in spawns {
            self.ledger.grant(spawn, amount);
            info!(spawn = %spawn, amount = %amount, "starting cash granted");
        }
    }

    /// Lend out the task market and the services it works against.
    pub fn split(&mut self) -> (&mut TaskManager, Services<'_>) {
        (
            &mut self.tasks,
            Services {
                world: &mut self.world,
                ledger: &mut self.ledger,
                resources: &mut self.resources,
                timer: &mut self.timer,
                settings: &self.settings,
            },
        )
    }

    /// Issue a reservation job for `room`.
    pub fn reserve(&mut self, room: &RoomName) -> Issue {
        let (tasks, mut services) = self.split();
        reserve_task(tasks, &mut services, room)
    }

    /// Issue a claim job for `room`.
    pub fn claim(&mut self, room: &RoomName) -> Issue {
        let (tasks, mut services) = self.split();
        claim_task(tasks, &mut services, room)
    }

    /// Issue a scouting job for `room`.
    pub fn scout(&mut self, room: &RoomName) -> Issue {
        let (tasks, mut services) = self.split();
        scout_task(tasks, &mut services, room)
    }
}
