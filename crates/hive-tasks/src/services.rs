//! The bundle of colony services handed to constructors and projects.

use hive_ledger::Ledger;
use hive_resources::ResourceManager;
use hive_world::World;

use crate::settings::TaskSettings;
use crate::timer::Timer;

/// Mutable handles to everything a job touches except the task market
/// itself, which is passed alongside when needed.
pub struct Services<'a> {
    /// The game host.
    pub world: &'a mut dyn World,
    /// Accounts and transactions.
    pub ledger: &'a mut Ledger,
    /// Resource directory.
    pub resources: &'a mut ResourceManager,
    /// Deferred job requests.
    pub timer: &'a mut Timer,
    /// Tunables.
    pub settings: &'a TaskSettings,
}

impl Services<'_> {
    /// Current game tick.
    pub fn tick(&self) -> u64 {
        self.world.tick()
    }
}
