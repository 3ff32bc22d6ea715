//! Structure scanner: turns what owned rooms contain into registrations and
//! jobs.
//!
//! Each tick, per owned room, the scanner
//!
//! 1. files resource descriptors for structures and deposits it has not
//!    seen before, and enrolls storage, terminal, and link in the room's
//!    center group;
//! 2. issues a build job per construction site;
//! 3. issues a repair job per structure below the repair threshold;
//! 4. issues an energy request per spawn, extension, or tower with room to
//!    spare.
//!
//! Constructors are idempotent, so rescanning an unchanged room costs
//! lookups only.

use std::collections::BTreeSet;

use tracing::debug;

use hive_resources::{Possession, ResourceDescriptor, StoringDescriptor};
use hive_types::{GameObject, ObjectId, ObjectKind, ResourceType, RoomName};
use hive_tasks::{Issue, Services, TaskManager, build_task, repair_task, request_task};

/// What one scan did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Objects newly registered with the resource directory.
    pub registered: usize,
    /// Jobs newly registered with the task market.
    pub issued: usize,
    /// Jobs deferred for lack of resources.
    pub deferred: usize,
}

impl ScanReport {
    fn count(&mut self, issue: &Issue) {
        match issue {
            Issue::Registered(_) => self.issued = self.issued.saturating_add(1),
            Issue::Deferred { .. } => self.deferred = self.deferred.saturating_add(1),
            Issue::Existing(_) | Issue::Merged(_) | Issue::Delegated | Issue::Skipped(_) => {}
        }
    }
}

/// Remembers which objects already have descriptors.
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    registered: BTreeSet<ObjectId>,
}

impl Scanner {
    /// A scanner that has seen nothing.
    pub const fn new() -> Self {
        Self {
            registered: BTreeSet::new(),
        }
    }

    /// Whether `object` has been registered.
    pub fn is_registered(&self, object: ObjectId) -> bool {
        self.registered.contains(&object)
    }

    /// Forget objects that no longer exist.
    pub fn forget(&mut self, object: ObjectId) {
        self.registered.remove(&object);
    }

    /// Scan every owned room.
    pub fn scan(&mut self, tasks: &mut TaskManager, services: &mut Services<'_>) -> ScanReport {
        let mut report = ScanReport::default();
        for room in services.world.owned_rooms() {
            self.scan_room(tasks, services, &room, &mut report);
        }
        report
    }

    fn scan_room(
        &mut self,
        tasks: &mut TaskManager,
        services: &mut Services<'_>,
        room: &RoomName,
        report: &mut ScanReport,
    ) {
        let threshold = services.settings.repair_threshold_pct;
        let mut fresh = Vec::new();
        let mut sites = Vec::new();
        let mut damaged = Vec::new();
        let mut hungry = Vec::new();

        for object in services.world.room_objects(room) {
            if !self.registered.contains(&object.id) && registrable(object) {
                fresh.push((object.id, object.kind, object.deposit().map(|(r, _)| r)));
            }
            match object.kind {
                ObjectKind::ConstructionSite => sites.push(object.id),
                kind if kind.is_structure() && object.is_damaged_below(threshold) => {
                    damaged.push(object.id);
                }
                _ => {}
            }
            if matches!(
                object.kind,
                ObjectKind::Spawn | ObjectKind::Extension | ObjectKind::Tower
            ) && object.free_capacity() > 0
            {
                hungry.push((object.id, object.free_capacity()));
            }
        }

        for (id, kind, deposit) in fresh {
            self.register(services, room, id, kind, deposit);
            report.registered = report.registered.saturating_add(1);
        }
        for site in sites {
            report.count(&build_task(tasks, services, site));
        }
        for target in damaged {
            report.count(&repair_task(tasks, services, target));
        }
        for (target, free) in hungry {
            report.count(&request_task(tasks, services, target, ResourceType::Energy, free));
        }
    }

    fn register(
        &mut self,
        services: &mut Services<'_>,
        room: &RoomName,
        id: ObjectId,
        kind: ObjectKind,
        deposit: Option<ResourceType>,
    ) {
        let resources = &mut *services.resources;
        match kind {
            ObjectKind::Source | ObjectKind::Mineral => {
                let resource = deposit.unwrap_or(ResourceType::Energy);
                resources.register(ResourceDescriptor::new(
                    room.clone(),
                    id,
                    Possession::Producing,
                    resource,
                ));
            }
            ObjectKind::Container | ObjectKind::Storage | ObjectKind::Terminal => {
                resources.register(ResourceDescriptor::new(
                    room.clone(),
                    id,
                    Possession::Storing,
                    ResourceType::Energy,
                ));
                resources.register(StoringDescriptor::new(room.clone(), id, ResourceType::Energy));
            }
            ObjectKind::Spawn | ObjectKind::Extension | ObjectKind::Tower => {
                resources.register(StoringDescriptor::new(room.clone(), id, ResourceType::Energy));
            }
            _ => {}
        }
        if matches!(
            kind,
            ObjectKind::Storage | ObjectKind::Terminal | ObjectKind::Link
        ) {
            resources.register_center(room.clone(), id);
        }
        self.registered.insert(id);
        debug!(room = %room, object = %id, kind = ?kind, "object registered");
    }
}

const fn registrable(object: &GameObject) -> bool {
    matches!(
        object.kind,
        ObjectKind::Source
            | ObjectKind::Mineral
            | ObjectKind::Container
            | ObjectKind::Storage
            | ObjectKind::Terminal
            | ObjectKind::Link
            | ObjectKind::Spawn
            | ObjectKind::Extension
            | ObjectKind::Tower
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use hive_ledger::{Ledger, LendingPolicy};
    use hive_resources::{ResourceManager, SumOptions};
    use hive_tasks::{TaskSettings, Timer};
    use hive_types::{Position, Store};
    use hive_world::{RoomState, World, WorldMap, WorldState, objects};

    struct Rig {
        world: WorldState,
        ledger: Ledger,
        resources: ResourceManager,
        timer: Timer,
        settings: TaskSettings,
    }

    impl Rig {
        fn new() -> Self {
            let mut map = WorldMap::new();
            assert!(map.add_room(RoomState::new("W1N1").owned()).is_ok());
            Self {
                world: WorldState::new(map),
                ledger: Ledger::new(LendingPolicy::Unlimited),
                resources: ResourceManager::new(),
                timer: Timer::new(),
                settings: TaskSettings::default(),
            }
        }

        fn services(&mut self) -> Services<'_> {
            Services {
                world: &mut self.world,
                ledger: &mut self.ledger,
                resources: &mut self.resources,
                timer: &mut self.timer,
                settings: &self.settings,
            }
        }

        fn add(&mut self, object: GameObject) -> ObjectId {
            self.world.add_object(object).unwrap_or_default()
        }
    }

    #[test]
    fn registers_once_and_issues_jobs() {
        let mut rig = Rig::new();
        let mut tasks = TaskManager::new();
        let mut container = objects::structure(ObjectKind::Container, Position::new("W1N1", 10, 10));
        container.store = Some(Store::new(2_000).with(ResourceType::Energy, 1_000));
        let container = rig.add(container);
        let spawn = rig.add(objects::structure(ObjectKind::Spawn, Position::new("W1N1", 20, 20)));
        let site = rig.add(objects::site(ObjectKind::Road, Position::new("W1N1", 15, 15)));
        let mut road = objects::structure(ObjectKind::Road, Position::new("W1N1", 16, 15));
        road.hits = 100;
        let road = rig.add(road);

        let mut scanner = Scanner::new();
        let first = scanner.scan(&mut tasks, &mut rig.services());
        assert_eq!(first.registered, 2);
        assert_eq!(first.issued, 3);
        assert!(scanner.is_registered(container));
        assert!(scanner.is_registered(spawn));
        assert_eq!(tasks.fetch(Some(site), "build").len(), 1);
        assert_eq!(tasks.fetch(Some(road), "repair").len(), 1);

        let second = scanner.scan(&mut tasks, &mut rig.services());
        assert_eq!(second, ScanReport::default());
        assert_eq!(tasks.len(), 3);
        assert_eq!(rig.resources.registrations(&"W1N1".into()), 3);
    }

    #[test]
    fn center_structures_join_the_group() {
        let mut rig = Rig::new();
        let mut tasks = TaskManager::new();
        let storage = rig.add(objects::structure(ObjectKind::Storage, Position::new("W1N1", 24, 27)));
        let terminal = rig.add(objects::structure(ObjectKind::Terminal, Position::new("W1N1", 26, 27)));

        Scanner::new().scan(&mut tasks, &mut rig.services());
        assert!(rig.resources.center().shared_room(storage, terminal).is_some());
    }

    #[test]
    fn jobs_without_supply_are_deferred() {
        let mut rig = Rig::new();
        let mut tasks = TaskManager::new();
        rig.add(objects::site(ObjectKind::Extension, Position::new("W1N1", 15, 15)));

        let report = Scanner::new().scan(&mut tasks, &mut rig.services());
        assert_eq!(report.deferred, 1);
        assert!(tasks.is_empty());
        let energy = rig.resources.sum(
            &rig.world,
            &"W1N1".into(),
            ResourceType::Energy,
            &SumOptions::default(),
        );
        assert_eq!(energy, 0);
        assert!(rig.world.is_visible(&"W1N1".into()));
    }
}
