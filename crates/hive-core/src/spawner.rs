//! Spawner: realizes the task market's spawn requests in the world.
//!
//! A room spawns at most one creep per tick, sized to the energy it has on
//! hand. A request is skipped while an idle creep that could take it is
//! already alive, and nothing spawns once the colony is at its creep cap.

use std::collections::BTreeSet;

use tracing::{debug, info};

use hive_tasks::{SpawnRequest, TaskManager};
use hive_types::{ObjectId, ObjectKind, RoomName};
use hive_world::{World, WorldState};

/// A creep the spawner created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spawned {
    /// The new creep.
    pub creep: ObjectId,
    /// Room it spawned in.
    pub room: RoomName,
    /// Role it was spawned for.
    pub role: String,
    /// Memory tag it carries.
    pub tag: String,
}

/// Turns spawn requests into creeps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spawner {
    max_creeps: usize,
}

impl Spawner {
    /// A spawner keeping at most `max_creeps` creeps alive.
    pub const fn new(max_creeps: usize) -> Self {
        Self { max_creeps }
    }

    /// Serve this tick's requests.
    pub fn run(&self, tasks: &TaskManager, world: &mut WorldState) -> Vec<Spawned> {
        let mut spawned = Vec::new();
        let mut population = world.creeps().len();
        let mut busy: BTreeSet<RoomName> = BTreeSet::new();
        let idle_tags: BTreeSet<String> = world
            .creeps()
            .iter()
            .filter(|c| tasks.worker_task(c.id).is_none())
            .filter_map(|c| c.creep().map(|info| info.tag.clone()))
            .collect();

        for request in tasks.spawn_requests() {
            if population >= self.max_creeps {
                debug!(population, cap = self.max_creeps, "creep cap reached");
                break;
            }
            if busy.contains(&request.room) || idle_tags.contains(&request.tag) {
                continue;
            }
            let Some(creep) = Self::spawn(world, &request) else {
                continue;
            };
            busy.insert(request.room.clone());
            population = population.saturating_add(1);
            spawned.push(Spawned {
                creep,
                room: request.room,
                role: request.role,
                tag: request.tag,
            });
        }
        spawned
    }

    fn spawn(world: &mut WorldState, request: &SpawnRequest) -> Option<ObjectId> {
        let spawn = world
            .room_objects(&request.room)
            .into_iter()
            .find(|o| o.kind == ObjectKind::Spawn)
            .map(|o| o.id)?;
        let energy = world.room_energy(&request.room);
        let Some(body) = request.body.realize(energy) else {
            debug!(
                room = %request.room,
                role = %request.role,
                energy,
                "not enough energy to spawn"
            );
            return None;
        };
        match world.spawn_creep(spawn, body, request.tag.clone()) {
            Ok(creep) => {
                info!(
                    room = %request.room,
                    task = %request.task,
                    role = %request.role,
                    tag = %request.tag,
                    creep = %creep,
                    "worker spawned"
                );
                Some(creep)
            }
            Err(err) => {
                debug!(room = %request.room, error = %err, "spawn failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hive_ledger::{Ledger, LendingPolicy};
    use hive_resources::{ResourceManager, ResourceDescriptor, Possession};
    use hive_tasks::{Services, TaskSettings, Timer, build_task};
    use hive_types::{BodyPart, Position, ResourceType, Store};
    use hive_world::{RoomState, WorldMap, objects};

    fn world(energy: u32) -> (WorldState, ObjectId) {
        let mut map = WorldMap::new();
        assert!(map.add_room(RoomState::new("W1N1").owned()).is_ok());
        let mut world = WorldState::new(map);
        let mut spawn = objects::structure(ObjectKind::Spawn, Position::new("W1N1", 25, 25));
        spawn.store = Some(Store::new(300).with(ResourceType::Energy, energy));
        let mut container = objects::structure(ObjectKind::Container, Position::new("W1N1", 10, 10));
        container.store = Some(Store::new(2_000).with(ResourceType::Energy, 1_000));
        let container = world.add_object(container).unwrap_or_default();
        assert!(world.add_object(spawn).is_ok());
        (world, container)
    }

    fn market(world: &mut WorldState, container: ObjectId) -> TaskManager {
        let mut ledger = Ledger::new(LendingPolicy::Unlimited);
        let mut resources = ResourceManager::new();
        resources.register(ResourceDescriptor::new(
            "W1N1",
            container,
            Possession::Storing,
            ResourceType::Energy,
        ));
        let mut timer = Timer::new();
        let settings = TaskSettings::default();
        let site = world
            .add_object(objects::site(ObjectKind::Road, Position::new("W1N1", 30, 30)))
            .unwrap_or_default();
        let mut tasks = TaskManager::new();
        let mut services = Services {
            world,
            ledger: &mut ledger,
            resources: &mut resources,
            timer: &mut timer,
            settings: &settings,
        };
        assert!(build_task(&mut tasks, &mut services, site).task().is_some());
        tasks
    }

    #[test]
    fn spawns_one_creep_sized_to_energy() {
        let (mut world, container) = world(300);
        let tasks = market(&mut world, container);

        let spawned = Spawner::new(10).run(&tasks, &mut world);
        assert_eq!(spawned.len(), 1);
        let creep = spawned.first().map(|s| s.creep).unwrap_or_default();
        let body = world
            .object(creep)
            .and_then(|o| o.creep())
            .map(|c| c.body.clone())
            .unwrap_or_default();
        assert_eq!(body, vec![BodyPart::Work, BodyPart::Carry, BodyPart::Move]);
        assert_eq!(world.room_energy(&"W1N1".into()), 100);
    }

    #[test]
    fn idle_creeps_and_caps_block_spawning() {
        let (mut world, container) = world(300);
        let tasks = market(&mut world, container);

        assert!(Spawner::new(0).run(&tasks, &mut world).is_empty());

        let idle = objects::creep(
            Position::new("W1N1", 5, 5),
            vec![BodyPart::Work, BodyPart::Carry, BodyPart::Move],
            String::new(),
            0,
        );
        assert!(world.add_object(idle).is_ok());
        assert!(Spawner::new(10).run(&tasks, &mut world).is_empty());
    }

    #[test]
    fn poor_rooms_wait() {
        let (mut world, container) = world(100);
        let tasks = market(&mut world, container);
        assert!(Spawner::new(10).run(&tasks, &mut world).is_empty());
    }
}
