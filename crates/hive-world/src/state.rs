//! In-memory world host.
//!
//! [`WorldState`] owns the room graph and every game object and implements
//! [`World`] with simplified host rules:
//!
//! - A move steps one tile toward the target inside a room, or jumps to
//!   the next room on the shortest route and lands on its center tile.
//! - Harvest yields 2 units per `Work` part, build adds 5 progress per
//!   `Work` part, repair restores 100 hits per energy at 1 energy per
//!   `Work` part. Each consumes 1 energy per progress point or repair unit.
//! - A room is visible when flagged visible or when a creep stands in it.
//! - Dropped resources vanish.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use hive_types::{
    ActionCode, BodyPart, GameObject, ObjectDetail, ObjectId, ObjectKind, Position, ResourceType,
    RoomName, Store,
};

use crate::error::WorldError;
use crate::host::{World, WorldEvent};
use crate::objects;
use crate::resource;
use crate::world_map::WorldMap;

/// Range for withdraw, transfer, harvest, claim, and reserve.
pub const ADJACENT_RANGE: u32 = 1;
/// Range for build and repair.
pub const WORK_RANGE: u32 = 3;
/// Units harvested per `Work` part per tick.
pub const HARVEST_PER_WORK: u32 = 2;
/// Build progress per `Work` part per tick.
pub const BUILD_PER_WORK: u32 = 5;
/// Hits restored per energy spent repairing.
pub const REPAIR_HITS_PER_ENERGY: u32 = 100;
/// Maximum reservation ticks on a controller.
pub const RESERVATION_MAX: u32 = 5_000;
/// Roads and containers lose hits every this many ticks.
pub const DECAY_INTERVAL: u64 = 100;
/// Hits lost per decay step.
pub const DECAY_HITS: u32 = 100;

/// Per-tick report of [`WorldState::advance`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvanceReport {
    /// Units regenerated across all deposits.
    pub regenerated: u32,
    /// Structures that decayed this tick.
    pub decayed: u32,
    /// Structures that decayed away entirely.
    pub collapsed: u32,
}

/// The in-memory game host.
#[derive(Debug, Clone, Default)]
pub struct WorldState {
    tick: u64,
    map: WorldMap,
    objects: BTreeMap<ObjectId, GameObject>,
    by_room: BTreeMap<RoomName, BTreeSet<ObjectId>>,
    events: Vec<WorldEvent>,
}

fn code(result: Result<(), ActionCode>) -> ActionCode {
    result.err().unwrap_or(ActionCode::Ok)
}

const fn step_axis(from: u8, to: u8) -> u8 {
    if from < to {
        from.saturating_add(1)
    } else if from > to {
        from.saturating_sub(1)
    } else {
        from
    }
}

impl WorldState {
    /// Create a world over a room graph with no objects.
    pub const fn new(map: WorldMap) -> Self {
        Self {
            tick: 0,
            map,
            objects: BTreeMap::new(),
            by_room: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    /// The room graph.
    pub const fn map(&self) -> &WorldMap {
        &self.map
    }

    /// The room graph, mutably.
    pub const fn map_mut(&mut self) -> &mut WorldMap {
        &mut self.map
    }

    // -------------------------------------------------------------------
    // Object management
    // -------------------------------------------------------------------

    /// Place an object.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::RoomNotFound`] for an unknown room and
    /// [`WorldError::DuplicateObject`] for a reused id.
    pub fn add_object(&mut self, object: GameObject) -> Result<ObjectId, WorldError> {
        let id = object.id;
        if self.map.room(object.room()).is_none() {
            return Err(WorldError::RoomNotFound(object.room().clone()));
        }
        if self.objects.contains_key(&id) {
            return Err(WorldError::DuplicateObject(id));
        }
        self.by_room
            .entry(object.room().clone())
            .or_default()
            .insert(id);
        self.objects.insert(id, object);
        Ok(id)
    }

    /// Remove an object and record a [`WorldEvent::ObjectRemoved`].
    pub fn remove_object(&mut self, id: ObjectId) -> Option<GameObject> {
        let object = self.objects.remove(&id)?;
        if let Some(set) = self.by_room.get_mut(object.room()) {
            set.remove(&id);
        }
        self.events.push(WorldEvent::ObjectRemoved {
            room: object.room().clone(),
            id,
        });
        debug!(object = %id, kind = ?object.kind, room = %object.room(), "object removed");
        Some(object)
    }

    /// Mutable access to an object.
    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut GameObject> {
        self.objects.get_mut(&id)
    }

    /// Number of objects.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Energy available for spawning in a room (spawns and extensions).
    pub fn room_energy(&self, room: &RoomName) -> u32 {
        self.spawn_energy_holders(room)
            .iter()
            .filter_map(|id| self.objects.get(id))
            .fold(0_u32, |acc, o| acc.saturating_add(o.stored(ResourceType::Energy)))
    }

    fn spawn_energy_holders(&self, room: &RoomName) -> Vec<ObjectId> {
        self.ids_in(room)
            .into_iter()
            .filter(|id| {
                self.objects
                    .get(id)
                    .is_some_and(|o| matches!(o.kind, ObjectKind::Spawn | ObjectKind::Extension))
            })
            .collect()
    }

    fn ids_in(&self, room: &RoomName) -> Vec<ObjectId> {
        self.by_room
            .get(room)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Spawn a creep at `spawn`, paying the body cost from the room's
    /// spawns and extensions.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::ObjectNotFound`], [`WorldError::NotASpawn`],
    /// [`WorldError::EmptyBody`], or [`WorldError::NotEnoughEnergy`].
    pub fn spawn_creep(
        &mut self,
        spawn: ObjectId,
        body: Vec<BodyPart>,
        tag: String,
    ) -> Result<ObjectId, WorldError> {
        let spawner = self
            .objects
            .get(&spawn)
            .ok_or(WorldError::ObjectNotFound(spawn))?;
        if spawner.kind != ObjectKind::Spawn {
            return Err(WorldError::NotASpawn(spawn));
        }
        if body.is_empty() {
            return Err(WorldError::EmptyBody);
        }
        let room = spawner.room().clone();
        let pos = spawner.pos.clone();

        let required = body
            .iter()
            .try_fold(0_u32, |acc, part| acc.checked_add(part.cost()))
            .ok_or(WorldError::ArithmeticOverflow)?;
        let available = self.room_energy(&room);
        if available < required {
            return Err(WorldError::NotEnoughEnergy {
                room,
                required,
                available,
            });
        }

        let mut owed = required;
        for holder in self.spawn_energy_holders(&room) {
            if owed == 0 {
                break;
            }
            if let Some(store) = self.objects.get_mut(&holder).and_then(|o| o.store.as_mut()) {
                let taken = store.remove(ResourceType::Energy, owed);
                owed = owed.saturating_sub(taken);
            }
        }

        let creep = objects::creep(pos, body, tag, self.tick);
        let id = self.add_object(creep)?;
        info!(tick = self.tick, room = %room, creep = %id, cost = required, "creep spawned");
        Ok(id)
    }

    // -------------------------------------------------------------------
    // Tick operations
    // -------------------------------------------------------------------

    /// Advance to `tick`: regenerate deposits, decay roads and containers,
    /// tick down reservations, and expire unreachable marks.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::ArithmeticOverflow`] on math failure.
    pub fn advance(&mut self, tick: u64) -> Result<AdvanceReport, WorldError> {
        self.tick = tick;
        let mut report = AdvanceReport::default();
        let decay_step = tick > 0 && tick.checked_rem(DECAY_INTERVAL) == Some(0);
        let mut collapsed = Vec::new();

        for object in self.objects.values_mut() {
            if let Some((resource, regen)) = object.deposit()
                && let Some(store) = object.store.as_mut()
            {
                let added = resource::regenerate(store, resource, regen)?;
                report.regenerated = report.regenerated.saturating_add(added);
            }

            if let ObjectDetail::Controller(info) = &mut object.detail {
                info.reservation = info.reservation.saturating_sub(1);
            }

            if decay_step && matches!(object.kind, ObjectKind::Road | ObjectKind::Container) {
                object.hits = object.hits.saturating_sub(DECAY_HITS);
                report.decayed = report.decayed.saturating_add(1);
                if object.hits == 0 {
                    collapsed.push(object.id);
                }
            }
        }

        for id in collapsed {
            if self.remove_object(id).is_some() {
                report.collapsed = report.collapsed.saturating_add(1);
            }
        }

        let expired: Vec<RoomName> = self
            .map
            .rooms()
            .filter(|r| r.unreachable_until.is_some_and(|until| until <= tick))
            .map(|r| r.name.clone())
            .collect();
        for name in expired {
            if let Some(room) = self.map.room_mut(&name) {
                room.unreachable_until = None;
            }
        }

        Ok(report)
    }

    // -------------------------------------------------------------------
    // Action helpers
    // -------------------------------------------------------------------

    fn actor(&self, creep: ObjectId) -> Result<&GameObject, ActionCode> {
        self.objects
            .get(&creep)
            .filter(|o| o.kind == ObjectKind::Creep)
            .ok_or(ActionCode::NotFound)
    }

    fn parts(&self, creep: ObjectId, part: BodyPart) -> Result<u32, ActionCode> {
        let n = self
            .actor(creep)?
            .creep()
            .map_or(0, |info| info.count(part));
        if n == 0 {
            return Err(ActionCode::NoBodyPart);
        }
        Ok(n)
    }

    fn target_in_range(
        &self,
        creep: ObjectId,
        target: ObjectId,
        range: u32,
    ) -> Result<&GameObject, ActionCode> {
        let actor_pos = &self.actor(creep)?.pos;
        let object = self
            .objects
            .get(&target)
            .filter(|o| self.is_visible(o.room()))
            .ok_or(ActionCode::NotFound)?;
        if !actor_pos.in_range_to(&object.pos, range) {
            return Err(ActionCode::NotInRange);
        }
        Ok(object)
    }

    fn store_mut(&mut self, id: ObjectId) -> Result<&mut Store, ActionCode> {
        self.objects
            .get_mut(&id)
            .and_then(|o| o.store.as_mut())
            .ok_or(ActionCode::InvalidTarget)
    }

    fn relocate(&mut self, id: ObjectId, next: Position) {
        let Some(object) = self.objects.get_mut(&id) else {
            return;
        };
        if object.pos.room != next.room {
            if let Some(set) = self.by_room.get_mut(&object.pos.room) {
                set.remove(&id);
            }
            self.by_room.entry(next.room.clone()).or_default().insert(id);
        }
        object.pos = next;
    }

    fn try_move(&mut self, creep: ObjectId, target: &Position, range: u32) -> Result<(), ActionCode> {
        let from = self.actor(creep)?.pos.clone();
        if from.in_range_to(target, range) {
            return Ok(());
        }
        self.parts(creep, BodyPart::Move)?;

        let next = if from.room == target.room {
            Position {
                room: from.room.clone(),
                x: step_axis(from.x, target.x),
                y: step_axis(from.y, target.y),
            }
        } else {
            let hop = self
                .map
                .next_hop(&from.room, &target.room)
                .ok_or(ActionCode::NoPath)?;
            Position::center_of(&hop)
        };
        self.relocate(creep, next);
        Ok(())
    }

    fn try_withdraw(
        &mut self,
        creep: ObjectId,
        target: ObjectId,
        resource: ResourceType,
        amount: Option<u32>,
    ) -> Result<(), ActionCode> {
        let object = self.target_in_range(creep, target, ADJACENT_RANGE)?;
        if object.kind.is_harvestable() || object.kind == ObjectKind::Creep {
            return Err(ActionCode::InvalidTarget);
        }
        let stock = object.store.as_ref().ok_or(ActionCode::InvalidTarget)?.get(resource);
        let free = self.actor(creep)?.free_capacity();
        if free == 0 {
            return Err(ActionCode::Full);
        }
        let wanted = amount.unwrap_or(stock);
        if stock == 0 || wanted > stock {
            return Err(ActionCode::NotEnoughResources);
        }
        let taken = self.store_mut(target)?.remove(resource, wanted.min(free));
        self.store_mut(creep)?.add(resource, taken);
        Ok(())
    }

    fn try_harvest(&mut self, creep: ObjectId, target: ObjectId) -> Result<(), ActionCode> {
        let object = self.target_in_range(creep, target, ADJACENT_RANGE)?;
        let (resource, _) = object.deposit().ok_or(ActionCode::InvalidTarget)?;
        let stock = object.stored(resource);
        let work = self.parts(creep, BodyPart::Work)?;
        let free = self.actor(creep)?.free_capacity();
        if stock == 0 {
            return Err(ActionCode::NotEnoughResources);
        }
        if free == 0 {
            return Err(ActionCode::Full);
        }
        let yield_ = work.saturating_mul(HARVEST_PER_WORK).min(free);
        let taken = resource::harvest(self.store_mut(target)?, resource, yield_);
        self.store_mut(creep)?.add(resource, taken);
        Ok(())
    }

    fn try_transfer(
        &mut self,
        creep: ObjectId,
        target: ObjectId,
        resource: ResourceType,
        amount: Option<u32>,
    ) -> Result<(), ActionCode> {
        let object = self.target_in_range(creep, target, ADJACENT_RANGE)?;
        let free = object.store.as_ref().ok_or(ActionCode::InvalidTarget)?.free();
        let carried = self.actor(creep)?.stored(resource);
        let wanted = amount.unwrap_or(carried);
        if carried == 0 || wanted > carried {
            return Err(ActionCode::NotEnoughResources);
        }
        if free == 0 {
            return Err(ActionCode::Full);
        }
        let given = self.store_mut(creep)?.remove(resource, wanted.min(free));
        self.store_mut(target)?.add(resource, given);
        Ok(())
    }

    fn try_drop(
        &mut self,
        creep: ObjectId,
        resource: ResourceType,
        amount: Option<u32>,
    ) -> Result<(), ActionCode> {
        let carried = self.actor(creep)?.stored(resource);
        if carried == 0 {
            return Err(ActionCode::NotEnoughResources);
        }
        self.store_mut(creep)?
            .remove(resource, amount.unwrap_or(carried));
        Ok(())
    }

    fn try_build(&mut self, creep: ObjectId, site: ObjectId) -> Result<(), ActionCode> {
        let object = self.target_in_range(creep, site, WORK_RANGE)?;
        let info = object.site().ok_or(ActionCode::InvalidTarget)?.clone();
        let pos = object.pos.clone();
        let work = self.parts(creep, BodyPart::Work)?;
        let energy = self.actor(creep)?.stored(ResourceType::Energy);
        if energy == 0 {
            return Err(ActionCode::NotEnoughResources);
        }

        let spent = work
            .saturating_mul(BUILD_PER_WORK)
            .min(energy)
            .min(info.remaining());
        self.store_mut(creep)?.remove(ResourceType::Energy, spent);
        let progress = info.progress.saturating_add(spent);

        if progress >= info.progress_total {
            self.objects.remove(&site);
            if let Some(set) = self.by_room.get_mut(&pos.room) {
                set.remove(&site);
            }
            let room = pos.room.clone();
            let structure = objects::structure(info.target_kind, pos);
            let Ok(structure_id) = self.add_object(structure) else {
                return Err(ActionCode::InvalidTarget);
            };
            self.events.push(WorldEvent::SiteCompleted {
                room: room.clone(),
                site,
                structure: structure_id,
            });
            info!(tick = self.tick, room = %room, kind = ?info.target_kind, "construction completed");
        } else if let Some(ObjectDetail::Site(live)) =
            self.objects.get_mut(&site).map(|o| &mut o.detail)
        {
            live.progress = progress;
        }
        Ok(())
    }

    fn try_repair(&mut self, creep: ObjectId, target: ObjectId) -> Result<(), ActionCode> {
        let object = self.target_in_range(creep, target, WORK_RANGE)?;
        if !object.kind.is_structure() {
            return Err(ActionCode::InvalidTarget);
        }
        let missing = object.hits_max.saturating_sub(object.hits);
        if missing == 0 {
            return Err(ActionCode::Full);
        }
        let work = self.parts(creep, BodyPart::Work)?;
        let energy = self.actor(creep)?.stored(ResourceType::Energy);
        if energy == 0 {
            return Err(ActionCode::NotEnoughResources);
        }

        let needed = missing.div_ceil(REPAIR_HITS_PER_ENERGY);
        let spent = work.min(energy).min(needed);
        self.store_mut(creep)?.remove(ResourceType::Energy, spent);
        if let Some(obj) = self.objects.get_mut(&target) {
            obj.hits = obj
                .hits
                .saturating_add(spent.saturating_mul(REPAIR_HITS_PER_ENERGY))
                .min(obj.hits_max);
        }
        Ok(())
    }

    fn try_controller(
        &mut self,
        creep: ObjectId,
        controller: ObjectId,
        claim: bool,
    ) -> Result<(), ActionCode> {
        let object = self.target_in_range(creep, controller, ADJACENT_RANGE)?;
        let info = object.controller().ok_or(ActionCode::InvalidTarget)?;
        if info.owned {
            return Err(ActionCode::InvalidTarget);
        }
        let room = object.room().clone();
        let parts = self.parts(creep, BodyPart::Claim)?;

        let Some(ObjectDetail::Controller(live)) =
            self.objects.get_mut(&controller).map(|o| &mut o.detail)
        else {
            return Err(ActionCode::InvalidTarget);
        };
        if claim {
            live.owned = true;
            live.level = 1;
            live.reservation = 0;
            if let Some(state) = self.map.room_mut(&room) {
                state.owned = true;
                state.visible = true;
            }
            info!(tick = self.tick, room = %room, "room claimed");
        } else {
            live.reservation = live.reservation.saturating_add(parts).min(RESERVATION_MAX);
        }
        Ok(())
    }
}

impl World for WorldState {
    fn tick(&self) -> u64 {
        self.tick
    }

    fn object(&self, id: ObjectId) -> Option<&GameObject> {
        self.objects.get(&id).filter(|o| self.is_visible(o.room()))
    }

    fn room_objects(&self, room: &RoomName) -> Vec<&GameObject> {
        if !self.is_visible(room) {
            return Vec::new();
        }
        self.by_room
            .get(room)
            .map(|set| set.iter().filter_map(|id| self.objects.get(id)).collect())
            .unwrap_or_default()
    }

    fn creeps(&self) -> Vec<&GameObject> {
        let mut creeps: Vec<&GameObject> = self
            .objects
            .values()
            .filter(|o| o.kind == ObjectKind::Creep)
            .collect();
        creeps.sort_by_key(|o| (o.creep().map_or(0, |c| c.spawned_at), o.id));
        creeps
    }

    fn owned_rooms(&self) -> Vec<RoomName> {
        self.map
            .rooms()
            .filter(|r| r.owned)
            .map(|r| r.name.clone())
            .collect()
    }

    fn is_visible(&self, room: &RoomName) -> bool {
        if self.map.room(room).is_some_and(|r| r.visible) {
            return true;
        }
        self.by_room.get(room).is_some_and(|set| {
            set.iter()
                .filter_map(|id| self.objects.get(id))
                .any(|o| o.kind == ObjectKind::Creep)
        })
    }

    fn rooms_by_distance(&self, from: &RoomName) -> Vec<(RoomName, u32)> {
        self.map.rooms_by_distance(from)
    }

    fn room_distance(&self, a: &RoomName, b: &RoomName) -> Option<u32> {
        self.map.distance(a, b)
    }

    fn rejects_outside_help(&self, room: &RoomName) -> bool {
        self.map.room(room).is_some_and(|r| r.rejects_outside_help)
    }

    fn mark_unreachable(&mut self, room: &RoomName, until: u64) {
        if let Some(state) = self.map.room_mut(room) {
            state.unreachable_until = Some(until);
            debug!(tick = self.tick, room = %room, until, "room marked unreachable");
        }
    }

    fn is_unreachable(&self, room: &RoomName) -> bool {
        self.map
            .room(room)
            .and_then(|r| r.unreachable_until)
            .is_some_and(|until| until > self.tick)
    }

    fn move_to(&mut self, creep: ObjectId, target: &Position, range: u32) -> ActionCode {
        code(self.try_move(creep, target, range))
    }

    fn withdraw(
        &mut self,
        creep: ObjectId,
        target: ObjectId,
        resource: ResourceType,
        amount: Option<u32>,
    ) -> ActionCode {
        code(self.try_withdraw(creep, target, resource, amount))
    }

    fn harvest(&mut self, creep: ObjectId, target: ObjectId) -> ActionCode {
        code(self.try_harvest(creep, target))
    }

    fn transfer(
        &mut self,
        creep: ObjectId,
        target: ObjectId,
        resource: ResourceType,
        amount: Option<u32>,
    ) -> ActionCode {
        code(self.try_transfer(creep, target, resource, amount))
    }

    fn drop_resource(
        &mut self,
        creep: ObjectId,
        resource: ResourceType,
        amount: Option<u32>,
    ) -> ActionCode {
        code(self.try_drop(creep, resource, amount))
    }

    fn build(&mut self, creep: ObjectId, site: ObjectId) -> ActionCode {
        code(self.try_build(creep, site))
    }

    fn repair(&mut self, creep: ObjectId, target: ObjectId) -> ActionCode {
        code(self.try_repair(creep, target))
    }

    fn claim_controller(&mut self, creep: ObjectId, controller: ObjectId) -> ActionCode {
        code(self.try_controller(creep, controller, true))
    }

    fn reserve_controller(&mut self, creep: ObjectId, controller: ObjectId) -> ActionCode {
        code(self.try_controller(creep, controller, false))
    }

    fn transfer_direct(
        &mut self,
        from: ObjectId,
        to: ObjectId,
        resource: ResourceType,
        amount: u32,
    ) -> u32 {
        let free = self
            .objects
            .get(&to)
            .and_then(|o| o.store.as_ref())
            .map_or(0, Store::free);
        let Ok(source) = self.store_mut(from) else {
            return 0;
        };
        let taken = source.remove(resource, amount.min(free));
        match self.store_mut(to) {
            Ok(sink) => sink.add(resource, taken),
            Err(_) => 0,
        }
    }

    fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world_map::RoomState;
    use hive_types::ControllerInfo;

    fn world() -> WorldState {
        let mut map = WorldMap::new();
        assert!(map.add_room(RoomState::new("W1N1").owned()).is_ok());
        assert!(map.add_room(RoomState::new("W2N1").hidden()).is_ok());
        assert!(map.connect(&"W1N1".into(), &"W2N1".into()).is_ok());
        WorldState::new(map)
    }

    fn place(world: &mut WorldState, object: GameObject) -> ObjectId {
        let id = world.add_object(object);
        assert!(id.is_ok());
        id.unwrap_or_default()
    }

    fn worker(world: &mut WorldState, x: u8, y: u8) -> ObjectId {
        place(
            world,
            objects::creep(
                Position::new("W1N1", x, y),
                vec![BodyPart::Work, BodyPart::Carry, BodyPart::Move],
                String::new(),
                0,
            ),
        )
    }

    #[test]
    fn move_steps_one_tile() {
        let mut world = world();
        let creep = worker(&mut world, 10, 10);
        let target = Position::new("W1N1", 20, 12);
        assert_eq!(world.move_to(creep, &target, 1), ActionCode::Ok);
        assert_eq!(
            world.object(creep).map(|o| o.pos.clone()),
            Some(Position::new("W1N1", 11, 11))
        );
    }

    #[test]
    fn move_across_rooms_reveals_room() {
        let mut world = world();
        let creep = worker(&mut world, 10, 10);
        let room: RoomName = "W2N1".into();
        assert!(!world.is_visible(&room));
        assert_eq!(
            world.move_to(creep, &Position::center_of(&room), 1),
            ActionCode::Ok
        );
        assert!(world.is_visible(&room));
        assert_eq!(world.object(creep).map(|o| o.room().clone()), Some(room));
    }

    #[test]
    fn move_to_disconnected_room_has_no_path() {
        let mut world = world();
        assert!(world.map_mut().add_room(RoomState::new("E9S9")).is_ok());
        let creep = worker(&mut world, 10, 10);
        assert_eq!(
            world.move_to(creep, &Position::new("E9S9", 5, 5), 1),
            ActionCode::NoPath
        );
    }

    #[test]
    fn withdraw_then_transfer() {
        let mut world = world();
        let creep = worker(&mut world, 10, 10);
        let mut container = objects::structure(ObjectKind::Container, Position::new("W1N1", 11, 10));
        container.store = Some(Store::new(2_000).with(ResourceType::Energy, 100));
        let container = place(&mut world, container);
        let spawn = place(
            &mut world,
            objects::structure(ObjectKind::Spawn, Position::new("W1N1", 9, 9)),
        );

        assert_eq!(
            world.withdraw(creep, container, ResourceType::Energy, None),
            ActionCode::Ok
        );
        assert_eq!(world.object(creep).map(|o| o.stored(ResourceType::Energy)), Some(50));
        assert_eq!(
            world.withdraw(creep, container, ResourceType::Energy, None),
            ActionCode::Full
        );
        assert_eq!(
            world.transfer(creep, spawn, ResourceType::Energy, None),
            ActionCode::Ok
        );
        assert_eq!(world.room_energy(&"W1N1".into()), 50);
    }

    #[test]
    fn withdraw_out_of_range() {
        let mut world = world();
        let creep = worker(&mut world, 10, 10);
        let container = place(
            &mut world,
            objects::structure(ObjectKind::Container, Position::new("W1N1", 30, 30)),
        );
        assert_eq!(
            world.withdraw(creep, container, ResourceType::Energy, None),
            ActionCode::NotInRange
        );
    }

    #[test]
    fn build_completes_site_and_emits_event() {
        let mut world = world();
        let creep = worker(&mut world, 10, 10);
        let site = place(&mut world, objects::site(ObjectKind::Road, Position::new("W1N1", 12, 10)));
        if let Some(store) = world.object_mut(creep).and_then(|o| o.store.as_mut()) {
            store.add(ResourceType::Energy, 50);
        }
        if let Some(ObjectDetail::Site(info)) = world.object_mut(site).map(|o| &mut o.detail) {
            info.progress_total = 50;
        }

        let mut ticks = 0;
        while world.object(site).is_some() && ticks < 100 {
            assert_eq!(world.build(creep, site), ActionCode::Ok);
            ticks += 1;
        }
        assert_eq!(ticks, 10);
        let events = world.drain_events();
        assert!(matches!(events.first(), Some(WorldEvent::SiteCompleted { .. })));
        assert!(world.drain_events().is_empty());
    }

    #[test]
    fn repair_restores_hits_and_reports_full() {
        let mut world = world();
        let creep = worker(&mut world, 10, 10);
        let mut road = objects::structure(ObjectKind::Road, Position::new("W1N1", 11, 11));
        road.hits = 4_850;
        let road = place(&mut world, road);
        if let Some(store) = world.object_mut(creep).and_then(|o| o.store.as_mut()) {
            store.add(ResourceType::Energy, 10);
        }
        assert_eq!(world.repair(creep, road), ActionCode::Ok);
        assert_eq!(world.repair(creep, road), ActionCode::Ok);
        assert_eq!(world.object(road).map(|o| o.hits), Some(5_000));
        assert_eq!(world.repair(creep, road), ActionCode::Full);
        assert_eq!(world.object(creep).map(|o| o.stored(ResourceType::Energy)), Some(8));
    }

    #[test]
    fn claim_requires_claim_part() {
        let mut world = world();
        let creep = worker(&mut world, 10, 10);
        let controller = place(
            &mut world,
            objects::controller(Position::new("W1N1", 10, 11), ControllerInfo::default()),
        );
        assert_eq!(world.claim_controller(creep, controller), ActionCode::NoBodyPart);
    }

    #[test]
    fn spawn_pays_from_room_energy() {
        let mut world = world();
        let mut spawn = objects::structure(ObjectKind::Spawn, Position::new("W1N1", 25, 25));
        spawn.store = Some(Store::new(300).with(ResourceType::Energy, 300));
        let spawn = place(&mut world, spawn);

        let body = vec![BodyPart::Work, BodyPart::Carry, BodyPart::Move];
        let creep = world.spawn_creep(spawn, body.clone(), "hauler".to_owned());
        assert!(creep.is_ok());
        assert_eq!(world.room_energy(&"W1N1".into()), 100);
        assert!(matches!(
            world.spawn_creep(spawn, body, String::new()),
            Err(WorldError::NotEnoughEnergy { .. })
        ));
    }

    #[test]
    fn advance_regenerates_and_expires_marks() {
        let mut world = world();
        let source = place(
            &mut world,
            objects::deposit(
                ObjectKind::Source,
                ResourceType::Energy,
                Position::new("W1N1", 5, 5),
                3_000,
                10,
            ),
        );
        if let Some(store) = world.object_mut(source).and_then(|o| o.store.as_mut()) {
            store.remove(ResourceType::Energy, 100);
        }
        world.mark_unreachable(&"W2N1".into(), 3);
        assert!(world.is_unreachable(&"W2N1".into()));

        let report = world.advance(3);
        assert_eq!(report.ok().map(|r| r.regenerated), Some(10));
        assert!(!world.is_unreachable(&"W2N1".into()));
    }

    #[test]
    fn creeps_are_listed_in_spawn_order() {
        let mut world = world();
        let late = place(
            &mut world,
            objects::creep(Position::new("W1N1", 1, 1), vec![BodyPart::Move], String::new(), 9),
        );
        let early = place(
            &mut world,
            objects::creep(Position::new("W1N1", 2, 2), vec![BodyPart::Move], String::new(), 2),
        );
        let ids: Vec<ObjectId> = world.creeps().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![early, late]);
    }
}
