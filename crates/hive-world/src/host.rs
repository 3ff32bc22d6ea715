//! The capability interface the colony core consumes from the game host.
//!
//! The core never touches game objects directly: it reads snapshots through
//! [`World`] and issues actions that return an [`ActionCode`], exactly as a
//! creep would against the real host. [`WorldState`](crate::WorldState) is
//! the in-memory implementation used by the engine and by tests.

use serde::{Deserialize, Serialize};

use hive_types::{ActionCode, GameObject, ObjectId, Position, ResourceType, RoomName};

/// Ticks charged for crossing one room when estimating path lengths.
pub const ROOM_TRAVEL_TICKS: u32 = 50;

/// Something that happened in the world the core should react to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorldEvent {
    /// An object disappeared (destroyed, died, consumed).
    ObjectRemoved {
        /// Room the object was in.
        room: RoomName,
        /// The removed object.
        id: ObjectId,
    },
    /// A construction site finished and became a structure.
    SiteCompleted {
        /// Room of the site.
        room: RoomName,
        /// The site that vanished.
        site: ObjectId,
        /// The new structure.
        structure: ObjectId,
    },
}

impl WorldEvent {
    /// Room the event happened in.
    pub const fn room(&self) -> &RoomName {
        match self {
            Self::ObjectRemoved { room, .. } | Self::SiteCompleted { room, .. } => room,
        }
    }
}

/// Read access and game actions offered by the host.
pub trait World {
    // -------------------------------------------------------------------
    // Lookups
    // -------------------------------------------------------------------

    /// Current game tick.
    fn tick(&self) -> u64;

    /// A game object by id.
    fn object(&self, id: ObjectId) -> Option<&GameObject>;

    /// All objects in a room, in id order. Empty when the room is not visible.
    fn room_objects(&self, room: &RoomName) -> Vec<&GameObject>;

    /// All creeps, oldest spawn first (ties by id).
    fn creeps(&self) -> Vec<&GameObject>;

    /// Rooms whose controller the colony owns.
    fn owned_rooms(&self) -> Vec<RoomName>;

    // -------------------------------------------------------------------
    // Spatial
    // -------------------------------------------------------------------

    /// Whether the colony sees into the room this tick.
    fn is_visible(&self, room: &RoomName) -> bool;

    /// Reachable rooms with their distance in rooms, nearest first.
    fn rooms_by_distance(&self, from: &RoomName) -> Vec<(RoomName, u32)>;

    /// Distance in rooms, `None` if disconnected.
    fn room_distance(&self, a: &RoomName, b: &RoomName) -> Option<u32>;

    /// Estimated travel ticks between two positions, `None` without a path.
    fn path_length(&self, from: &Position, to: &Position) -> Option<u32> {
        if let Some(range) = from.range_to(to) {
            return Some(range);
        }
        let rooms = self.room_distance(&from.room, &to.room)?;
        let inside = Position::center_of(&to.room).range_to(to).unwrap_or(0);
        Some(rooms.saturating_mul(ROOM_TRAVEL_TICKS).saturating_add(inside))
    }

    /// Whether the room refuses workers from other rooms.
    fn rejects_outside_help(&self, room: &RoomName) -> bool;

    /// Mark a room unreachable until `until`.
    fn mark_unreachable(&mut self, room: &RoomName, until: u64);

    /// Whether a room is currently marked unreachable.
    fn is_unreachable(&self, room: &RoomName) -> bool;

    // -------------------------------------------------------------------
    // Creep actions
    // -------------------------------------------------------------------

    /// Step toward `target` until within `range`. `Ok` once in range.
    fn move_to(&mut self, creep: ObjectId, target: &Position, range: u32) -> ActionCode;

    /// Take a resource from a store. `None` takes as much as fits.
    fn withdraw(
        &mut self,
        creep: ObjectId,
        target: ObjectId,
        resource: ResourceType,
        amount: Option<u32>,
    ) -> ActionCode;

    /// Harvest from a source or mineral.
    fn harvest(&mut self, creep: ObjectId, target: ObjectId) -> ActionCode;

    /// Put a carried resource into a store. `None` moves as much as fits.
    fn transfer(
        &mut self,
        creep: ObjectId,
        target: ObjectId,
        resource: ResourceType,
        amount: Option<u32>,
    ) -> ActionCode;

    /// Drop a carried resource on the ground. `None` drops all of it.
    fn drop_resource(
        &mut self,
        creep: ObjectId,
        resource: ResourceType,
        amount: Option<u32>,
    ) -> ActionCode;

    /// Spend carried energy on a construction site.
    fn build(&mut self, creep: ObjectId, site: ObjectId) -> ActionCode;

    /// Spend carried energy restoring a structure's hits.
    fn repair(&mut self, creep: ObjectId, target: ObjectId) -> ActionCode;

    /// Take ownership of a neutral controller.
    fn claim_controller(&mut self, creep: ObjectId, controller: ObjectId) -> ActionCode;

    /// Extend the colony's reservation on a neutral controller.
    fn reserve_controller(&mut self, creep: ObjectId, controller: ObjectId) -> ActionCode;

    // -------------------------------------------------------------------
    // Structure actions
    // -------------------------------------------------------------------

    /// Move a resource directly between two stores (links, storage,
    /// terminal). Returns units moved.
    fn transfer_direct(
        &mut self,
        from: ObjectId,
        to: ObjectId,
        resource: ResourceType,
        amount: u32,
    ) -> u32;

    /// Take the events recorded since the last call.
    fn drain_events(&mut self) -> Vec<WorldEvent>;
}
