//! Core entity structs: positions, stores, and game objects.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::enums::{BodyPart, ObjectKind, ResourceType};
use crate::ids::{ObjectId, RoomName};

/// Carry capacity contributed by one `Carry` body part.
pub const CARRY_CAPACITY_PER_PART: u32 = 50;

/// A tile position inside a room.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// The room containing the tile.
    pub room: RoomName,
    /// Column, 0..50.
    pub x: u8,
    /// Row, 0..50.
    pub y: u8,
}

impl Position {
    /// Create a position.
    pub fn new(room: impl Into<RoomName>, x: u8, y: u8) -> Self {
        Self {
            room: room.into(),
            x,
            y,
        }
    }

    /// The center tile of a room, used as a travel target when nothing
    /// inside the room is known.
    pub fn center_of(room: &RoomName) -> Self {
        Self {
            room: room.clone(),
            x: 25,
            y: 25,
        }
    }

    /// Chebyshev range to another tile in the same room, `None` across rooms.
    pub fn range_to(&self, other: &Self) -> Option<u32> {
        if self.room != other.room {
            return None;
        }
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        Some(u32::from(dx.max(dy)))
    }

    /// Whether `other` is within `range` tiles in the same room.
    pub fn in_range_to(&self, other: &Self, range: u32) -> bool {
        self.range_to(other).is_some_and(|r| r <= range)
    }
}

/// A resource store with a single shared capacity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    amounts: BTreeMap<ResourceType, u32>,
    capacity: u32,
}

impl Store {
    /// Create an empty store with the given total capacity.
    pub const fn new(capacity: u32) -> Self {
        Self {
            amounts: BTreeMap::new(),
            capacity,
        }
    }

    /// Builder-style helper that pre-fills a resource, clamped to capacity.
    #[must_use]
    pub fn with(mut self, resource: ResourceType, amount: u32) -> Self {
        self.add(resource, amount);
        self
    }

    /// Total capacity.
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Amount held of a resource.
    pub fn get(&self, resource: ResourceType) -> u32 {
        self.amounts.get(&resource).copied().unwrap_or(0)
    }

    /// Sum of all held resources.
    pub fn used(&self) -> u32 {
        self.amounts
            .values()
            .fold(0_u32, |acc, qty| acc.saturating_add(*qty))
    }

    /// Remaining free capacity.
    pub fn free(&self) -> u32 {
        self.capacity.saturating_sub(self.used())
    }

    /// Whether nothing is held.
    pub fn is_empty(&self) -> bool {
        self.used() == 0
    }

    /// Add up to `amount` units, returning how many were accepted.
    pub fn add(&mut self, resource: ResourceType, amount: u32) -> u32 {
        let accepted = amount.min(self.free());
        if accepted > 0 {
            let entry = self.amounts.entry(resource).or_insert(0);
            *entry = entry.saturating_add(accepted);
        }
        accepted
    }

    /// Remove up to `amount` units, returning how many were removed.
    pub fn remove(&mut self, resource: ResourceType, amount: u32) -> u32 {
        let held = self.get(resource);
        let removed = amount.min(held);
        let left = held.saturating_sub(removed);
        if left == 0 {
            self.amounts.remove(&resource);
        } else {
            self.amounts.insert(resource, left);
        }
        removed
    }

    /// Iterate over held resources with non-zero amounts.
    pub fn carried(&self) -> impl Iterator<Item = (ResourceType, u32)> + '_ {
        self.amounts
            .iter()
            .filter(|(_, qty)| **qty > 0)
            .map(|(r, qty)| (*r, *qty))
    }
}

/// Creep-specific state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreepInfo {
    /// Body parts, in spawn order.
    pub body: Vec<BodyPart>,
    /// Memory tag used to match the creep against job roles. Empty means
    /// the creep accepts any role that accepts untagged workers.
    pub tag: String,
    /// Tick on which the creep finished spawning.
    pub spawned_at: u64,
    /// Room the creep was spawned in.
    pub home: RoomName,
}

impl CreepInfo {
    /// Number of parts of the given type.
    pub fn count(&self, part: BodyPart) -> u32 {
        let n = self.body.iter().filter(|p| **p == part).count();
        u32::try_from(n).unwrap_or(u32::MAX)
    }

    /// Total carry capacity contributed by `Carry` parts.
    pub fn carry_capacity(&self) -> u32 {
        self.count(BodyPart::Carry)
            .saturating_mul(CARRY_CAPACITY_PER_PART)
    }
}

/// Controller-specific state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerInfo {
    /// Whether the colony owns this controller.
    pub owned: bool,
    /// Controller level, 0 when unowned.
    pub level: u8,
    /// Remaining reservation ticks held by the colony.
    pub reservation: u32,
}

/// Construction-site-specific state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteInfo {
    /// Kind of structure that appears once the site completes.
    pub target_kind: ObjectKind,
    /// Build progress so far.
    pub progress: u32,
    /// Progress required to complete.
    pub progress_total: u32,
}

impl SiteInfo {
    /// Progress still required.
    pub const fn remaining(&self) -> u32 {
        self.progress_total.saturating_sub(self.progress)
    }
}

/// Kind-specific detail attached to a [`GameObject`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectDetail {
    /// Plain structure with no extra state.
    Structure,
    /// A creep.
    Creep(CreepInfo),
    /// A room controller.
    Controller(ControllerInfo),
    /// A construction site.
    Site(SiteInfo),
    /// A harvestable node that refills over time.
    Deposit {
        /// Resource yielded.
        resource: ResourceType,
        /// Units regenerated per tick.
        regen_per_tick: u32,
    },
}

/// A game object as seen by the colony.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameObject {
    /// Unique identifier.
    pub id: ObjectId,
    /// Concrete kind.
    pub kind: ObjectKind,
    /// Where the object stands.
    pub pos: Position,
    /// Current hit points (0 for objects without hits).
    pub hits: u32,
    /// Maximum hit points.
    pub hits_max: u32,
    /// Resource store, if the object has one.
    pub store: Option<Store>,
    /// Kind-specific state.
    pub detail: ObjectDetail,
}

impl GameObject {
    /// Room containing the object.
    pub const fn room(&self) -> &RoomName {
        &self.pos.room
    }

    /// Creep state, if this is a creep.
    pub const fn creep(&self) -> Option<&CreepInfo> {
        match &self.detail {
            ObjectDetail::Creep(info) => Some(info),
            _ => None,
        }
    }

    /// Controller state, if this is a controller.
    pub const fn controller(&self) -> Option<&ControllerInfo> {
        match &self.detail {
            ObjectDetail::Controller(info) => Some(info),
            _ => None,
        }
    }

    /// Construction-site state, if this is a site.
    pub const fn site(&self) -> Option<&SiteInfo> {
        match &self.detail {
            ObjectDetail::Site(info) => Some(info),
            _ => None,
        }
    }

    /// Resource yielded and regeneration rate, if this is a deposit.
    pub const fn deposit(&self) -> Option<(ResourceType, u32)> {
        match &self.detail {
            ObjectDetail::Deposit {
                resource,
                regen_per_tick,
            } => Some((*resource, *regen_per_tick)),
            _ => None,
        }
    }

    /// Amount of a resource held, 0 without a store.
    pub fn stored(&self, resource: ResourceType) -> u32 {
        self.store.as_ref().map_or(0, |s| s.get(resource))
    }

    /// Free capacity, 0 without a store.
    pub fn free_capacity(&self) -> u32 {
        self.store.as_ref().map_or(0, Store::free)
    }

    /// Whether hit points are below `pct` percent of the maximum.
    pub fn is_damaged_below(&self, pct: u32) -> bool {
        if self.hits_max == 0 {
            return false;
        }
        let threshold = self.hits_max.saturating_mul(pct) / 100;
        self.hits < threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_add_clamps_to_capacity() {
        let mut store = Store::new(100);
        assert_eq!(store.add(ResourceType::Energy, 70), 70);
        assert_eq!(store.add(ResourceType::Hydrogen, 50), 30);
        assert_eq!(store.free(), 0);
        assert_eq!(store.used(), 100);
    }

    #[test]
    fn store_remove_drops_empty_entries() {
        let mut store = Store::new(100).with(ResourceType::Energy, 40);
        assert_eq!(store.remove(ResourceType::Energy, 60), 40);
        assert!(store.is_empty());
        assert_eq!(store.carried().count(), 0);
    }

    #[test]
    fn range_is_none_across_rooms() {
        let a = Position::new("W1N1", 10, 10);
        let b = Position::new("W1N1", 13, 12);
        let c = Position::new("W2N1", 10, 10);
        assert_eq!(a.range_to(&b), Some(3));
        assert!(a.in_range_to(&b, 3));
        assert!(!a.in_range_to(&b, 2));
        assert_eq!(a.range_to(&c), None);
    }

    #[test]
    fn creep_carry_capacity_counts_parts() {
        let info = CreepInfo {
            body: vec![BodyPart::Work, BodyPart::Carry, BodyPart::Carry, BodyPart::Move],
            tag: String::new(),
            spawned_at: 0,
            home: RoomName::from("W1N1"),
        };
        assert_eq!(info.carry_capacity(), 100);
        assert_eq!(info.count(BodyPart::Work), 1);
    }

    #[test]
    fn damage_threshold_uses_percent() {
        let obj = GameObject {
            id: ObjectId::new(),
            kind: ObjectKind::Road,
            pos: Position::new("W1N1", 1, 1),
            hits: 3_000,
            hits_max: 5_000,
            store: None,
            detail: ObjectDetail::Structure,
        };
        assert!(obj.is_damaged_below(80));
        assert!(!obj.is_damaged_below(50));
    }
}
