//! Same-room fast-path transfers between center structures.
//!
//! Storage, terminal, and the center link of a room can exchange resources
//! without a hauler. A transaction between two members of the same room is
//! delegated here: it is paid on the spot and an order is queued, which the
//! tick driver executes one per room per tick.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use hive_types::{ObjectId, ResourceType, RoomName, TransactionId};

/// A queued direct transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CenterOrder {
    /// Room both endpoints are in.
    pub room: RoomName,
    /// Giving structure.
    pub from: ObjectId,
    /// Receiving structure.
    pub to: ObjectId,
    /// Resource moved.
    pub resource: ResourceType,
    /// Units moved.
    pub amount: u32,
    /// Delegated transaction that paid for the order.
    pub transaction: Option<TransactionId>,
}

/// Members and pending orders per room.
#[derive(Debug, Clone, Default)]
pub struct CenterTransfer {
    members: BTreeMap<RoomName, BTreeSet<ObjectId>>,
    orders: BTreeMap<RoomName, VecDeque<CenterOrder>>,
}

impl CenterTransfer {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            members: BTreeMap::new(),
            orders: BTreeMap::new(),
        }
    }

    /// Enroll a structure in its room's center group.
    pub fn register(&mut self, room: RoomName, object: ObjectId) {
        self.members.entry(room).or_default().insert(object);
    }

    /// Remove a structure from every group.
    pub fn unregister(&mut self, object: ObjectId) {
        for set in self.members.values_mut() {
            set.remove(&object);
        }
    }

    /// Drop members of a room that fail `keep`. Returns members dropped.
    pub fn retain_members(&mut self, room: &RoomName, keep: impl Fn(ObjectId) -> bool) -> usize {
        let Some(set) = self.members.get_mut(room) else {
            return 0;
        };
        let before = set.len();
        set.retain(|id| keep(*id));
        before.saturating_sub(set.len())
    }

    /// Whether the object belongs to any center group.
    pub fn is_member(&self, object: ObjectId) -> bool {
        self.members.values().any(|set| set.contains(&object))
    }

    /// Room shared by two members, if both are in the same group.
    pub fn shared_room(&self, a: ObjectId, b: ObjectId) -> Option<&RoomName> {
        self.members
            .iter()
            .find(|(_, set)| set.contains(&a) && set.contains(&b))
            .map(|(room, _)| room)
    }

    /// Queue an order.
    pub fn push(&mut self, order: CenterOrder) {
        self.orders
            .entry(order.room.clone())
            .or_default()
            .push_back(order);
    }

    /// Take the next order of a room.
    pub fn pop(&mut self, room: &RoomName) -> Option<CenterOrder> {
        let queue = self.orders.get_mut(room)?;
        let order = queue.pop_front();
        if queue.is_empty() {
            self.orders.remove(room);
        }
        order
    }

    /// Rooms with pending orders.
    pub fn busy_rooms(&self) -> Vec<RoomName> {
        self.orders.keys().cloned().collect()
    }

    /// Pending orders of a room.
    pub fn pending(&self, room: &RoomName) -> usize {
        self.orders.get(room).map_or(0, VecDeque::len)
    }
}
