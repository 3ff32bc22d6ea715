//! Room graph: rooms as nodes, exits as undirected edges.
//!
//! The [`WorldMap`] is the spatial backbone the core reads distances from.
//! Every exit costs one room of travel, so distance queries are plain
//! breadth-first searches. Results are deterministic: neighbors are kept in
//! a `BTreeSet` and ties between equally distant rooms break by name.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use hive_types::RoomName;

use crate::error::WorldError;

/// Mutable runtime state of one room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomState {
    /// Room name.
    pub name: RoomName,
    /// Whether the colony currently sees into the room.
    pub visible: bool,
    /// Whether the colony owns the room's controller.
    pub owned: bool,
    /// Whether workers from other rooms must not be hired into this room.
    pub rejects_outside_help: bool,
    /// Tick until which the room is considered unreachable.
    pub unreachable_until: Option<u64>,
}

impl RoomState {
    /// A visible, unowned room that accepts outside help.
    pub fn new(name: impl Into<RoomName>) -> Self {
        Self {
            name: name.into(),
            visible: true,
            owned: false,
            rejects_outside_help: false,
            unreachable_until: None,
        }
    }

    /// Builder-style setter for ownership.
    #[must_use]
    pub const fn owned(mut self) -> Self {
        self.owned = true;
        self
    }

    /// Builder-style setter for visibility.
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

/// The room graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorldMap {
    rooms: BTreeMap<RoomName, RoomState>,
    exits: BTreeMap<RoomName, BTreeSet<RoomName>>,
}

impl WorldMap {
    /// Create an empty map.
    pub const fn new() -> Self {
        Self {
            rooms: BTreeMap::new(),
            exits: BTreeMap::new(),
        }
    }

    // -------------------------------------------------------------------
    // Room operations
    // -------------------------------------------------------------------

    /// Add a room.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateRoom`] if the name is taken.
    pub fn add_room(&mut self, room: RoomState) -> Result<(), WorldError> {
        if self.rooms.contains_key(&room.name) {
            return Err(WorldError::DuplicateRoom(room.name));
        }
        self.exits.entry(room.name.clone()).or_default();
        self.rooms.insert(room.name.clone(), room);
        Ok(())
    }

    /// Connect two rooms with a two-way exit.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::RoomNotFound`] if either room is missing.
    pub fn connect(&mut self, a: &RoomName, b: &RoomName) -> Result<(), WorldError> {
        for name in [a, b] {
            if !self.rooms.contains_key(name) {
                return Err(WorldError::RoomNotFound(name.clone()));
            }
        }
        self.exits.entry(a.clone()).or_default().insert(b.clone());
        self.exits.entry(b.clone()).or_default().insert(a.clone());
        Ok(())
    }

    /// Look up a room.
    pub fn room(&self, name: &RoomName) -> Option<&RoomState> {
        self.rooms.get(name)
    }

    /// Look up a room mutably.
    pub fn room_mut(&mut self, name: &RoomName) -> Option<&mut RoomState> {
        self.rooms.get_mut(name)
    }

    /// Iterate over all rooms in name order.
    pub fn rooms(&self) -> impl Iterator<Item = &RoomState> {
        self.rooms.values()
    }

    /// Number of rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    // -------------------------------------------------------------------
    // Graph queries
    // -------------------------------------------------------------------

    /// Rooms directly connected to `name`.
    pub fn neighbors(&self, name: &RoomName) -> Vec<&RoomName> {
        self.exits
            .get(name)
            .map(|set| set.iter().collect())
            .unwrap_or_default()
    }

    /// Every room reachable from `from` with its distance in rooms,
    /// nearest first, `from` itself at distance 0.
    pub fn rooms_by_distance(&self, from: &RoomName) -> Vec<(RoomName, u32)> {
        if !self.rooms.contains_key(from) {
            return Vec::new();
        }
        let mut order = Vec::new();
        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::new();
        visited.insert(from.clone());
        queue.push_back((from.clone(), 0_u32));

        while let Some((current, dist)) = queue.pop_front() {
            for neighbor in self.neighbors(&current) {
                if visited.insert(neighbor.clone()) {
                    queue.push_back((neighbor.clone(), dist.saturating_add(1)));
                }
            }
            order.push((current, dist));
        }
        order
    }

    /// Distance in rooms between `a` and `b`, `None` if disconnected.
    pub fn distance(&self, a: &RoomName, b: &RoomName) -> Option<u32> {
        if a == b {
            return self.rooms.contains_key(a).then_some(0);
        }
        self.rooms_by_distance(a)
            .into_iter()
            .find(|(name, _)| name == b)
            .map(|(_, dist)| dist)
    }

    /// First room to enter on a shortest route from `from` to `to`.
    pub fn next_hop(&self, from: &RoomName, to: &RoomName) -> Option<RoomName> {
        if from == to {
            return None;
        }
        let mut prev: BTreeMap<RoomName, RoomName> = BTreeMap::new();
        let mut queue = VecDeque::new();
        queue.push_back(from.clone());
        let mut seen = BTreeSet::new();
        seen.insert(from.clone());

        while let Some(current) = queue.pop_front() {
            if &current == to {
                break;
            }
            for neighbor in self.neighbors(&current) {
                if seen.insert(neighbor.clone()) {
                    prev.insert(neighbor.clone(), current.clone());
                    queue.push_back(neighbor.clone());
                }
            }
        }

        let mut step = to.clone();
        loop {
            let parent = prev.get(&step)?;
            if parent == from {
                return Some(step);
            }
            step = parent.clone();
        }
    }

    /// Whether every room is reachable from every other room.
    pub fn is_connected(&self) -> bool {
        let Some(first) = self.rooms.keys().next() else {
            return true;
        };
        self.rooms_by_distance(first).len() == self.rooms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_map() -> WorldMap {
        let mut map = WorldMap::new();
        for name in ["W1N1", "W2N1", "W3N1"] {
            assert!(map.add_room(RoomState::new(name)).is_ok());
        }
        assert!(map.connect(&"W1N1".into(), &"W2N1".into()).is_ok());
        assert!(map.connect(&"W2N1".into(), &"W3N1".into()).is_ok());
        map
    }

    #[test]
    fn duplicate_room_rejected() {
        let mut map = WorldMap::new();
        assert!(map.add_room(RoomState::new("W1N1")).is_ok());
        assert!(matches!(
            map.add_room(RoomState::new("W1N1")),
            Err(WorldError::DuplicateRoom(_))
        ));
    }

    #[test]
    fn connect_requires_both_rooms() {
        let mut map = WorldMap::new();
        assert!(map.add_room(RoomState::new("W1N1")).is_ok());
        assert!(matches!(
            map.connect(&"W1N1".into(), &"W9N9".into()),
            Err(WorldError::RoomNotFound(_))
        ));
    }

    #[test]
    fn rooms_by_distance_orders_nearest_first() {
        let map = line_map();
        let order = map.rooms_by_distance(&"W1N1".into());
        let names: Vec<&str> = order.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["W1N1", "W2N1", "W3N1"]);
        assert_eq!(order.last().map(|(_, d)| *d), Some(2));
    }

    #[test]
    fn distance_and_next_hop() {
        let map = line_map();
        assert_eq!(map.distance(&"W1N1".into(), &"W3N1".into()), Some(2));
        assert_eq!(
            map.next_hop(&"W1N1".into(), &"W3N1".into()),
            Some(RoomName::from("W2N1"))
        );
        assert_eq!(map.next_hop(&"W1N1".into(), &"W1N1".into()), None);
    }

    #[test]
    fn disconnected_room_has_no_distance() {
        let mut map = line_map();
        assert!(map.add_room(RoomState::new("E5S5")).is_ok());
        assert_eq!(map.distance(&"W1N1".into(), &"E5S5".into()), None);
        assert_eq!(map.next_hop(&"W1N1".into(), &"E5S5".into()), None);
        assert!(!map.is_connected());
    }
}
