//! Deferred job requests.
//!
//! When a constructor finds no resources it files the request here instead
//! of retrying every tick. The tick driver drains due requests and hands
//! them back to [`reissue`](crate::constructors::reissue).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use hive_types::{ObjectId, ResourceType, RoomName};

/// A job request to retry later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "job", rename_all = "snake_case")]
pub enum DeferredRequest {
    /// Build a construction site.
    Build {
        /// The site.
        site: ObjectId,
    },
    /// Repair a structure.
    Repair {
        /// The structure.
        target: ObjectId,
    },
    /// Fill a structure with a resource.
    Request {
        /// The structure.
        target: ObjectId,
        /// Resource wanted.
        resource: ResourceType,
        /// Units wanted.
        amount: u32,
    },
    /// Move resources between two stores.
    Transfer {
        /// Giving store.
        from: ObjectId,
        /// Receiving store.
        to: ObjectId,
        /// Units per resource.
        list: BTreeMap<ResourceType, u32>,
        /// Fold into an open job for the same pair.
        merge: bool,
    },
    /// Claim a room's controller.
    Claim {
        /// The room.
        room: RoomName,
    },
    /// Reserve a room's controller.
    Reserve {
        /// The room.
        room: RoomName,
    },
    /// Gain sight of a room.
    Scout {
        /// The room.
        room: RoomName,
    },
}

/// Requests keyed by the tick they fall due.
#[derive(Debug, Clone, Default)]
pub struct Timer {
    due: BTreeMap<u64, Vec<DeferredRequest>>,
}

impl Timer {
    /// An empty timer.
    pub const fn new() -> Self {
        Self {
            due: BTreeMap::new(),
        }
    }

    /// File a request for `at`. A request already pending for any tick is
    /// not filed twice.
    pub fn add(&mut self, at: u64, request: DeferredRequest) -> bool {
        if self.due.values().any(|list| list.contains(&request)) {
            return false;
        }
        debug!(at, request = ?request, "request deferred");
        self.due.entry(at).or_default().push(request);
        true
    }

    /// Remove and return every request due at or before `tick`, oldest first.
    pub fn take_due(&mut self, tick: u64) -> Vec<DeferredRequest> {
        let later = self.due.split_off(&tick.saturating_add(1));
        let due = std::mem::replace(&mut self.due, later);
        due.into_values().flatten().collect()
    }

    /// Number of pending requests.
    pub fn pending(&self) -> usize {
        self.due.values().map(Vec::len).fold(0, usize::saturating_add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_requests_come_out_in_order() {
        let mut timer = Timer::new();
        let a = DeferredRequest::Scout { room: "W3N1".into() };
        let b = DeferredRequest::Claim { room: "W1N2".into() };
        assert!(timer.add(20, b.clone()));
        assert!(timer.add(10, a.clone()));
        assert!(!timer.add(30, a.clone()));
        assert_eq!(timer.pending(), 2);

        assert!(timer.take_due(5).is_empty());
        assert_eq!(timer.take_due(20), vec![a, b]);
        assert_eq!(timer.pending(), 0);
    }
}
