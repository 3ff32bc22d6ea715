//! Canonical job factories.
//!
//! Every constructor follows the same recipe:
//!
//! 1. look the job up by `(mount, key)` and hand back the one already
//!    registered;
//! 2. check that the resources it needs exist nearby, filing a
//!    [`DeferredRequest`] with the [`Timer`](crate::Timer) when they do not;
//! 3. describe its roles with [`RoleConstructor`](crate::RoleConstructor);
//! 4. register a [`Task`](crate::Task) with a self check and a project.
//!
//! # Modules
//!
//! - `build`: spend energy on a construction site.
//! - `repair`: restore a damaged structure.
//! - `request`: fill a structure with a resource.
//! - `transfer`: move a resource list between two stores, merging repeats.
//! - `controller`: claim or reserve a room's controller.
//! - `scout`: gain sight of a room.

mod build;
mod controller;
mod repair;
mod request;
mod scout;
mod transfer;

pub use build::build_task;
pub use controller::{CLAIMER_TAG, claim_task, reserve_task};
pub use repair::repair_task;
pub use request::{HAULER_TAG, request_task};
pub use scout::scout_task;
pub use transfer::{transfer_task, transfer_task_with};

use tracing::debug;

use hive_resources::{MAX_QUERY_DISTANCE, SumOptions};
use hive_types::{ObjectId, ResourceType, RoomName, TaskIndex};

use crate::manager::TaskManager;
use crate::services::Services;
use crate::timer::DeferredRequest;

/// Outcome of issuing a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Issue {
    /// A new task was registered.
    Registered(TaskIndex),
    /// An identical task already exists.
    Existing(TaskIndex),
    /// The request was folded into an existing transfer.
    Merged(TaskIndex),
    /// Both endpoints share a room's center; orders were queued instead.
    Delegated,
    /// Nothing to work with yet; retried at `until`.
    Deferred {
        /// Tick the request is reissued.
        until: u64,
    },
    /// The request makes no sense against the current world.
    Skipped(&'static str),
}

impl Issue {
    /// The task now serving the request, if any.
    pub const fn task(&self) -> Option<TaskIndex> {
        match self {
            Self::Registered(index) | Self::Existing(index) | Self::Merged(index) => Some(*index),
            Self::Delegated | Self::Deferred { .. } | Self::Skipped(_) => None,
        }
    }
}

/// First task registered under `(mount, key)`.
fn existing(tasks: &TaskManager, mount: Option<ObjectId>, key: &str) -> Option<TaskIndex> {
    tasks.fetch(mount, key).first().copied()
}

/// File `request` for a retry after the configured delay.
fn defer(services: &mut Services<'_>, request: DeferredRequest) -> Issue {
    let until = services
        .tick()
        .saturating_add(services.settings.retry_delay_ticks);
    services.timer.add(until, request);
    Issue::Deferred { until }
}

/// Unreserved `resource` a worker could fetch for a job in `room`.
fn supply_near(services: &mut Services<'_>, room: &RoomName, resource: ResourceType) -> u32 {
    let options = SumOptions::default();
    let rooms = services.world.rooms_by_distance(room);
    rooms
        .into_iter()
        .filter(|(_, distance)| *distance <= MAX_QUERY_DISTANCE)
        .fold(0_u32, |acc, (name, _)| {
            acc.saturating_add(
                services
                    .resources
                    .sum(&*services.world, &name, resource, &options),
            )
        })
}

/// Owned room closest to `room`, the spawn point for remote jobs.
fn nearest_owned(services: &Services<'_>, room: &RoomName) -> Option<RoomName> {
    services
        .world
        .owned_rooms()
        .into_iter()
        .filter_map(|owned| {
            services
                .world
                .room_distance(&owned, room)
                .map(|d| (d, owned))
        })
        .min()
        .map(|(_, owned)| owned)
}

/// Issue a deferred request again.
pub fn reissue(tasks: &mut TaskManager, services: &mut Services<'_>, request: DeferredRequest) -> Issue {
    match request {
        DeferredRequest::Build { site } => build_task(tasks, services, site),
        DeferredRequest::Repair { target } => repair_task(tasks, services, target),
        DeferredRequest::Request {
            target,
            resource,
            amount,
        } => request_task(tasks, services, target, resource, amount),
        DeferredRequest::Transfer {
            from,
            to,
            list,
            merge,
        } => transfer_task_with(tasks, services, from, to, list, merge),
        DeferredRequest::Claim { room } => claim_task(tasks, services, &room),
        DeferredRequest::Reserve { room } => reserve_task(tasks, services, &room),
        DeferredRequest::Scout { room } => scout_task(tasks, services, &room),
    }
}

/// Reissue every request due this tick.
pub fn reissue_due(tasks: &mut TaskManager, services: &mut Services<'_>) -> Vec<Issue> {
    let tick = services.tick();
    let due = services.timer.take_due(tick);
    if !due.is_empty() {
        debug!(tick, count = due.len(), "reissuing deferred requests");
    }
    due.into_iter()
        .map(|request| reissue(tasks, services, request))
        .collect()
}
