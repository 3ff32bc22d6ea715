//! Live job instances.
//!
//! A [`Task`] pairs a [`TaskDescriptor`] with a payload ([`TaskData`]), a
//! [`Project`] every assigned worker runs, and a self check deciding
//! whether the job is still worth doing. Workers are tracked with their
//! role and their own [`Cursor`] into the shared project.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use hive_types::{ObjectId, Position, ResourceType, RoomName, TaskIndex, TransactionId};
use hive_world::World;

use crate::descriptor::TaskDescriptor;
use crate::project::{Cursor, Progress, Project};
use crate::services::Services;

/// Payload threaded through a job's self check and its components.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskData {
    /// Object the job acts on (site, structure, receiving store).
    pub target: Option<ObjectId>,
    /// Object resources come from, for jobs with a fixed source.
    pub source: Option<ObjectId>,
    /// Destination room, for jobs about a room.
    pub room: Option<RoomName>,
    /// Resource amounts still to move.
    pub list: BTreeMap<ResourceType, u32>,
    /// Transactions the job opened and must settle.
    pub transactions: Vec<TransactionId>,
    /// Set when no path to the destination exists.
    pub unreachable: bool,
}

impl TaskData {
    /// Units of a resource still to move.
    pub fn remaining(&self, resource: ResourceType) -> u32 {
        self.list.get(&resource).copied().unwrap_or(0)
    }

    /// Record `amount` units of a resource as moved.
    pub fn deliver(&mut self, resource: ResourceType, amount: u32) {
        if let Some(left) = self.list.get_mut(&resource) {
            *left = left.saturating_sub(amount);
            if *left == 0 {
                self.list.remove(&resource);
            }
        }
    }
}

/// Verdict of a self check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    /// Keep the job.
    Working,
    /// Remove the job and settle its transactions.
    Dead,
}

/// Pool a task sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// No workers.
    Waiting,
    /// At least one worker.
    Working,
}

/// A job's self check.
pub type CheckFn = Box<dyn Fn(&dyn World, &TaskData) -> Liveness>;

/// An assigned worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSlot {
    /// Role the worker fills.
    pub role: String,
    /// Position in the project.
    pub cursor: Cursor,
}

/// A live job.
pub struct Task {
    pub(crate) index: Option<TaskIndex>,
    room: RoomName,
    mount: Option<ObjectId>,
    descriptor: TaskDescriptor,
    data: TaskData,
    project: Project,
    check: CheckFn,
    workers: BTreeMap<ObjectId, WorkerSlot>,
}

impl core::fmt::Debug for Task {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Task")
            .field("index", &self.index)
            .field("room", &self.room)
            .field("tag", &self.descriptor.tag)
            .field("key", &self.descriptor.key)
            .field("mount", &self.mount)
            .field("workers", &self.workers.len())
            .finish_non_exhaustive()
    }
}

impl Task {
    /// Create an unregistered task.
    pub fn new(
        room: impl Into<RoomName>,
        descriptor: TaskDescriptor,
        project: Project,
        check: CheckFn,
    ) -> Self {
        Self {
            index: None,
            room: room.into(),
            mount: None,
            descriptor,
            data: TaskData::default(),
            project,
            check,
            workers: BTreeMap::new(),
        }
    }

    /// Attach the object the job is about.
    #[must_use]
    pub const fn mount(mut self, object: ObjectId) -> Self {
        self.mount = Some(object);
        self
    }

    /// Set the payload.
    #[must_use]
    pub fn data(mut self, data: TaskData) -> Self {
        self.data = data;
        self
    }

    /// Market index, `None` before registration.
    pub const fn index(&self) -> Option<TaskIndex> {
        self.index
    }

    /// Room the job is filed under.
    pub const fn room(&self) -> &RoomName {
        &self.room
    }

    /// Job-type tag.
    pub fn tag(&self) -> &str {
        &self.descriptor.tag
    }

    /// Idempotency key.
    pub fn key(&self) -> Option<&str> {
        self.descriptor.key.as_deref()
    }

    /// Object the job is about.
    pub const fn mount_object(&self) -> Option<ObjectId> {
        self.mount
    }

    /// The declarative description.
    pub const fn descriptor(&self) -> &TaskDescriptor {
        &self.descriptor
    }

    /// The payload.
    pub const fn task_data(&self) -> &TaskData {
        &self.data
    }

    /// Mutable payload.
    pub const fn task_data_mut(&mut self) -> &mut TaskData {
        &mut self.data
    }

    /// Assigned workers.
    pub const fn workers(&self) -> &BTreeMap<ObjectId, WorkerSlot> {
        &self.workers
    }

    /// Current pool.
    pub fn status(&self) -> TaskStatus {
        if self.workers.is_empty() {
            TaskStatus::Waiting
        } else {
            TaskStatus::Working
        }
    }

    /// Workers filling a role.
    pub fn headcount(&self, role: &str) -> u32 {
        let n = self.workers.values().filter(|w| w.role == role).count();
        u32::try_from(n).unwrap_or(u32::MAX)
    }

    /// First role accepting `tag` with room for another worker.
    pub fn vacancy(&self, tag: &str) -> Option<&str> {
        self.descriptor
            .roles
            .iter()
            .find(|r| r.accepts(tag) && self.headcount(&r.name) < r.max)
            .map(|r| r.name.as_str())
    }

    /// Where workers travel to: the mounted object if visible, else the
    /// target room's center.
    pub fn position(&self, world: &dyn World) -> Position {
        self.mount
            .and_then(|id| world.object(id))
            .map(|o| o.pos.clone())
            .unwrap_or_else(|| {
                let room = self.data.room.as_ref().unwrap_or(&self.room);
                Position::center_of(room)
            })
    }

    /// Run the self check.
    pub fn self_check(&self, world: &dyn World) -> Liveness {
        (self.check)(world, &self.data)
    }

    pub(crate) fn add_worker(&mut self, worker: ObjectId, role: String) {
        self.workers.insert(
            worker,
            WorkerSlot {
                role,
                cursor: Cursor::default(),
            },
        );
    }

    /// Remove a worker and cancel any transaction its cursor holds.
    pub(crate) fn remove_worker(&mut self, services: &mut Services<'_>, worker: ObjectId) {
        if let Some(slot) = self.workers.remove(&worker)
            && let Some(tx) = slot.cursor.data.transaction
        {
            services.resources.cancel(services.ledger, tx);
        }
    }

    /// Run every worker one tick. Returns the workers to fire: those whose
    /// project completed and those that no longer exist.
    pub fn run(&mut self, services: &mut Services<'_>) -> Vec<ObjectId> {
        let max_steps = services.settings.max_steps_per_run;
        let mut fired = Vec::new();
        for (worker, slot) in &mut self.workers {
            if services.world.object(*worker).is_none() {
                fired.push(*worker);
                continue;
            }
            let progress =
                self.project
                    .run(services, *worker, &mut self.data, &mut slot.cursor, max_steps);
            if let Progress::Complete(signal) = progress {
                debug!(worker = %worker, signal = ?signal, tag = %self.descriptor.tag, "worker finished");
                fired.push(*worker);
            }
        }
        fired
    }

    /// Cancel every transaction the job and its workers hold.
    pub(crate) fn settle(&mut self, services: &mut Services<'_>) {
        for tx in self.data.transactions.drain(..) {
            services.resources.cancel(services.ledger, tx);
        }
        let workers: Vec<ObjectId> = self.workers.keys().copied().collect();
        for worker in workers {
            self.remove_worker(services, worker);
        }
    }
}
