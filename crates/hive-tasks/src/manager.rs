//! The task market.
//!
//! [`TaskManager`] owns every live [`Task`], indexed three ways:
//!
//! - by room and job-type tag, split into waiting and working pools, for
//!   saturation control and worker matching;
//! - by `(mount object, key)` for idempotent issuance through
//!   [`fetch`](TaskManager::fetch);
//! - by worker, for assignment bookkeeping.
//!
//! # Tick order
//!
//! The driver calls [`check`](TaskManager::check) to prune dead jobs, then
//! [`assign_idle`](TaskManager::assign_idle) to hire idle workers in spawn
//! order, then [`run`](TaskManager::run) to execute working jobs.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use hive_types::{ObjectId, RoomName, TaskIndex};
use hive_world::World;

use crate::descriptor::{BodySpec, DEFAULT_TAG};
use crate::error::TaskError;
use crate::services::Services;
use crate::task::{Liveness, Task, TaskStatus};

/// Smallest task totals at which `floor(ln(total) / 2)` steps up: the
/// ceilings of `e^2`, `e^4`, `e^6`, and so on.
const LOG_STEPS: [u64; 10] = [
    8,
    55,
    404,
    2_981,
    22_027,
    162_755,
    1_202_605,
    8_886_111,
    65_659_970,
    485_165_196,
];

/// `floor(ln(total) * 0.5 + 1)`, the working ceiling for a tag holding
/// `total` tasks. Defined for `total >= 1`.
pub fn working_ceiling(total: usize) -> usize {
    let total = u64::try_from(total).unwrap_or(u64::MAX);
    LOG_STEPS
        .iter()
        .take_while(|step| total >= **step)
        .count()
        .saturating_add(1)
}

#[derive(Debug, Clone, Default)]
struct TagPool {
    waiting: BTreeSet<TaskIndex>,
    working: BTreeSet<TaskIndex>,
}

impl TagPool {
    fn total(&self) -> usize {
        self.waiting.len().saturating_add(self.working.len())
    }

    const fn set_mut(&mut self, status: TaskStatus) -> &mut BTreeSet<TaskIndex> {
        match status {
            TaskStatus::Waiting => &mut self.waiting,
            TaskStatus::Working => &mut self.working,
        }
    }
}

/// Task counts under one room and tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCounts {
    /// Registered tasks.
    pub total: usize,
    /// Tasks without workers.
    pub waiting: usize,
    /// Tasks with workers.
    pub working: usize,
}

/// Accumulated run cost under one room and tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Task runs.
    pub runs: u64,
    /// Wall time spent, in microseconds.
    pub micros: u64,
}

/// A worker-to-job match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hire {
    /// The job.
    pub task: TaskIndex,
    /// Role the worker would fill.
    pub role: String,
    /// Pay minus time cost.
    pub score: Decimal,
}

/// A role short of its minimum headcount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnRequest {
    /// The job.
    pub task: TaskIndex,
    /// Room that should spawn.
    pub room: RoomName,
    /// Role to fill.
    pub role: String,
    /// Body to build.
    pub body: BodySpec,
    /// Memory tag for the new worker.
    pub tag: String,
    /// Workers missing.
    pub missing: u32,
}

/// What [`TaskManager::run`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Tasks executed.
    pub ran: usize,
    /// Workers released.
    pub fired: usize,
}

/// The task market.
#[derive(Debug, Default)]
pub struct TaskManager {
    next_index: u64,
    tasks: BTreeMap<TaskIndex, Task>,
    pools: BTreeMap<RoomName, BTreeMap<String, TagPool>>,
    keys: BTreeMap<(Option<ObjectId>, String), Vec<TaskIndex>>,
    assignments: BTreeMap<ObjectId, TaskIndex>,
    stats: BTreeMap<(RoomName, String), RunStats>,
}

impl TaskManager {
    /// An empty market.
    pub const fn new() -> Self {
        Self {
            next_index: 0,
            tasks: BTreeMap::new(),
            pools: BTreeMap::new(),
            keys: BTreeMap::new(),
            assignments: BTreeMap::new(),
            stats: BTreeMap::new(),
        }
    }

    // -------------------------------------------------------------------
    // Registration
    // -------------------------------------------------------------------

    /// Register a task under its room. It starts in the waiting pool.
    pub fn register(&mut self, mut task: Task) -> TaskIndex {
        let index = TaskIndex(self.next_index);
        self.next_index = self.next_index.saturating_add(1);
        task.index = Some(index);

        let room = task.room().clone();
        let tag = task.tag().to_owned();
        self.pools
            .entry(room.clone())
            .or_default()
            .entry(tag.clone())
            .or_default()
            .waiting
            .insert(index);
        if let Some(key) = task.key() {
            self.keys
                .entry((task.mount_object(), key.to_owned()))
                .or_default()
                .push(index);
        }
        debug!(task = %index, room = %room, tag = %tag, key = ?task.key(), "task registered");
        self.tasks.insert(index, task);
        index
    }

    /// Tasks registered under `(mount, key)`.
    pub fn fetch(&self, mount: Option<ObjectId>, key: &str) -> Vec<TaskIndex> {
        self.keys
            .get(&(mount, key.to_owned()))
            .cloned()
            .unwrap_or_default()
    }

    /// A task by index.
    pub fn task(&self, index: TaskIndex) -> Option<&Task> {
        self.tasks.get(&index)
    }

    /// Mutable task by index.
    pub fn task_mut(&mut self, index: TaskIndex) -> Option<&mut Task> {
        self.tasks.get_mut(&index)
    }

    /// All tasks in index order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// Number of live tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no task is live.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Task a worker is assigned to.
    pub fn worker_task(&self, worker: ObjectId) -> Option<TaskIndex> {
        self.assignments.get(&worker).copied()
    }

    /// Counts under a room and tag.
    pub fn counts(&self, room: &RoomName, tag: &str) -> TagCounts {
        self.pools
            .get(room)
            .and_then(|tags| tags.get(tag))
            .map_or_else(TagCounts::default, |pool| TagCounts {
                total: pool.total(),
                waiting: pool.waiting.len(),
                working: pool.working.len(),
            })
    }

    /// Run cost per room and tag.
    pub const fn stats(&self) -> &BTreeMap<(RoomName, String), RunStats> {
        &self.stats
    }

    // -------------------------------------------------------------------
    // Saturation
    // -------------------------------------------------------------------

    /// Whether a tag has more working tasks than `floor(ln(total)/2 + 1)`.
    /// A tag without tasks is saturated.
    pub fn is_saturated(&self, room: &RoomName, tag: &str) -> bool {
        let counts = self.counts(room, tag);
        if counts.total == 0 {
            return true;
        }
        counts.working > working_ceiling(counts.total)
    }

    // -------------------------------------------------------------------
    // Pools and assignment
    // -------------------------------------------------------------------

    fn move_pool(&mut self, index: TaskIndex, status: TaskStatus) {
        let Some(task) = self.tasks.get(&index) else {
            return;
        };
        let Some(pool) = self
            .pools
            .get_mut(task.room())
            .and_then(|tags| tags.get_mut(task.tag()))
        else {
            return;
        };
        let from = match status {
            TaskStatus::Waiting => TaskStatus::Working,
            TaskStatus::Working => TaskStatus::Waiting,
        };
        if pool.set_mut(from).remove(&index) {
            pool.set_mut(status).insert(index);
        }
    }

    /// Move a task to the waiting or working pool.
    pub fn switch(&mut self, index: TaskIndex, status: TaskStatus) -> Result<(), TaskError> {
        if !self.tasks.contains_key(&index) {
            return Err(TaskError::UnknownTask(index));
        }
        self.move_pool(index, status);
        Ok(())
    }

    /// Put a worker on a task.
    pub fn assign(&mut self, index: TaskIndex, worker: ObjectId, role: &str) -> Result<(), TaskError> {
        if let Some(current) = self.assignments.get(&worker) {
            return Err(TaskError::WorkerBusy {
                worker,
                task: *current,
            });
        }
        let task = self
            .tasks
            .get_mut(&index)
            .ok_or(TaskError::UnknownTask(index))?;
        let Some(max) = task.descriptor().role_named(role).map(|r| r.max) else {
            return Err(TaskError::UnknownRole {
                task: index,
                role: role.to_owned(),
            });
        };
        if task.headcount(role) >= max {
            return Err(TaskError::RoleFull {
                task: index,
                role: role.to_owned(),
            });
        }
        let was_waiting = task.status() == TaskStatus::Waiting;
        task.add_worker(worker, role.to_owned());
        self.assignments.insert(worker, index);
        if was_waiting {
            self.move_pool(index, TaskStatus::Working);
        }
        debug!(task = %index, worker = %worker, role, "worker assigned");
        Ok(())
    }

    /// Take a worker off its task, cancelling any transaction it holds.
    pub fn unassign(&mut self, services: &mut Services<'_>, worker: ObjectId) -> Option<TaskIndex> {
        let index = self.assignments.remove(&worker)?;
        let idle = self.tasks.get_mut(&index).is_some_and(|task| {
            task.remove_worker(services, worker);
            task.workers().is_empty()
        });
        if idle {
            self.move_pool(index, TaskStatus::Waiting);
        }
        Some(index)
    }

    // -------------------------------------------------------------------
    // Matching
    // -------------------------------------------------------------------

    /// Best job for a worker.
    ///
    /// Rooms are visited nearest first; a room other than the worker's own
    /// is skipped if it rejects outside help or is marked unreachable.
    /// Within a room, tags other than [`DEFAULT_TAG`] are skipped while
    /// saturated, and only jobs with a vacancy for the worker's tag count.
    /// A job is waiting for hire exactly when it has such a vacancy, so the
    /// `working` pool is scanned too: a job with some workers can still be
    /// short of its maximum headcount.
    /// The highest `profit - (commute + working) * cpu_price` wins, and the
    /// first room with any candidate ends the search.
    pub fn query(&self, world: &dyn World, cpu_price: Decimal, worker: ObjectId) -> Option<Hire> {
        let object = world.object(worker)?;
        let tag = object.creep()?.tag.as_str();
        let home = object.room().clone();

        for (room, _) in world.rooms_by_distance(&home) {
            if room != home && (world.rejects_outside_help(&room) || world.is_unreachable(&room)) {
                continue;
            }
            let Some(tags) = self.pools.get(&room) else {
                continue;
            };

            let mut best: Option<Hire> = None;
            for (task_tag, pool) in tags {
                if task_tag != DEFAULT_TAG && self.is_saturated(&room, task_tag) {
                    continue;
                }
                for index in pool.waiting.iter().chain(pool.working.iter()) {
                    let Some(task) = self.tasks.get(index) else {
                        continue;
                    };
                    let Some(role) = task
                        .vacancy(tag)
                        .and_then(|name| task.descriptor().role_named(name))
                    else {
                        continue;
                    };
                    let Some(commute) = world.path_length(&object.pos, &task.position(world)) else {
                        continue;
                    };
                    let ticks = commute.saturating_add(role.working.ticks(object));
                    let score = role
                        .profit
                        .saturating_sub(cpu_price.saturating_mul(Decimal::from(ticks)));
                    if best.as_ref().is_none_or(|b| score > b.score) {
                        best = Some(Hire {
                            task: *index,
                            role: role.name.clone(),
                            score,
                        });
                    }
                }
            }
            if best.is_some() {
                return best;
            }
        }
        None
    }

    /// Offer jobs to every unassigned creep, oldest spawn first. Returns the
    /// hires made.
    pub fn assign_idle(&mut self, services: &mut Services<'_>) -> Vec<(ObjectId, TaskIndex)> {
        let idle: Vec<ObjectId> = services
            .world
            .creeps()
            .iter()
            .map(|c| c.id)
            .filter(|id| !self.assignments.contains_key(id))
            .collect();
        let mut hired = Vec::new();
        for worker in idle {
            let Some(hire) = self.query(&*services.world, services.settings.cpu_price, worker) else {
                continue;
            };
            if self.assign(hire.task, worker, &hire.role).is_ok() {
                hired.push((worker, hire.task));
            }
        }
        hired
    }

    // -------------------------------------------------------------------
    // Per-tick
    // -------------------------------------------------------------------

    /// Remove a task, settle its transactions, and release its workers.
    pub fn remove(&mut self, services: &mut Services<'_>, index: TaskIndex) -> Option<Task> {
        let mut task = self.tasks.remove(&index)?;
        for worker in task.workers().keys() {
            self.assignments.remove(worker);
        }
        task.settle(services);

        if let Some(tags) = self.pools.get_mut(task.room()) {
            if let Some(pool) = tags.get_mut(task.tag()) {
                pool.waiting.remove(&index);
                pool.working.remove(&index);
                if pool.total() == 0 {
                    tags.remove(task.tag());
                }
            }
            if tags.is_empty() {
                self.pools.remove(task.room());
            }
        }
        if let Some(key) = task.key() {
            let entry = (task.mount_object(), key.to_owned());
            if let Some(list) = self.keys.get_mut(&entry) {
                list.retain(|i| *i != index);
                if list.is_empty() {
                    self.keys.remove(&entry);
                }
            }
        }
        debug!(task = %index, room = %task.room(), tag = %task.tag(), "task removed");
        Some(task)
    }

    /// Prune every task whose self check reports dead. Returns the removed
    /// indices.
    pub fn check(&mut self, services: &mut Services<'_>) -> Vec<TaskIndex> {
        let dead: Vec<TaskIndex> = self
            .tasks
            .iter()
            .filter(|(_, task)| task.self_check(&*services.world) == Liveness::Dead)
            .map(|(index, _)| *index)
            .collect();
        for index in &dead {
            self.remove(services, *index);
        }
        dead
    }

    /// Run every working task one tick and release the workers they fire.
    pub fn run(&mut self, services: &mut Services<'_>) -> RunReport {
        let working: Vec<TaskIndex> = self
            .tasks
            .iter()
            .filter(|(_, task)| task.status() == TaskStatus::Working)
            .map(|(index, _)| *index)
            .collect();

        let mut report = RunReport::default();
        for index in working {
            let Some(task) = self.tasks.get_mut(&index) else {
                continue;
            };
            let started = Instant::now();
            let fired = task.run(services);
            for worker in &fired {
                task.remove_worker(services, *worker);
            }
            let micros = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
            let idle = task.workers().is_empty();
            let stats = self
                .stats
                .entry((task.room().clone(), task.tag().to_owned()))
                .or_default();
            stats.runs = stats.runs.saturating_add(1);
            stats.micros = stats.micros.saturating_add(micros);

            report.ran = report.ran.saturating_add(1);
            report.fired = report.fired.saturating_add(fired.len());
            for worker in fired {
                self.assignments.remove(&worker);
            }
            if idle {
                self.move_pool(index, TaskStatus::Waiting);
            }
        }
        if report.ran > 0 {
            info!(tick = services.tick(), ran = report.ran, fired = report.fired, "tasks run");
        }
        report
    }

    /// Roles below minimum headcount on jobs that may hire.
    pub fn spawn_requests(&self) -> Vec<SpawnRequest> {
        let mut requests = Vec::new();
        for (index, task) in &self.tasks {
            let hiring = task.status() == TaskStatus::Working
                || task.tag() == DEFAULT_TAG
                || !self.is_saturated(task.room(), task.tag());
            if !hiring {
                continue;
            }
            for role in &task.descriptor().roles {
                let have = task.headcount(&role.name);
                if have >= role.min {
                    continue;
                }
                requests.push(SpawnRequest {
                    task: *index,
                    room: role.spawn_room.clone().unwrap_or_else(|| task.room().clone()),
                    role: role.name.clone(),
                    body: role.body.clone(),
                    tag: role.spawn_tag(),
                    missing: role.min.saturating_sub(have),
                });
            }
        }
        requests
    }
}
