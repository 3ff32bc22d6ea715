//! Error types for the task market and the project engine.
//!
//! Runtime outcomes (no worker, no source, saturated tag) are never errors;
//! these variants cover caller mistakes only.

use hive_types::{ObjectId, TaskIndex};

/// Errors raised by [`TaskManager`](crate::TaskManager) bookkeeping and
/// [`Project`](crate::Project) validation.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// No task is registered under the index.
    #[error("unknown task {0}")]
    UnknownTask(TaskIndex),

    /// The task has no role with that name.
    #[error("task {task} has no role {role}")]
    UnknownRole {
        /// The task.
        task: TaskIndex,
        /// The missing role.
        role: String,
    },

    /// The role already holds its maximum headcount.
    #[error("role {role} of task {task} is full")]
    RoleFull {
        /// The task.
        task: TaskIndex,
        /// The full role.
        role: String,
    },

    /// The worker is already assigned elsewhere.
    #[error("worker {worker} already works for task {task}")]
    WorkerBusy {
        /// The worker.
        worker: ObjectId,
        /// Its current task.
        task: TaskIndex,
    },

    /// A project definition is unusable.
    #[error("invalid project: {0}")]
    InvalidProject(&'static str),
}
