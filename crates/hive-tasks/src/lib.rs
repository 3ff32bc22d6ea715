//! Task market and job execution for the Hive colony agent.
//!
//! Jobs are issued by constructors, registered in the [`TaskManager`], and
//! matched with idle workers each tick. A hired worker runs the job's
//! [`Project`], a layered state machine that resumes across ticks from the
//! worker's own [`Cursor`]. Resources are fetched through the
//! [`ResourceManager`](hive_resources::ResourceManager) and paid for through
//! the [`Ledger`](hive_ledger::Ledger).
//!
//! # Modules
//!
//! - [`signal`] -- Closed set of project branch selectors.
//! - [`project`] -- Components, projects, cursors.
//! - [`components`] -- Reusable components and the canonical job bodies.
//! - [`descriptor`] -- Roles, bodies, headcounts, pay.
//! - [`task`] -- Live job instances and their payload.
//! - [`manager`] -- The market: registration, saturation, matching, runs.
//! - [`constructors`] -- Build, repair, request, transfer, claim, reserve, scout.
//! - [`timer`] -- Deferred job requests.
//! - [`settings`] -- Tunables.
//! - [`services`] -- The service bundle handed to jobs.
//! - [`error`] -- Error types.

pub mod components;
pub mod constructors;
pub mod descriptor;
pub mod error;
pub mod manager;
pub mod project;
pub mod services;
pub mod settings;
pub mod signal;
pub mod task;
pub mod timer;

pub use components::{AmountFn, FetchAndDo, WorkAction, amount_fn};
pub use constructors::{
    CLAIMER_TAG, HAULER_TAG, Issue, build_task, claim_task, reissue, reissue_due, repair_task,
    request_task, reserve_task, scout_task, transfer_task, transfer_task_with,
};
pub use descriptor::{BodySpec, DEFAULT_TAG, RoleConstructor, TaskDescriptor, WorkEstimate};
pub use error::TaskError;
pub use manager::{
    Hire, RunReport, RunStats, SpawnRequest, TagCounts, TaskManager, working_ceiling,
};
pub use project::{Component, Cursor, JobContext, Progress, Project, Signal, Step, StepData};
pub use services::Services;
pub use settings::{MergeStrategy, TaskSettings};
pub use signal::JobSignal;
pub use task::{CheckFn, Liveness, Task, TaskData, TaskStatus, WorkerSlot};
pub use timer::{DeferredRequest, Timer};
