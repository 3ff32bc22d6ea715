//! Tick clock, colony state, and orchestration for the Hive colony agent.
//!
//! This crate owns the per-tick cycle that drives a colony: wake the world,
//! scan owned rooms for work, reissue deferred jobs, check, hire, run, drain
//! center transfers, spawn, and forward purchase requests to the terminal.
//!
//! # Modules
//!
//! - [`clock`] -- Monotonic tick counter.
//! - [`colony`] -- [`ColonyState`], the owner of every service.
//! - [`config`] -- Configuration loading from `hive-config.yaml` into
//!   strongly-typed structs.
//! - [`control`] -- Pause/resume/stop state shared with the tick loop.
//! - [`runner`] -- The bounded async tick loop.
//! - [`scanner`] -- Structure registration and job issuing for owned rooms.
//! - [`spawner`] -- Realizes spawn requests.
//! - [`tick`] -- One tick of the colony.
//!
//! [`ColonyState`]: colony::ColonyState

pub mod clock;
pub mod colony;
pub mod config;
pub mod control;
pub mod runner;
pub mod scanner;
pub mod spawner;
pub mod tick;

pub use colony::ColonyState;
pub use config::{ColonyConfig, ConfigError, LogFormat};
pub use control::{EndReason, RunControl};
pub use runner::{NoOpCallback, RunResult, RunnerError, TickCallback, log_run_end, run_colony};
pub use tick::{TickError, TickSummary, run_tick};
