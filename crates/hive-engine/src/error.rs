//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of engine startup, the run, and
//! the bank snapshot round trip.

use std::path::PathBuf;

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: hive_core::ConfigError,
    },

    /// Starting colony construction failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: hive_world::WorldError,
    },

    /// The tick loop failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: hive_core::RunnerError,
    },

    /// Reading or writing the bank snapshot failed.
    #[error("bank snapshot {path}: {source}")]
    SnapshotIo {
        /// Snapshot location.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The bank snapshot could not be encoded or decoded.
    #[error("bank snapshot format: {source}")]
    SnapshotFormat {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}
