//! Configuration loading and typed config structures for the Hive colony.
//!
//! The canonical configuration lives in `hive-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure, and provides a loader that reads the file. Every field has a
//! default, so an empty file is a valid configuration.

use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::Deserialize;

use hive_ledger::LendingPolicy;
use hive_tasks::{MergeStrategy, TaskSettings};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but makes no sense.
    #[error("invalid config: {reason}")]
    Invalid {
        /// What is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level colony configuration.
///
/// Mirrors the structure of `hive-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ColonyConfig {
    /// Run-level settings (name, seed, pacing, bounds, persistence).
    #[serde(default)]
    pub colony: ColonySection,

    /// Prices and the bank's lending policy.
    #[serde(default)]
    pub economy: EconomyConfig,

    /// Task market tunables.
    #[serde(default)]
    pub tasks: TasksConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ColonyConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `HIVE_BANK_SNAPSHOT` overrides `colony.bank_snapshot_path` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.colony.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to a mapping.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.economy.cancel_fee < Decimal::ZERO || self.economy.cancel_fee > Decimal::ONE {
            return Err(ConfigError::Invalid {
                reason: format!("economy.cancel_fee {} is outside [0, 1]", self.economy.cancel_fee),
            });
        }
        if self.economy.lending_ceiling.is_some_and(|c| c < Decimal::ZERO) {
            return Err(ConfigError::Invalid {
                reason: "economy.lending_ceiling must not be negative".to_owned(),
            });
        }
        if self.tasks.repair_threshold_pct > 100 {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "tasks.repair_threshold_pct {} exceeds 100",
                    self.tasks.repair_threshold_pct
                ),
            });
        }
        if self.tasks.max_steps_per_run == 0 {
            return Err(ConfigError::Invalid {
                reason: "tasks.max_steps_per_run must be at least 1".to_owned(),
            });
        }
        Ok(())
    }

    /// Tunables handed to the task market and constructors.
    pub fn task_settings(&self) -> TaskSettings {
        TaskSettings {
            cpu_price: self.economy.cpu_price,
            resource_price: self.economy.resource_price,
            cancel_fee: self.economy.cancel_fee,
            retry_delay_ticks: self.tasks.retry_delay_ticks,
            unreachable_ticks: self.tasks.unreachable_ticks,
            repair_threshold_pct: self.tasks.repair_threshold_pct,
            merge_strategy: self.tasks.merge_strategy,
            max_steps_per_run: self.tasks.max_steps_per_run,
        }
    }

    /// The bank's lending policy.
    pub const fn lending_policy(&self) -> LendingPolicy {
        LendingPolicy::from_ceiling(self.economy.lending_ceiling)
    }
}

/// Run-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ColonySection {
    /// Human-readable colony name.
    #[serde(default = "default_colony_name")]
    pub name: String,

    /// Seed for the starting layout.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Real-time milliseconds between ticks (0 = as fast as possible).
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Stop after this many ticks (0 = unlimited).
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,

    /// Most creeps the spawner keeps alive at once.
    #[serde(default = "default_max_creeps")]
    pub max_creeps: usize,

    /// Where the bank's loan book is saved and reloaded. No persistence
    /// when absent.
    #[serde(default)]
    pub bank_snapshot_path: Option<PathBuf>,
}

impl ColonySection {
    /// Override settings with environment variables when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("HIVE_BANK_SNAPSHOT") {
            self.bank_snapshot_path = Some(PathBuf::from(val));
        }
    }
}

impl Default for ColonySection {
    fn default() -> Self {
        Self {
            name: default_colony_name(),
            seed: default_seed(),
            tick_interval_ms: default_tick_interval_ms(),
            max_ticks: default_max_ticks(),
            max_creeps: default_max_creeps(),
            bank_snapshot_path: None,
        }
    }
}

/// Economy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EconomyConfig {
    /// Money one tick of worker time is worth.
    #[serde(default = "default_cpu_price")]
    pub cpu_price: Decimal,

    /// Money paid per resource unit moved.
    #[serde(default = "default_resource_price")]
    pub resource_price: Decimal,

    /// Fraction of a working transaction charged when it is cancelled.
    #[serde(default = "default_cancel_fee")]
    pub cancel_fee: Decimal,

    /// Cash minted into each owned spawn at a fresh start.
    #[serde(default = "default_starting_cash")]
    pub starting_cash: Decimal,

    /// Most any single account may owe the bank. Unlimited when absent.
    #[serde(default)]
    pub lending_ceiling: Option<Decimal>,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            cpu_price: default_cpu_price(),
            resource_price: default_resource_price(),
            cancel_fee: default_cancel_fee(),
            starting_cash: default_starting_cash(),
            lending_ceiling: None,
        }
    }
}

/// Task market configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TasksConfig {
    /// Ticks before a short-of-resources request is retried.
    #[serde(default = "default_retry_delay_ticks")]
    pub retry_delay_ticks: u64,

    /// Ticks a room stays unreachable after a failed path.
    #[serde(default = "default_unreachable_ticks")]
    pub unreachable_ticks: u64,

    /// Structures below this percentage of max hits get repaired.
    #[serde(default = "default_repair_threshold_pct")]
    pub repair_threshold_pct: u32,

    /// How repeat transfer requests merge.
    #[serde(default)]
    pub merge_strategy: MergeStrategy,

    /// Project nodes a worker may run per tick.
    #[serde(default = "default_max_steps_per_run")]
    pub max_steps_per_run: u32,
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            retry_delay_ticks: default_retry_delay_ticks(),
            unreachable_ticks: default_unreachable_ticks(),
            repair_threshold_pct: default_repair_threshold_pct(),
            merge_strategy: MergeStrategy::default(),
            max_steps_per_run: default_max_steps_per_run(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions for serde
// ---------------------------------------------------------------------------

fn default_colony_name() -> String {
    "Hive".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_tick_interval_ms() -> u64 {
    100
}

const fn default_max_ticks() -> u64 {
    1_000
}

const fn default_max_creeps() -> usize {
    12
}

const fn default_cpu_price() -> Decimal {
    Decimal::from_parts(1, 0, 0, false, 2)
}

const fn default_resource_price() -> Decimal {
    Decimal::from_parts(1, 0, 0, false, 2)
}

const fn default_cancel_fee() -> Decimal {
    Decimal::from_parts(1, 0, 0, false, 1)
}

const fn default_starting_cash() -> Decimal {
    Decimal::from_parts(100, 0, 0, false, 0)
}

const fn default_retry_delay_ticks() -> u64 {
    20
}

const fn default_unreachable_ticks() -> u64 {
    1_500
}

const fn default_repair_threshold_pct() -> u32 {
    80
}

const fn default_max_steps_per_run() -> u32 {
    16
}

fn default_log_level() -> String {
    "info".to_owned()
}
