//! Tunables shared by the task market and the task constructors.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How a second transfer request between the same two objects is folded
/// into the existing one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// Keep the larger amount per resource.
    Max,
    /// Add the amounts.
    #[default]
    Sum,
}

impl MergeStrategy {
    /// Combine an existing amount with a new request.
    pub const fn merge(self, existing: u32, requested: u32) -> u32 {
        match self {
            Self::Max => {
                if requested > existing {
                    requested
                } else {
                    existing
                }
            }
            Self::Sum => existing.saturating_add(requested),
        }
    }
}

/// Task tunables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskSettings {
    /// Money one tick of worker time is worth when scoring jobs.
    pub cpu_price: Decimal,
    /// Money paid per resource unit moved.
    pub resource_price: Decimal,
    /// Fraction of a working transaction's money charged on cancel.
    pub cancel_fee: Decimal,
    /// Ticks a constructor waits before retrying when resources are short.
    pub retry_delay_ticks: u64,
    /// Ticks a room stays marked unreachable after a failed path.
    pub unreachable_ticks: u64,
    /// Structures below this percentage of max hits get repair jobs.
    pub repair_threshold_pct: u32,
    /// How duplicate transfer requests merge.
    pub merge_strategy: MergeStrategy,
    /// Project nodes a worker may run in one tick.
    pub max_steps_per_run: u32,
}

impl Default for TaskSettings {
    fn default() -> Self {
        Self {
            cpu_price: Decimal::new(1, 2),
            resource_price: Decimal::new(1, 2),
            cancel_fee: Decimal::new(1, 1),
            retry_delay_ticks: 20,
            unreachable_ticks: 1_500,
            repair_threshold_pct: 80,
            merge_strategy: MergeStrategy::Sum,
            max_steps_per_run: 16,
        }
    }
}

impl TaskSettings {
    /// Money for moving `amount` units.
    pub fn price(&self, amount: u32) -> Decimal {
        self.resource_price.saturating_mul(Decimal::from(amount))
    }
}
