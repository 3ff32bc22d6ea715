//! Branch selectors for project graphs.
//!
//! A component that finishes a step emits a [`JobSignal`]; the project
//! looks the signal up in its next layer. Host action codes map onto
//! signals through [`JobSignal::from_action`]:
//!
//! | `ActionCode`          | `JobSignal`  |
//! |-----------------------|--------------|
//! | `Ok`                  | `Ok`         |
//! | `NotInRange`          | `NotInRange` |
//! | `NotEnoughResources`  | `Empty`      |
//! | `Full`                | `Full`       |
//! | `InvalidTarget`       | `Invalid`    |
//! | `NoBodyPart`          | `Invalid`    |
//! | `NoPath`              | `NoPath`     |
//! | `NotFound`            | `NotFound`   |
//!
//! `Done` has no action counterpart: components emit it when their goal is
//! met.

use serde::{Deserialize, Serialize};

use hive_types::ActionCode;

/// Closed set of project branch selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobSignal {
    /// Step succeeded; also the entry key of layer 0.
    Ok,
    /// The worker carries enough, skip fetching.
    Full,
    /// The worker or the source ran dry.
    Empty,
    /// The goal of the job is reached.
    Done,
    /// Target too far for the action.
    NotInRange,
    /// Target or source missing.
    NotFound,
    /// No route to the destination.
    NoPath,
    /// The action cannot be performed by this worker on this target.
    Invalid,
}

impl JobSignal {
    /// Map a host action code.
    pub const fn from_action(code: ActionCode) -> Self {
        match code {
            ActionCode::Ok => Self::Ok,
            ActionCode::NotInRange => Self::NotInRange,
            ActionCode::NotEnoughResources => Self::Empty,
            ActionCode::Full => Self::Full,
            ActionCode::InvalidTarget | ActionCode::NoBodyPart => Self::Invalid,
            ActionCode::NoPath => Self::NoPath,
            ActionCode::NotFound => Self::NotFound,
        }
    }
}

impl From<ActionCode> for JobSignal {
    fn from(code: ActionCode) -> Self {
        Self::from_action(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_codes_map_onto_signals() {
        assert_eq!(JobSignal::from(ActionCode::Ok), JobSignal::Ok);
        assert_eq!(JobSignal::from(ActionCode::NotEnoughResources), JobSignal::Empty);
        assert_eq!(JobSignal::from(ActionCode::NoBodyPart), JobSignal::Invalid);
        assert_eq!(JobSignal::from(ActionCode::NoPath), JobSignal::NoPath);
    }
}
