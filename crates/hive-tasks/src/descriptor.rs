//! Declarative job descriptions: roles, headcounts, bodies, and pay.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use hive_types::{BodyPart, GameObject, RoomName};

/// The tag never subject to saturation.
pub const DEFAULT_TAG: &str = "default";

/// Body a spawner should build for a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodySpec {
    /// The repeating unit.
    pub unit: Vec<BodyPart>,
    /// How many times the unit may repeat when energy allows. 1 for a
    /// fixed body.
    pub max_repeat: u32,
}

impl BodySpec {
    /// A body built exactly once.
    pub const fn fixed(unit: Vec<BodyPart>) -> Self {
        Self {
            unit,
            max_repeat: 1,
        }
    }

    /// A body repeated up to `max_repeat` times.
    pub const fn scaled(unit: Vec<BodyPart>, max_repeat: u32) -> Self {
        Self { unit, max_repeat }
    }

    /// Energy cost of one unit.
    pub fn unit_cost(&self) -> u32 {
        self.unit
            .iter()
            .fold(0_u32, |acc, part| acc.saturating_add(part.cost()))
    }

    /// The largest body affordable with `energy`, `None` if not even one
    /// unit fits.
    pub fn realize(&self, energy: u32) -> Option<Vec<BodyPart>> {
        let cost = self.unit_cost();
        if cost == 0 || energy < cost {
            return None;
        }
        let repeat = energy.checked_div(cost)?.min(self.max_repeat).max(1);
        let mut body = Vec::new();
        for _ in 0..repeat {
            body.extend(self.unit.iter().copied());
        }
        Some(body)
    }
}

/// Estimate of ticks a worker spends working once on site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum WorkEstimate {
    /// A fixed number of ticks.
    Fixed {
        /// Ticks.
        ticks: u32,
    },
    /// `work` units done at `per_part` per tick per `part` in the body.
    ByParts {
        /// Body part doing the work.
        part: BodyPart,
        /// Total work.
        work: u32,
        /// Work per part per tick.
        per_part: u32,
    },
}

impl WorkEstimate {
    /// Ticks for a given worker.
    pub fn ticks(&self, worker: &GameObject) -> u32 {
        match *self {
            Self::Fixed { ticks } => ticks,
            Self::ByParts {
                part,
                work,
                per_part,
            } => {
                let parts = worker.creep().map_or(0, |c| c.count(part));
                let rate = parts.saturating_mul(per_part);
                if rate == 0 {
                    return u32::MAX;
                }
                work.div_ceil(rate)
            }
        }
    }
}

/// One role of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleConstructor {
    /// Role name, unique within the job.
    pub name: String,
    /// Headcount the job asks the spawner to reach.
    pub min: u32,
    /// Headcount cap.
    pub max: u32,
    /// Worker memory tags accepted. The empty tag stands for untagged workers.
    pub tags: BTreeSet<String>,
    /// Money per tick paid to a worker in this role.
    pub profit: Decimal,
    /// Ticks of work once on site.
    pub working: WorkEstimate,
    /// Body for newly spawned workers.
    pub body: BodySpec,
    /// Room that should spawn for this role, the job's room when `None`.
    pub spawn_room: Option<RoomName>,
}

impl RoleConstructor {
    /// A role with one worker at most, accepting untagged workers.
    pub fn new(name: impl Into<String>, body: BodySpec) -> Self {
        Self {
            name: name.into(),
            min: 1,
            max: 1,
            tags: BTreeSet::from([String::new()]),
            profit: Decimal::ONE,
            working: WorkEstimate::Fixed { ticks: 1 },
            body,
            spawn_room: None,
        }
    }

    /// Set headcount bounds.
    #[must_use]
    pub const fn headcount(mut self, min: u32, max: u32) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Also accept workers carrying `tag`.
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Accept only workers carrying `tag`.
    #[must_use]
    pub fn exclusive(mut self, tag: impl Into<String>) -> Self {
        self.tags = BTreeSet::from([tag.into()]);
        self
    }

    /// Set pay per tick.
    #[must_use]
    pub const fn profit(mut self, profit: Decimal) -> Self {
        self.profit = profit;
        self
    }

    /// Set the working-time estimate.
    #[must_use]
    pub const fn working(mut self, working: WorkEstimate) -> Self {
        self.working = working;
        self
    }

    /// Spawn from a specific room.
    #[must_use]
    pub fn spawn_room(mut self, room: impl Into<RoomName>) -> Self {
        self.spawn_room = Some(room.into());
        self
    }

    /// Whether a worker with memory tag `tag` fits.
    pub fn accepts(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Tag a newly spawned worker receives.
    pub fn spawn_tag(&self) -> String {
        self.tags
            .iter()
            .find(|t| !t.is_empty())
            .or_else(|| self.tags.first())
            .cloned()
            .unwrap_or_default()
    }
}

/// The declarative part of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    /// Job-type tag, the saturation group.
    pub tag: String,
    /// Roles.
    pub roles: Vec<RoleConstructor>,
    /// Idempotency key.
    pub key: Option<String>,
}

impl TaskDescriptor {
    /// A descriptor without roles.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            roles: Vec::new(),
            key: None,
        }
    }

    /// Add a role.
    #[must_use]
    pub fn role(mut self, role: RoleConstructor) -> Self {
        self.roles.push(role);
        self
    }

    /// Set the idempotency key.
    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Union of all roles' tags.
    pub fn spawn_tags(&self) -> BTreeSet<String> {
        self.roles
            .iter()
            .flat_map(|r| r.tags.iter().cloned())
            .collect()
    }

    /// A role by name.
    pub fn role_named(&self, name: &str) -> Option<&RoleConstructor> {
        self.roles.iter().find(|r| r.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hive_types::Position;
    use hive_world::objects;

    #[test]
    fn body_scales_with_energy() {
        let spec = BodySpec::scaled(vec![BodyPart::Work, BodyPart::Carry, BodyPart::Move], 3);
        assert_eq!(spec.unit_cost(), 200);
        assert!(spec.realize(150).is_none());
        assert_eq!(spec.realize(450).map(|b| b.len()), Some(6));
        assert_eq!(spec.realize(10_000).map(|b| b.len()), Some(9));
    }

    #[test]
    fn work_estimate_uses_body() {
        let worker = objects::creep(
            Position::new("W1N1", 1, 1),
            vec![BodyPart::Work, BodyPart::Work, BodyPart::Carry, BodyPart::Move],
            String::new(),
            0,
        );
        let estimate = WorkEstimate::ByParts {
            part: BodyPart::Work,
            work: 25,
            per_part: 5,
        };
        assert_eq!(estimate.ticks(&worker), 3);
        let none = WorkEstimate::ByParts {
            part: BodyPart::Claim,
            work: 1,
            per_part: 1,
        };
        assert_eq!(none.ticks(&worker), u32::MAX);
    }

    #[test]
    fn spawn_tags_union_roles() {
        let descriptor = TaskDescriptor::new("transfer")
            .role(RoleConstructor::new("hauler", BodySpec::fixed(vec![BodyPart::Carry])).tag("hauler"))
            .key("transfer:a:b");
        let tags = descriptor.spawn_tags();
        assert!(tags.contains("hauler"));
        assert!(tags.contains(""));
        assert_eq!(
            descriptor.role_named("hauler").map(RoleConstructor::spawn_tag),
            Some("hauler".to_owned())
        );
    }
}
