//! Enumeration types shared across the workspace.

use serde::{Deserialize, Serialize};

/// A resource that can be harvested, stored, carried, or traded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    /// Basic currency of every structure and body part.
    Energy,
    /// Processed power from power banks.
    Power,
    /// Base mineral H.
    Hydrogen,
    /// Base mineral O.
    Oxygen,
    /// Base mineral U.
    Utrium,
    /// Base mineral L.
    Lemergium,
    /// Base mineral K.
    Keanium,
    /// Base mineral Z.
    Zynthium,
    /// Base mineral X.
    Catalyst,
    /// Compound G.
    Ghodium,
}

impl ResourceType {
    /// All resource types, in declaration order.
    pub const ALL: [Self; 10] = [
        Self::Energy,
        Self::Power,
        Self::Hydrogen,
        Self::Oxygen,
        Self::Utrium,
        Self::Lemergium,
        Self::Keanium,
        Self::Zynthium,
        Self::Catalyst,
        Self::Ghodium,
    ];
}

/// The concrete kind of a game object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// A worker unit.
    Creep,
    /// Creep factory.
    Spawn,
    /// Extra energy capacity for spawning.
    Extension,
    /// Small general-purpose store.
    Container,
    /// Large general-purpose store at the room center.
    Storage,
    /// Cross-room trading store.
    Terminal,
    /// Energy teleporter.
    Link,
    /// Defensive turret.
    Tower,
    /// Reaction lab.
    Lab,
    /// Commodity factory.
    Factory,
    /// Harvestable energy node.
    Source,
    /// Harvestable mineral deposit.
    Mineral,
    /// Structure under construction.
    ConstructionSite,
    /// Room controller.
    Controller,
    /// Road tile.
    Road,
    /// Constructed wall.
    Wall,
    /// Rampart.
    Rampart,
}

impl ObjectKind {
    /// Whether objects of this kind are harvested rather than withdrawn from.
    pub const fn is_harvestable(self) -> bool {
        matches!(self, Self::Source | Self::Mineral)
    }

    /// Whether this kind is a finished structure that can decay and be repaired.
    pub const fn is_structure(self) -> bool {
        !matches!(
            self,
            Self::Creep | Self::Source | Self::Mineral | Self::ConstructionSite | Self::Controller
        )
    }
}

/// A creep body part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyPart {
    /// Harvest, build, repair.
    Work,
    /// 50 units of carry capacity.
    Carry,
    /// Movement.
    Move,
    /// Claim or reserve controllers.
    Claim,
    /// Melee attack.
    Attack,
    /// Ranged attack.
    RangedAttack,
    /// Heal.
    Heal,
    /// Extra hit points.
    Tough,
}

impl BodyPart {
    /// Spawn cost of one part, in energy.
    pub const fn cost(self) -> u32 {
        match self {
            Self::Work => 100,
            Self::Carry | Self::Move => 50,
            Self::Claim => 600,
            Self::Attack => 80,
            Self::RangedAttack => 150,
            Self::Heal => 250,
            Self::Tough => 10,
        }
    }
}

/// Return code of a game action issued against the world host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionCode {
    /// The action was scheduled.
    Ok,
    /// The actor is not close enough to the target.
    NotInRange,
    /// The source does not hold enough of the resource.
    NotEnoughResources,
    /// The target cannot accept more.
    Full,
    /// The target does not exist or cannot be acted upon this way.
    InvalidTarget,
    /// No path to the destination.
    NoPath,
    /// The actor lacks the required body part.
    NoBodyPart,
    /// The actor does not exist or is not a creep.
    NotFound,
}

impl ActionCode {
    /// Whether the action was accepted.
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}
