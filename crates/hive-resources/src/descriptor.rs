//! Registrations of resource givers and takers.
//!
//! A [`ResourceDescriptor`] says "this object can give this resource", a
//! [`StoringDescriptor`] says "this object can accept this resource". Both
//! are filed under a grouping key, [`DEFAULT_KEY`] unless stated otherwise.
//! Amounts are not stored here: they are read live from the world minus the
//! explicit reservations held by the [`ResourceManager`].
//!
//! [`ResourceManager`]: crate::ResourceManager

use serde::{Deserialize, Serialize};

use hive_types::{ObjectId, ResourceType, RoomName};

/// The key every descriptor falls back to.
pub const DEFAULT_KEY: &str = "default";

/// How an object holds what it gives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Possession {
    /// Withdrawn from a store.
    Storing,
    /// Harvested from a deposit.
    Producing,
}

/// Whether a lookup is for giving or for accepting resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Taking resources out of an object.
    Retrieve,
    /// Putting resources into an object.
    Store,
}

/// An object that can give a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    /// Room of the object.
    pub room: RoomName,
    /// The giving object.
    pub object: ObjectId,
    /// Withdraw or harvest.
    pub possession: Possession,
    /// Resource given.
    pub resource: ResourceType,
    /// Grouping key.
    pub key: String,
}

impl ResourceDescriptor {
    /// Describe a giver under [`DEFAULT_KEY`].
    pub fn new(
        room: impl Into<RoomName>,
        object: ObjectId,
        possession: Possession,
        resource: ResourceType,
    ) -> Self {
        Self {
            room: room.into(),
            object,
            possession,
            resource,
            key: DEFAULT_KEY.to_owned(),
        }
    }

    /// File under a specific key.
    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }
}

/// An object that can accept a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoringDescriptor {
    /// Room of the object.
    pub room: RoomName,
    /// The accepting object.
    pub object: ObjectId,
    /// Resource accepted.
    pub resource: ResourceType,
    /// Grouping key.
    pub key: String,
}

impl StoringDescriptor {
    /// Describe an acceptor under [`DEFAULT_KEY`].
    pub fn new(room: impl Into<RoomName>, object: ObjectId, resource: ResourceType) -> Self {
        Self {
            room: room.into(),
            object,
            resource,
            key: DEFAULT_KEY.to_owned(),
        }
    }

    /// File under a specific key.
    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }
}

/// Either kind of registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "direction", rename_all = "snake_case")]
pub enum Registration {
    /// A giver.
    Retrieve(ResourceDescriptor),
    /// An acceptor.
    Store(StoringDescriptor),
}

impl From<ResourceDescriptor> for Registration {
    fn from(d: ResourceDescriptor) -> Self {
        Self::Retrieve(d)
    }
}

impl From<StoringDescriptor> for Registration {
    fn from(d: StoringDescriptor) -> Self {
        Self::Store(d)
    }
}

/// Common view of both descriptor kinds for index lookups.
pub(crate) trait Described {
    fn object(&self) -> ObjectId;
    fn possession(&self) -> Possession;
}

impl Described for ResourceDescriptor {
    fn object(&self) -> ObjectId {
        self.object
    }

    fn possession(&self) -> Possession {
        self.possession
    }
}

impl Described for StoringDescriptor {
    fn object(&self) -> ObjectId {
        self.object
    }

    fn possession(&self) -> Possession {
        Possession::Storing
    }
}
