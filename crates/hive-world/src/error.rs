//! Error types for the `hive-world` crate.
//!
//! Game actions never fail with an error: they return an
//! [`ActionCode`](hive_types::ActionCode) like the host would. [`WorldError`]
//! is reserved for building and mutating the world itself.

use hive_types::{ObjectId, RoomName};

/// Errors that can occur while constructing or mutating the world.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A room was not found on the map.
    #[error("room not found: {0}")]
    RoomNotFound(RoomName),

    /// A room with the same name already exists.
    #[error("duplicate room: {0}")]
    DuplicateRoom(RoomName),

    /// An object was not found.
    #[error("object not found: {0}")]
    ObjectNotFound(ObjectId),

    /// An object with the same id already exists.
    #[error("duplicate object id: {0}")]
    DuplicateObject(ObjectId),

    /// The object asked to spawn is not a spawn.
    #[error("object {0} is not a spawn")]
    NotASpawn(ObjectId),

    /// A creep body must have at least one part.
    #[error("cannot spawn a creep with an empty body")]
    EmptyBody,

    /// The room does not hold enough energy to pay for the body.
    #[error("room {room} has {available} energy, body costs {required}")]
    NotEnoughEnergy {
        /// Room paying for the creep.
        room: RoomName,
        /// Body cost.
        required: u32,
        /// Energy available in spawns and extensions.
        available: u32,
    },

    /// Arithmetic overflow during a checked operation.
    #[error("arithmetic overflow in world calculation")]
    ArithmeticOverflow,
}
