//! Shared type definitions for the Hive colony agent.
//!
//! This crate is the single source of truth for the vocabulary used across
//! the workspace: identifiers, resource and object kinds, positions, stores,
//! and the game-object snapshot the world host hands to the core.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe wrappers for object, transaction, task, and room ids
//! - [`enums`] -- Resource types, object kinds, body parts, action codes
//! - [`structs`] -- Positions, stores, and game objects with tagged detail

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{ActionCode, BodyPart, ObjectKind, ResourceType};
pub use ids::{ObjectId, RoomName, TaskIndex, TransactionId};
pub use structs::{
    CARRY_CAPACITY_PER_PART, ControllerInfo, CreepInfo, GameObject, ObjectDetail, Position,
    SiteInfo, Store,
};
