//! Rooms, game objects, and the host capability interface for the Hive
//! colony agent.
//!
//! The colony core is written against the [`World`] trait: lookups,
//! distances, room flags, and creep actions returning an
//! [`ActionCode`](hive_types::ActionCode). This crate also ships
//! [`WorldState`], an in-memory host with simplified game rules, so the
//! whole agent runs and is tested without a game server.
//!
//! # Modules
//!
//! - [`error`] -- Error types for world construction and mutation.
//! - [`host`] -- The [`World`] trait and [`WorldEvent`] notifications.
//! - [`objects`] -- Templates for structures, sites, deposits, controllers, creeps.
//! - [`resource`] -- Deposit regeneration and harvesting.
//! - [`state`] -- [`WorldState`], the in-memory host.
//! - [`world_map`] -- The room graph with breadth-first distance queries.
//! - [`starting_colony`] -- Default seeded four-room starting colony.

pub mod error;
pub mod host;
pub mod objects;
pub mod resource;
pub mod starting_colony;
pub mod state;
pub mod world_map;

// Re-export primary types at crate root.
pub use error::WorldError;
pub use host::{ROOM_TRAVEL_TICKS, World, WorldEvent};
pub use starting_colony::{StartingColonyIds, create_starting_colony};
pub use state::{AdvanceReport, WorldState};
pub use world_map::{RoomState, WorldMap};
