//! Resource directory for the Hive colony agent.
//!
//! Structures and deposits register what they can give or accept; jobs ask
//! the [`ResourceManager`] where to fetch from or deliver to. Amounts are
//! read live from the [`World`](hive_world::World) minus explicit
//! reservations, and reservations follow the lifecycle of the ledger
//! transaction that pays for the movement.
//!
//! # Modules
//!
//! - [`descriptor`] -- Giver and acceptor registrations.
//! - [`manager`] -- The four-level index, sums, queries, reservations, settlement.
//! - [`center`] -- Same-room fast-path orders between center structures.

pub mod center;
pub mod descriptor;
pub mod manager;

pub use center::{CenterOrder, CenterTransfer};
pub use descriptor::{
    DEFAULT_KEY, Direction, Possession, Registration, ResourceDescriptor, StoringDescriptor,
};
pub use manager::{
    DEFAULT_KEY_PENALTY, HARVEST_PENALTY, MAX_QUERY_DISTANCE, PurchaseRequest, QueryHit,
    QueryOptions, ResourceManager, SumOptions,
};
