//! Persistence adapters.
//!
//! [`InMemoryStore`] backs tests and local development;
//! [`PostgresStore`] is the production implementation. Both implement
//! the [`domain::OrderRepository`] and [`outbox::OutboxStore`] ports
//! over a single backing store, which is what makes the write path
//! atomic: the aggregate snapshot and its outbox rows commit together
//! or not at all.

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;

/// Default claim lease. A relay that dies mid-batch blocks
/// redelivery of its claimed records for at most this long.
pub const DEFAULT_CLAIM_LEASE: std::time::Duration = std::time::Duration::from_secs(30);
