//! Transactional outbox.
//!
//! Domain events are written to an outbox table in the same
//! transaction as the aggregate snapshot, then delivered to an
//! [`EventPublisher`] by a background [`OutboxRelay`]. Delivery is
//! at-least-once: consumers deduplicate on the event ID carried in
//! the payload.

pub mod publisher;
pub mod record;
pub mod relay;
pub mod store;

pub use publisher::{EventPublisher, PublishError};
pub use record::OutboxRecord;
pub use relay::{CycleStats, OutboxRelay, RelayConfig};
pub use store::{OutboxError, OutboxStore};
