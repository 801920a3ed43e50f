//! Downstream delivery port.

use async_trait::async_trait;
use thiserror::Error;

use crate::record::OutboxRecord;

/// Publishing failure. The relay treats every publish error as
/// retryable: the record's claim is released and a later cycle tries
/// again.
#[derive(Debug, Error)]
#[error("publish failed for event {event_id}: {reason}")]
pub struct PublishError {
    pub event_id: common::EventId,
    pub reason: String,
}

impl PublishError {
    pub fn new(event_id: common::EventId, reason: impl Into<String>) -> Self {
        Self {
            event_id,
            reason: reason.into(),
        }
    }
}

/// Sink for outbox records leaving the transactional boundary.
///
/// Implementations must tolerate duplicates: the relay guarantees
/// at-least-once delivery, not exactly-once.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, record: &OutboxRecord) -> Result<(), PublishError>;
}
