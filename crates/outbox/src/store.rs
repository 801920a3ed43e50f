//! Outbox persistence port.

use async_trait::async_trait;
use thiserror::Error;

use common::EventId;

use crate::record::OutboxRecord;

/// Errors surfaced by outbox store implementations.
#[derive(Debug, Error)]
pub enum OutboxError {
    #[error("outbox record {0} not found")]
    RecordNotFound(EventId),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl OutboxError {
    pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        OutboxError::Storage(Box::new(err))
    }
}

/// Storage contract for the outbox table.
///
/// Records are inserted by the repository inside the aggregate save
/// transaction; this trait covers only the relay side. `claim_batch`
/// must hand each unprocessed record to at most one live claimant at
/// a time: a claim expires after the store's lease duration, so a
/// crashed relay's records become claimable again.
#[async_trait]
pub trait OutboxStore: Send + Sync {
    /// Atomically claims up to `limit` unprocessed, unclaimed records
    /// for `instance_id`, oldest first. Records whose claim lease has
    /// expired count as unclaimed.
    async fn claim_batch(
        &self,
        instance_id: &str,
        limit: usize,
    ) -> Result<Vec<OutboxRecord>, OutboxError>;

    /// Marks one record as delivered.
    async fn mark_processed(&self, id: EventId) -> Result<(), OutboxError>;

    /// Returns a record to the unclaimed pool after a failed publish.
    async fn release_claim(&self, id: EventId) -> Result<(), OutboxError>;

    /// Number of records not yet delivered.
    async fn unprocessed_count(&self) -> Result<u64, OutboxError>;
}
