//! Background relay that drains the outbox.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::publisher::EventPublisher;
use crate::store::{OutboxError, OutboxStore};

/// Relay tuning knobs.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Stable name for this relay instance, stamped onto claims so
    /// concurrent relays stay out of each other's batches.
    pub instance_id: String,
    /// Maximum records claimed per cycle.
    pub batch_size: usize,
    /// Idle time between cycles.
    pub poll_interval: Duration,
}

impl RelayConfig {
    pub fn new(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            batch_size: 50,
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// Outcome of one relay cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub claimed: usize,
    pub published: usize,
    pub failed: usize,
}

/// Polls the outbox, publishes claimed records and marks them
/// processed one by one.
///
/// A record whose publish fails has its claim released immediately,
/// so a later cycle (here or on another instance) retries it. A relay
/// that crashes mid-batch leaves its claims to expire with the
/// store's lease.
pub struct OutboxRelay {
    store: Arc<dyn OutboxStore>,
    publisher: Arc<dyn EventPublisher>,
    config: RelayConfig,
}

impl OutboxRelay {
    pub fn new(
        store: Arc<dyn OutboxStore>,
        publisher: Arc<dyn EventPublisher>,
        config: RelayConfig,
    ) -> Self {
        Self {
            store,
            publisher,
            config,
        }
    }

    /// Claims one batch and attempts delivery of each record.
    ///
    /// Publish failures are absorbed into the returned stats; only
    /// store failures propagate.
    #[tracing::instrument(skip(self), fields(instance_id = %self.config.instance_id))]
    pub async fn run_cycle(&self) -> Result<CycleStats, OutboxError> {
        let batch = self
            .store
            .claim_batch(&self.config.instance_id, self.config.batch_size)
            .await?;

        let mut stats = CycleStats {
            claimed: batch.len(),
            ..CycleStats::default()
        };
        if batch.is_empty() {
            return Ok(stats);
        }
        tracing::debug!(claimed = batch.len(), "claimed outbox batch");

        for record in &batch {
            match self.publisher.publish(record).await {
                Ok(()) => {
                    self.store.mark_processed(record.id).await?;
                    metrics::counter!("outbox_published_total").increment(1);
                    stats.published += 1;
                }
                Err(err) => {
                    tracing::warn!(
                        event_id = %record.id,
                        event_type = %record.event_type,
                        error = %err,
                        "publish failed, releasing claim"
                    );
                    metrics::counter!("outbox_publish_failures_total").increment(1);
                    self.store.release_claim(record.id).await?;
                    stats.failed += 1;
                }
            }
        }

        Ok(stats)
    }

    /// Runs cycles on the configured interval until `shutdown`
    /// resolves.
    pub async fn run(&self, shutdown: impl Future<Output = ()>) {
        let mut interval = tokio::time::interval(self.config.poll_interval);
        tokio::pin!(shutdown);

        tracing::info!(
            instance_id = %self.config.instance_id,
            batch_size = self.config.batch_size,
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            "outbox relay started"
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!(instance_id = %self.config.instance_id, "outbox relay stopping");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(err) = self.run_cycle().await {
                        tracing::error!(error = %err, "relay cycle failed");
                    }
                }
            }
        }
    }
}
