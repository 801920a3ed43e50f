//! Projection handler contract.

use async_trait::async_trait;
use thiserror::Error;

use domain::DomainEvent;

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("event payload decode failed: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("projection {projection} failed: {reason}")]
    Apply {
        projection: &'static str,
        reason: String,
    },
}

/// A consumer of domain events on the read side.
///
/// `handle` must be idempotent: the relay delivers at-least-once, so
/// the same event may arrive more than once and must change the view
/// only the first time.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Human-readable handler name for logs.
    fn name(&self) -> &'static str;

    /// Event type tags this handler subscribes to.
    fn event_types(&self) -> &'static [&'static str];

    async fn handle(&self, event: &DomainEvent) -> crate::Result<()>;
}
