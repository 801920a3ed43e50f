//! Event-type keyed handler registry.

use std::collections::HashMap;
use std::sync::Arc;

use domain::DomainEvent;

use crate::handler::EventHandler;

/// Routes events to handlers by their type tag.
///
/// Registration is finished before dispatching starts, so the
/// registry itself needs no locking.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<&'static str, Vec<Arc<dyn EventHandler>>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes a handler to every event type it declares.
    pub fn register(&mut self, handler: Arc<dyn EventHandler>) {
        for event_type in handler.event_types() {
            self.handlers
                .entry(event_type)
                .or_default()
                .push(handler.clone());
        }
    }

    /// Delivers one event to every subscribed handler in
    /// registration order. An event type with no subscribers is not
    /// an error.
    pub async fn dispatch(&self, event: &DomainEvent) -> crate::Result<()> {
        let Some(handlers) = self.handlers.get(event.event_type()) else {
            tracing::trace!(event_type = event.event_type(), "no handlers registered");
            return Ok(());
        };
        for handler in handlers {
            handler.handle(event).await.inspect_err(|err| {
                tracing::error!(
                    handler = handler.name(),
                    event_id = %event.event_id,
                    error = %err,
                    "handler failed"
                );
            })?;
        }
        metrics::counter!("projection_events_applied_total").increment(1);
        Ok(())
    }

    /// Delivers a batch in order, stopping at the first failure.
    pub async fn dispatch_all(&self, events: &[DomainEvent]) -> crate::Result<()> {
        for event in events {
            self.dispatch(event).await?;
        }
        Ok(())
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.values().map(Vec::len).sum()
    }
}
