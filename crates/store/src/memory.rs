//! In-memory store for tests and local development.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use common::{EventId, OrderId};
use domain::{Order, OrderRepository, RepositoryError};
use outbox::{OutboxError, OutboxRecord, OutboxStore};

use crate::DEFAULT_CLAIM_LEASE;

#[derive(Default)]
struct Inner {
    orders: HashMap<OrderId, Order>,
    outbox: Vec<OutboxRecord>,
}

/// Hash-map backed implementation of both persistence ports.
///
/// Orders and outbox records live behind one lock, giving the same
/// all-or-nothing save semantics as the Postgres transaction.
#[derive(Clone)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
    claim_lease: Duration,
    fail_next_save: Arc<AtomicBool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            claim_lease: DEFAULT_CLAIM_LEASE,
            fail_next_save: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_claim_lease(mut self, lease: Duration) -> Self {
        self.claim_lease = lease;
        self
    }

    /// Makes the next `save` fail before touching any state. Lets
    /// tests assert that a failed save leaves neither a snapshot nor
    /// outbox rows behind.
    pub fn fail_next_save(&self) {
        self.fail_next_save.store(true, Ordering::SeqCst);
    }

    /// Snapshot of the whole outbox, processed records included.
    pub fn outbox_records(&self) -> Vec<OutboxRecord> {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).outbox.clone()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
#[error("simulated storage failure")]
struct SimulatedFailure;

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.read().orders.get(id).cloned())
    }

    async fn save(&self, order: &mut Order) -> Result<(), RepositoryError> {
        if self.fail_next_save.swap(false, Ordering::SeqCst) {
            return Err(RepositoryError::storage(SimulatedFailure));
        }

        let mut inner = self.write();

        if let Some(stored) = inner.orders.get(order.id()) {
            if stored.version() != order.version() {
                return Err(RepositoryError::ConcurrencyConflict {
                    order_id: order.id().clone(),
                    expected: order.version(),
                    actual: stored.version(),
                });
            }
        }

        let records = order
            .pending_events()
            .iter()
            .map(OutboxRecord::from_event)
            .collect::<Result<Vec<_>, _>>()?;

        let new_version = order.version() + 1;
        order.set_version(new_version);

        let mut snapshot = order.clone();
        snapshot.clear_pending_events();
        inner.orders.insert(snapshot.id().clone(), snapshot);
        inner.outbox.extend(records);
        Ok(())
    }

    async fn delete(&self, order: &Order) -> Result<(), RepositoryError> {
        self.write().orders.remove(order.id());
        Ok(())
    }
}

#[async_trait]
impl OutboxStore for InMemoryStore {
    async fn claim_batch(
        &self,
        instance_id: &str,
        limit: usize,
    ) -> Result<Vec<OutboxRecord>, OutboxError> {
        let now = Utc::now();
        let lease = chrono::Duration::from_std(self.claim_lease)
            .unwrap_or_else(|_| chrono::Duration::seconds(30));
        let mut inner = self.write();

        let mut claimed = Vec::new();
        for record in inner.outbox.iter_mut() {
            if claimed.len() >= limit {
                break;
            }
            let claimable = record.processed_at.is_none()
                && record.claimed_at.map(|at| now - at > lease).unwrap_or(true);
            if claimable {
                record.claimed_by = Some(instance_id.to_string());
                record.claimed_at = Some(now);
                claimed.push(record.clone());
            }
        }
        Ok(claimed)
    }

    async fn mark_processed(&self, id: EventId) -> Result<(), OutboxError> {
        let mut inner = self.write();
        let record = inner
            .outbox
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(OutboxError::RecordNotFound(id))?;
        record.processed_at = Some(Utc::now());
        Ok(())
    }

    async fn release_claim(&self, id: EventId) -> Result<(), OutboxError> {
        let mut inner = self.write();
        let record = inner
            .outbox
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(OutboxError::RecordNotFound(id))?;
        if record.processed_at.is_none() {
            record.claimed_by = None;
            record.claimed_at = None;
        }
        Ok(())
    }

    async fn unprocessed_count(&self) -> Result<u64, OutboxError> {
        Ok(self
            .read()
            .outbox
            .iter()
            .filter(|r| r.processed_at.is_none())
            .count() as u64)
    }
}
