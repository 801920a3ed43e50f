//! Postgres-backed store.
//!
//! The aggregate snapshot lives in `orders` and `order_items`; events
//! land in `outbox` within the same transaction as the snapshot.
//! Version checks use `SELECT ... FOR UPDATE`, batch claiming uses
//! `FOR UPDATE SKIP LOCKED` so concurrent relays never block on each
//! other.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use uuid::Uuid;

use common::{CustomerId, EventId, OrderId, ProductId};
use domain::{
    Currency, Money, Order, OrderItem, OrderRepository, OrderStatus, Quantity, RepositoryError,
    ShippingAddress,
};
use outbox::{OutboxError, OutboxRecord, OutboxStore};

use crate::DEFAULT_CLAIM_LEASE;

/// Rows that cannot be mapped back into domain types.
#[derive(Debug, thiserror::Error)]
#[error("corrupt row in {table}: {detail}")]
struct CorruptRow {
    table: &'static str,
    detail: String,
}

fn corrupt(table: &'static str, detail: impl std::fmt::Display) -> CorruptRow {
    CorruptRow {
        table,
        detail: detail.to_string(),
    }
}

/// Production store over a Postgres connection pool.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
    claim_lease: Duration,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            claim_lease: DEFAULT_CLAIM_LEASE,
        }
    }

    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub fn with_claim_lease(mut self, lease: Duration) -> Self {
        self.claim_lease = lease;
        self
    }

    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn order_from_rows(
        order_row: &PgRow,
        item_rows: &[PgRow],
    ) -> Result<Order, RepositoryError> {
        let id: String = order_row.try_get("id").map_err(RepositoryError::storage)?;
        let customer_id: String = order_row
            .try_get("customer_id")
            .map_err(RepositoryError::storage)?;
        let status: String = order_row
            .try_get("status")
            .map_err(RepositoryError::storage)?;
        let shipping_address: Option<serde_json::Value> = order_row
            .try_get("shipping_address")
            .map_err(RepositoryError::storage)?;
        let created_at: DateTime<Utc> = order_row
            .try_get("created_at")
            .map_err(RepositoryError::storage)?;
        let confirmed_at: Option<DateTime<Utc>> = order_row
            .try_get("confirmed_at")
            .map_err(RepositoryError::storage)?;
        let version: i64 = order_row
            .try_get("version")
            .map_err(RepositoryError::storage)?;

        let status = OrderStatus::parse(&status)
            .ok_or_else(|| RepositoryError::storage(corrupt("orders", format!("status {status:?}"))))?;
        let shipping_address = shipping_address
            .map(serde_json::from_value::<ShippingAddress>)
            .transpose()?;

        let mut items = Vec::with_capacity(item_rows.len());
        for row in item_rows {
            items.push(Self::item_from_row(row)?);
        }

        Ok(Order::rehydrate(
            OrderId::parse(&id).map_err(RepositoryError::storage)?,
            CustomerId::parse(&customer_id).map_err(RepositoryError::storage)?,
            items,
            status,
            shipping_address,
            created_at,
            confirmed_at,
            version,
        ))
    }

    fn item_from_row(row: &PgRow) -> Result<OrderItem, RepositoryError> {
        let item_id: String = row.try_get("item_id").map_err(RepositoryError::storage)?;
        let product_id: String = row
            .try_get("product_id")
            .map_err(RepositoryError::storage)?;
        let quantity: i32 = row.try_get("quantity").map_err(RepositoryError::storage)?;
        let amount: i64 = row
            .try_get("unit_price_amount")
            .map_err(RepositoryError::storage)?;
        let currency: String = row.try_get("currency").map_err(RepositoryError::storage)?;

        let quantity = u32::try_from(quantity)
            .ok()
            .and_then(|q| Quantity::new(q).ok())
            .ok_or_else(|| {
                RepositoryError::storage(corrupt("order_items", format!("quantity {quantity}")))
            })?;
        let amount = u64::try_from(amount).map_err(|_| {
            RepositoryError::storage(corrupt("order_items", format!("amount {amount}")))
        })?;
        let currency = Currency::new(&currency).map_err(RepositoryError::storage)?;

        Ok(OrderItem::rehydrate(
            item_id,
            ProductId::parse(&product_id).map_err(RepositoryError::storage)?,
            quantity,
            Money::new(amount, currency),
        ))
    }

    fn record_from_row(row: &PgRow) -> Result<OutboxRecord, OutboxError> {
        let id: Uuid = row.try_get("id").map_err(OutboxError::storage)?;
        let order_id: String = row.try_get("order_id").map_err(OutboxError::storage)?;
        Ok(OutboxRecord {
            id: EventId::from_uuid(id),
            order_id: OrderId::parse(&order_id).map_err(OutboxError::storage)?,
            event_type: row.try_get("event_type").map_err(OutboxError::storage)?,
            payload: row.try_get("payload").map_err(OutboxError::storage)?,
            created_at: row.try_get("created_at").map_err(OutboxError::storage)?,
            processed_at: row.try_get("processed_at").map_err(OutboxError::storage)?,
            claimed_by: row.try_get("claimed_by").map_err(OutboxError::storage)?,
            claimed_at: row.try_get("claimed_at").map_err(OutboxError::storage)?,
        })
    }
}

#[async_trait]
impl OrderRepository for PostgresStore {
    #[tracing::instrument(skip(self))]
    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        let order_row = sqlx::query(
            "SELECT id, customer_id, status, shipping_address, created_at, confirmed_at, version \
             FROM orders WHERE id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::storage)?;

        let Some(order_row) = order_row else {
            return Ok(None);
        };

        let item_rows = sqlx::query(
            "SELECT item_id, product_id, quantity, unit_price_amount, currency \
             FROM order_items WHERE order_id = $1 ORDER BY position",
        )
        .bind(id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::storage)?;

        Self::order_from_rows(&order_row, &item_rows).map(Some)
    }

    #[tracing::instrument(skip(self, order), fields(order_id = %order.id()))]
    async fn save(&self, order: &mut Order) -> Result<(), RepositoryError> {
        let records = order
            .pending_events()
            .iter()
            .map(OutboxRecord::from_event)
            .collect::<Result<Vec<_>, _>>()?;
        let shipping_address = order
            .shipping_address()
            .map(serde_json::to_value)
            .transpose()?;

        let mut tx = self.pool.begin().await.map_err(RepositoryError::storage)?;

        let current: Option<i64> =
            sqlx::query_scalar("SELECT version FROM orders WHERE id = $1 FOR UPDATE")
                .bind(order.id().as_str())
                .fetch_optional(&mut *tx)
                .await
                .map_err(RepositoryError::storage)?;

        let expected = order.version();
        let actual = current.unwrap_or(0);
        if actual != expected {
            return Err(RepositoryError::ConcurrencyConflict {
                order_id: order.id().clone(),
                expected,
                actual,
            });
        }
        let new_version = expected + 1;

        sqlx::query(
            "INSERT INTO orders (id, customer_id, status, shipping_address, created_at, confirmed_at, version) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (id) DO UPDATE SET \
                 status = EXCLUDED.status, \
                 shipping_address = EXCLUDED.shipping_address, \
                 confirmed_at = EXCLUDED.confirmed_at, \
                 version = EXCLUDED.version",
        )
        .bind(order.id().as_str())
        .bind(order.customer_id().as_str())
        .bind(order.status().as_str())
        .bind(&shipping_address)
        .bind(order.created_at())
        .bind(order.confirmed_at())
        .bind(new_version)
        .execute(&mut *tx)
        .await
        .map_err(RepositoryError::storage)?;

        // Line items are replaced wholesale so removals need no diff.
        sqlx::query("DELETE FROM order_items WHERE order_id = $1")
            .bind(order.id().as_str())
            .execute(&mut *tx)
            .await
            .map_err(RepositoryError::storage)?;

        for (position, item) in order.items().iter().enumerate() {
            sqlx::query(
                "INSERT INTO order_items \
                     (item_id, order_id, product_id, quantity, unit_price_amount, currency, position) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(item.item_id())
            .bind(order.id().as_str())
            .bind(item.product_id().as_str())
            .bind(item.quantity().get() as i32)
            .bind(item.unit_price().amount() as i64)
            .bind(item.unit_price().currency().as_str())
            .bind(position as i32)
            .execute(&mut *tx)
            .await
            .map_err(RepositoryError::storage)?;
        }

        for record in &records {
            sqlx::query(
                "INSERT INTO outbox (id, order_id, event_type, payload, created_at) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(record.id.as_uuid())
            .bind(record.order_id.as_str())
            .bind(&record.event_type)
            .bind(&record.payload)
            .bind(record.created_at)
            .execute(&mut *tx)
            .await
            .map_err(RepositoryError::storage)?;
        }

        tx.commit().await.map_err(RepositoryError::storage)?;
        order.set_version(new_version);
        Ok(())
    }

    #[tracing::instrument(skip(self, order), fields(order_id = %order.id()))]
    async fn delete(&self, order: &Order) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(order.id().as_str())
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::storage)?;
        Ok(())
    }
}

#[async_trait]
impl OutboxStore for PostgresStore {
    #[tracing::instrument(skip(self))]
    async fn claim_batch(
        &self,
        instance_id: &str,
        limit: usize,
    ) -> Result<Vec<OutboxRecord>, OutboxError> {
        let rows = sqlx::query(
            "WITH claimable AS ( \
                 SELECT id FROM outbox \
                 WHERE processed_at IS NULL \
                   AND (claimed_at IS NULL OR claimed_at < now() - make_interval(secs => $3)) \
                 ORDER BY created_at \
                 LIMIT $2 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             UPDATE outbox SET claimed_by = $1, claimed_at = now() \
             WHERE id IN (SELECT id FROM claimable) \
             RETURNING id, order_id, event_type, payload, created_at, processed_at, claimed_by, claimed_at",
        )
        .bind(instance_id)
        .bind(limit as i64)
        .bind(self.claim_lease.as_secs_f64())
        .fetch_all(&self.pool)
        .await
        .map_err(OutboxError::storage)?;

        let mut records = rows
            .iter()
            .map(Self::record_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        // RETURNING gives no ordering guarantee.
        records.sort_by_key(|r| r.created_at);
        Ok(records)
    }

    async fn mark_processed(&self, id: EventId) -> Result<(), OutboxError> {
        let result = sqlx::query("UPDATE outbox SET processed_at = now() WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(OutboxError::storage)?;
        if result.rows_affected() == 0 {
            return Err(OutboxError::RecordNotFound(id));
        }
        Ok(())
    }

    async fn release_claim(&self, id: EventId) -> Result<(), OutboxError> {
        let result = sqlx::query(
            "UPDATE outbox SET claimed_by = NULL, claimed_at = NULL \
             WHERE id = $1 AND processed_at IS NULL",
        )
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(OutboxError::storage)?;
        if result.rows_affected() == 0 {
            // Already processed or unknown; either way nothing to do
            // for an already-processed record.
            let exists: Option<Uuid> = sqlx::query_scalar("SELECT id FROM outbox WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(OutboxError::storage)?;
            if exists.is_none() {
                return Err(OutboxError::RecordNotFound(id));
            }
        }
        Ok(())
    }

    async fn unprocessed_count(&self) -> Result<u64, OutboxError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM outbox WHERE processed_at IS NULL")
            .fetch_one(&self.pool)
            .await
            .map_err(OutboxError::storage)?;
        Ok(count as u64)
    }
}
