//! End-to-end pipeline tests over the in-memory store: commands go
//! through the service, the relay drains the outbox and the views
//! catch up.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use app::{
    AddItem, CancelOrder, ConfirmOrder, CreateOrder, MarkDelivered, OrderService,
    SetShippingAddress, ShipOrder,
};
use common::{CustomerId, EventId, OrderId, ProductId};
use domain::{Currency, Money, ShippingAddress};
use outbox::{EventPublisher, OutboxRecord, OutboxRelay, OutboxStore, PublishError, RelayConfig};
use projections::{CustomerOrdersView, EventDispatcher, OrderSummaryView, PublisherBridge};
use store::InMemoryStore;

fn usd(amount: u64) -> Money {
    Money::new(amount, Currency::USD)
}

fn address() -> ShippingAddress {
    ShippingAddress::new("1 Main St", "Springfield", "12345", "US").unwrap()
}

struct Pipeline {
    service: OrderService<InMemoryStore>,
    store: Arc<InMemoryStore>,
    relay: OutboxRelay,
    order_summaries: OrderSummaryView,
    customer_orders: CustomerOrdersView,
}

fn pipeline() -> Pipeline {
    let store = Arc::new(InMemoryStore::new());
    let service = OrderService::new(store.clone());

    let order_summaries = OrderSummaryView::new();
    let customer_orders = CustomerOrdersView::new();
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(Arc::new(order_summaries.clone()));
    dispatcher.register(Arc::new(customer_orders.clone()));
    let bridge = PublisherBridge::new(Arc::new(dispatcher));

    let relay = OutboxRelay::new(
        store.clone(),
        Arc::new(bridge),
        RelayConfig::new("relay-test"),
    );

    Pipeline {
        service,
        store,
        relay,
        order_summaries,
        customer_orders,
    }
}

async fn place_order(service: &OrderService<InMemoryStore>) -> OrderId {
    let order_id = service
        .create_order(CreateOrder::for_customer(
            CustomerId::parse("cust-1").unwrap(),
        ))
        .await
        .unwrap();
    service
        .add_item(AddItem {
            order_id: order_id.clone(),
            product_id: ProductId::parse("SKU-1").unwrap(),
            quantity: 2,
            unit_price: usd(1500),
        })
        .await
        .unwrap();
    service
        .set_shipping_address(SetShippingAddress {
            order_id: order_id.clone(),
            address: address(),
        })
        .await
        .unwrap();
    service
        .confirm_order(ConfirmOrder {
            order_id: order_id.clone(),
        })
        .await
        .unwrap();
    order_id
}

#[tokio::test]
async fn commands_flow_through_to_read_models() {
    let p = pipeline();
    let order_id = place_order(&p.service).await;

    let stats = p.relay.run_cycle().await.unwrap();
    assert_eq!(stats.claimed, 3);
    assert_eq!(stats.published, 3);
    assert_eq!(p.store.unprocessed_count().await.unwrap(), 0);

    let summary = p.order_summaries.get(&order_id).await.unwrap();
    assert_eq!(summary.status, "Confirmed");
    assert_eq!(summary.total_amount, 3000);

    let customer = p
        .customer_orders
        .get_customer(&CustomerId::parse("cust-1").unwrap())
        .await
        .unwrap();
    assert_eq!(customer.total_orders, 1);
    assert_eq!(customer.active_orders, 1);
}

#[tokio::test]
async fn delivery_lifecycle_reaches_customer_stats() {
    let p = pipeline();
    let order_id = place_order(&p.service).await;
    p.service
        .ship_order(ShipOrder {
            order_id: order_id.clone(),
            tracking_number: "TRACK-1".to_string(),
        })
        .await
        .unwrap();
    p.service
        .mark_delivered(MarkDelivered {
            order_id: order_id.clone(),
        })
        .await
        .unwrap();

    p.relay.run_cycle().await.unwrap();

    let summary = p.order_summaries.get(&order_id).await.unwrap();
    assert_eq!(summary.status, "Delivered");
    let customer = p
        .customer_orders
        .get_customer(&CustomerId::parse("cust-1").unwrap())
        .await
        .unwrap();
    assert_eq!(customer.active_orders, 0);
    assert_eq!(customer.delivered_orders, 1);
}

#[tokio::test]
async fn cancelled_order_is_reflected() {
    let p = pipeline();
    let order_id = p
        .service
        .create_order(CreateOrder::for_customer(
            CustomerId::parse("cust-1").unwrap(),
        ))
        .await
        .unwrap();
    p.service
        .cancel_order(CancelOrder {
            order_id: order_id.clone(),
            reason: "customer request".to_string(),
        })
        .await
        .unwrap();

    p.relay.run_cycle().await.unwrap();

    let summary = p.order_summaries.get(&order_id).await.unwrap();
    assert_eq!(summary.status, "Cancelled");
    let customer = p
        .customer_orders
        .get_customer(&CustomerId::parse("cust-1").unwrap())
        .await
        .unwrap();
    assert_eq!(customer.cancelled_orders, 1);
}

#[tokio::test]
async fn failed_save_leaves_no_partial_state() {
    let p = pipeline();
    let order_id = p
        .service
        .create_order(CreateOrder::for_customer(
            CustomerId::parse("cust-1").unwrap(),
        ))
        .await
        .unwrap();
    p.relay.run_cycle().await.unwrap();

    p.store.fail_next_save();
    let result = p
        .service
        .add_item(AddItem {
            order_id: order_id.clone(),
            product_id: ProductId::parse("SKU-1").unwrap(),
            quantity: 1,
            unit_price: usd(500),
        })
        .await;
    assert!(result.is_err());

    // No item snapshot and no outbox row made it out.
    let order = p.service.get_order(&order_id).await.unwrap();
    assert!(order.items().is_empty());
    assert_eq!(p.store.unprocessed_count().await.unwrap(), 0);
}

/// Publisher that fails its first `failures` calls, recording every
/// successful delivery.
struct FlakyPublisher {
    failures: AtomicUsize,
    delivered: Mutex<Vec<EventId>>,
}

#[async_trait]
impl EventPublisher for FlakyPublisher {
    async fn publish(&self, record: &OutboxRecord) -> Result<(), PublishError> {
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(PublishError::new(record.id, "broker unavailable"));
        }
        self.delivered.lock().unwrap().push(record.id);
        Ok(())
    }
}

#[tokio::test]
async fn at_least_once_delivery_across_cycles() {
    let store = Arc::new(InMemoryStore::new());
    let service = OrderService::new(store.clone());
    place_order(&service).await;

    let publisher = Arc::new(FlakyPublisher {
        failures: AtomicUsize::new(2),
        delivered: Mutex::new(Vec::new()),
    });
    let relay = OutboxRelay::new(store.clone(), publisher.clone(), RelayConfig::new("relay-a"));

    let first = relay.run_cycle().await.unwrap();
    assert_eq!(first.failed, 2);
    assert_eq!(first.published, 1);

    let second = relay.run_cycle().await.unwrap();
    assert_eq!(second.published, 2);

    assert_eq!(store.unprocessed_count().await.unwrap(), 0);
    assert_eq!(publisher.delivered.lock().unwrap().len(), 3);
}

struct CountingPublisher {
    delivered: Mutex<Vec<EventId>>,
}

#[async_trait]
impl EventPublisher for CountingPublisher {
    async fn publish(&self, record: &OutboxRecord) -> Result<(), PublishError> {
        self.delivered.lock().unwrap().push(record.id);
        Ok(())
    }
}

#[tokio::test]
async fn concurrent_relays_never_double_publish() {
    let store = Arc::new(InMemoryStore::new());
    let service = OrderService::new(store.clone());
    for _ in 0..5 {
        place_order(&service).await;
    }
    assert_eq!(store.unprocessed_count().await.unwrap(), 15);

    let publisher = Arc::new(CountingPublisher {
        delivered: Mutex::new(Vec::new()),
    });
    let relay_a = OutboxRelay::new(store.clone(), publisher.clone(), RelayConfig::new("relay-a"));
    let relay_b = OutboxRelay::new(store.clone(), publisher.clone(), RelayConfig::new("relay-b"));

    let (a, b) = tokio::join!(relay_a.run_cycle(), relay_b.run_cycle());
    let total = a.unwrap().published + b.unwrap().published;
    assert_eq!(total, 15);

    let delivered = publisher.delivered.lock().unwrap();
    let mut unique: Vec<_> = delivered.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), delivered.len(), "no event published twice");
}

#[tokio::test]
async fn background_relay_drains_continuously() {
    let p = pipeline();
    let mut config = RelayConfig::new("relay-bg");
    config.poll_interval = Duration::from_millis(10);
    let relay = OutboxRelay::new(
        p.store.clone(),
        Arc::new(PublisherBridge::new({
            let mut dispatcher = EventDispatcher::new();
            dispatcher.register(Arc::new(p.order_summaries.clone()));
            Arc::new(dispatcher)
        })),
        config,
    );

    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let handle = tokio::spawn(async move {
        relay
            .run(async {
                let _ = rx.await;
            })
            .await;
    });

    let order_id = place_order(&p.service).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(p.store.unprocessed_count().await.unwrap(), 0);
    assert!(p.order_summaries.get(&order_id).await.is_some());

    tx.send(()).unwrap();
    handle.await.unwrap();
}
