use criterion::{Criterion, criterion_group, criterion_main};
use domain::{Currency, CustomerId, Money, Order, ProductId, Quantity, ShippingAddress};

fn usd(amount: u64) -> Money {
    Money::new(amount, Currency::USD)
}

fn customer() -> CustomerId {
    CustomerId::parse("bench-customer").unwrap()
}

fn bench_create_order(c: &mut Criterion) {
    c.bench_function("domain/create_order", |b| {
        b.iter(|| Order::create(customer()));
    });
}

fn bench_add_item(c: &mut Criterion) {
    let product = ProductId::parse("SKU-BENCH").unwrap();
    c.bench_function("domain/add_item", |b| {
        b.iter(|| {
            let mut order = Order::create(customer());
            order.add_item(product.clone(), 1, usd(1000)).unwrap();
        });
    });
}

fn bench_full_lifecycle(c: &mut Criterion) {
    let address = ShippingAddress::new("1 Main St", "Springfield", "12345", "US").unwrap();
    c.bench_function("domain/full_create_confirm_ship", |b| {
        b.iter(|| {
            let mut order = Order::create(customer());
            order
                .add_item(ProductId::parse("SKU-001").unwrap(), 2, usd(1000))
                .unwrap();
            order.set_shipping_address(address.clone()).unwrap();
            order.confirm().unwrap();
            order.ship("TRACK-BENCH").unwrap();
        });
    });
}

fn bench_total_50_items(c: &mut Criterion) {
    let mut order = Order::create(customer());
    for n in 0..50 {
        order
            .add_item(
                ProductId::parse(&format!("SKU-{n:03}")).unwrap(),
                1,
                usd(100 * (n as u64 + 1)),
            )
            .unwrap();
    }

    c.bench_function("domain/total_50_items", |b| {
        b.iter(|| order.total());
    });
}

fn bench_event_serialization(c: &mut Criterion) {
    let mut order = Order::create(customer());
    for n in 0..10 {
        order
            .add_item(
                ProductId::parse(&format!("SKU-{n:03}")).unwrap(),
                Quantity::new(2).unwrap().get(),
                usd(500),
            )
            .unwrap();
    }
    let events = order.pending_events().to_vec();

    c.bench_function("domain/serialize_11_events", |b| {
        b.iter(|| {
            for event in &events {
                serde_json::to_string(event).unwrap();
            }
        });
    });
}

criterion_group!(
    benches,
    bench_create_order,
    bench_add_item,
    bench_full_lifecycle,
    bench_total_50_items,
    bench_event_serialization,
);
criterion_main!(benches);
