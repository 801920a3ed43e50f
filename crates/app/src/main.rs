//! Outbox worker entry point.
//!
//! Connects to Postgres, wires the relay to the in-process projection
//! dispatcher and drains the outbox until SIGINT or SIGTERM.

use std::sync::Arc;

use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use app::Config;
use outbox::{OutboxRelay, RelayConfig};
use projections::{CustomerOrdersView, EventDispatcher, OrderSummaryView, PublisherBridge};
use store::PostgresStore;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

#[tokio::main]
async fn main() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let store = PostgresStore::connect(&config.database_url)
        .await
        .expect("failed to connect to Postgres")
        .with_claim_lease(config.claim_lease);
    store.run_migrations().await.expect("migrations failed");
    tracing::info!("connected and migrated");

    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(Arc::new(OrderSummaryView::new()));
    dispatcher.register(Arc::new(CustomerOrdersView::new()));
    let bridge = PublisherBridge::new(Arc::new(dispatcher));

    let mut relay_config = RelayConfig::new(config.instance_id.clone());
    relay_config.batch_size = config.batch_size;
    relay_config.poll_interval = config.poll_interval;

    let relay = OutboxRelay::new(Arc::new(store), Arc::new(bridge), relay_config);
    relay.run(shutdown_signal()).await;

    tracing::info!("worker shut down gracefully");
}
