use event_bus::{EventBus, InMemoryBus, NatsBus, StreamSpec};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use profiles_rs::{
    app::service_registry,
    config::{BusType, Config},
    db::init_databases,
    outbox::{OutboxDispatcher, OutboxNotifier},
    routes,
};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file (if present)
    dotenvy::dotenv().ok();

    // Initialize tracing/logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    tracing::info!("Starting profiles service...");

    let config = Config::from_env().expect("Failed to load configuration from environment");

    tracing::info!(
        host = %config.host,
        port = config.port,
        bus_type = ?config.bus_type,
        exchange = %config.broker_exchange,
        "Configuration loaded"
    );

    // Database connection + migrations for both stores
    tracing::info!("Connecting to databases...");
    let databases = init_databases(&config.database_url, &config.read_database_url)
        .await
        .expect("Failed to initialize databases");

    let bus: Arc<dyn EventBus> = match config.bus_type {
        BusType::InMemory => {
            tracing::info!("Using InMemory event bus");
            Arc::new(InMemoryBus::new())
        }
        BusType::Nats => {
            tracing::info!(nats_url = %config.nats_url, "Connecting to NATS");
            let client = async_nats::connect(&config.nats_url)
                .await
                .expect("Failed to connect to NATS");
            let bus = NatsBus::durable(client, StreamSpec::for_exchange(&config.broker_exchange))
                .await
                .expect("Failed to set up JetStream stream");
            Arc::new(bus)
        }
    };

    let registry = service_registry(
        &databases.write,
        &databases.read,
        bus,
        &config.broker_exchange,
    )
    .expect("Failed to register outbox handlers");

    // No producer in this binary writes doctors, so nothing pings the
    // notifier here; records committed elsewhere are found by the poll.
    let notifier = OutboxNotifier::new();
    let dispatcher = OutboxDispatcher::new(
        databases.write.clone(),
        Arc::new(registry),
        notifier,
        config.outbox.clone(),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let dispatcher_handle = tokio::spawn(dispatcher.run(shutdown_rx));

    let app = routes::router(databases.write.clone(), databases.read.clone());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Invalid HOST/PORT");
    tracing::info!("Profiles service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutdown signal received");
        })
        .await
        .expect("Server failed to start");

    // Let the dispatcher finish its current cycle.
    let _ = shutdown_tx.send(true);
    match dispatcher_handle.await {
        Ok(summary) => tracing::info!(
            cycles = summary.cycles,
            failed_cycles = summary.failed_cycles,
            "Outbox dispatcher drained"
        ),
        Err(e) => tracing::error!(error = %e, "Outbox dispatcher task failed"),
    }

    tracing::info!("Profiles service stopped");
}
