//! Ledger daemon.
//!
//! Loads configuration, connects to PostgreSQL, applies pending migrations,
//! wires the ledger services to the event channel and relays committed
//! domain events as topic strings until shutdown.

use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use sea_orm_migration::MigratorTrait;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coopledger_core::events::{ChannelPublisher, DomainEvent};
use coopledger_db::migration::Migrator;
use coopledger_db::{LedgerServices, PostingOptions, connect_with};
use coopledger_shared::AppConfig;
use coopledger_shared::config::LoggingConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config.logging);

    let db = connect_with(&config.database)
        .await
        .context("failed to connect to database")?;
    info!(max_connections = config.database.max_connections, "Connected to database");

    Migrator::up(&db, None).await.context("failed to apply migrations")?;
    info!("Migrations applied");

    let options = PostingOptions::from(&config.ledger);
    info!(
        lock_timeout_ms = options.lock_timeout.as_millis(),
        max_retries = options.max_retries,
        tolerance = %config.ledger.batch_tolerance,
        "Ledger configured"
    );

    let (publisher, receiver) = ChannelPublisher::channel(config.events.channel_capacity);
    let services = LedgerServices::new(&db, options, config.ledger.batch_tolerance, Arc::new(publisher));
    let relayed = relay(receiver, shutdown_signal()).await;

    drop(services);
    db.close().await.context("failed to close database pool")?;
    info!(relayed, "Shutdown complete");
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "coopledger=debug,ledgerd=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if logging.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for ctrl-c");
    }
    info!("Shutdown signal received");
}

/// Drains the event channel until `shutdown` resolves or every publisher is
/// gone, logging every topic. Returns the number of events relayed.
async fn relay(mut receiver: mpsc::Receiver<DomainEvent>, shutdown: impl Future<Output = ()>) -> u64 {
    tokio::pin!(shutdown);
    let mut relayed: u64 = 0;
    loop {
        tokio::select! {
            event = receiver.recv() => {
                let Some(event) = event else { break };
                for topic in event.topics() {
                    debug!(topic = %topic, "Relaying event");
                }
                relayed += 1;
            }
            () = &mut shutdown => break,
        }
    }
    relayed
}
