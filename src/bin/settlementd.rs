//! Settlement ledger service.
//!
//! Loads configuration, wires the selected storage backend into the
//! application services and serves the REST API until interrupted.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tbill_ledger::api::rest::{AppState, cors_layer, create_router};
use tbill_ledger::application::services::{SettlementEngine, TradeEntryService};
use tbill_ledger::config::{AppConfig, StorageBackend};
use tbill_ledger::domain::value_objects::Timestamp;
use tbill_ledger::infrastructure::persistence::in_memory::{
    InMemorySettlementLedger, InMemoryTradeLedger,
};
use tbill_ledger::infrastructure::persistence::SequenceIdAllocator;
use tbill_ledger::infrastructure::persistence::postgres::PostgresStore;
use tbill_ledger::telemetry::init_logging;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "SETTLEMENT_CONFIG")]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = AppConfig::load(args.config.as_deref()).context("loading configuration")?;
    init_logging(
        env!("CARGO_PKG_NAME"),
        config.logging.format,
        &config.logging.level,
    )?;
    info!(version = env!("CARGO_PKG_VERSION"), "starting settlementd");

    let (engine, trades) = build_services(&config).await?;
    let sweeper = spawn_recovery_sweeper(engine.clone(), &config);

    let state = Arc::new(AppState { engine, trades });
    let router = create_router(state).layer(cors_layer(&config.server.cors_origins));

    let listener = TcpListener::bind(config.server.bind_address)
        .await
        .with_context(|| format!("binding {}", config.server.bind_address))?;
    info!(address = %config.server.bind_address, "HTTP server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    if let Some(handle) = sweeper {
        handle.abort();
    }
    info!("settlementd stopped");
    Ok(())
}

async fn build_services(config: &AppConfig) -> Result<(SettlementEngine, TradeEntryService)> {
    let settings = config.engine.settings();

    match config.database.backend {
        StorageBackend::Memory => {
            warn!("using in-memory ledgers, data is lost on exit");
            let trades = Arc::new(InMemoryTradeLedger::new());
            let settlements = Arc::new(InMemorySettlementLedger::new());
            let ids = Arc::new(SequenceIdAllocator::new());

            let engine = SettlementEngine::new(trades.clone(), settlements, ids.clone())
                .with_settings(settings);
            Ok((engine, TradeEntryService::new(trades, ids)))
        }
        StorageBackend::Postgres => {
            let url = config
                .database
                .url
                .as_deref()
                .context("database.url is required for the postgres backend")?;
            let store = PostgresStore::connect(url, config.database.max_connections)
                .await
                .context("connecting to PostgreSQL")?;
            if config.database.run_migrations {
                store.run_migrations().await.context("running migrations")?;
            }

            let store = Arc::new(store);
            let engine = SettlementEngine::new(store.clone(), store.clone(), store.clone())
                .with_atomic_writer(store.clone())
                .with_settings(settings);
            Ok((engine, TradeEntryService::new(store.clone(), store)))
        }
    }
}

fn spawn_recovery_sweeper(engine: SettlementEngine, config: &AppConfig) -> Option<JoinHandle<()>> {
    let Some(interval) = config.engine.recovery_interval() else {
        info!("pending settlement recovery disabled");
        return None;
    };
    let grace_secs = i64::try_from(config.engine.recovery_grace_secs).unwrap_or(i64::MAX);

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let cutoff = Timestamp::now().sub_secs(grace_secs);
            match engine.recover_pending(cutoff).await {
                Ok(0) => {}
                Ok(count) => info!(count, "recovered abandoned settlements"),
                Err(e) => error!(error = %e, "recovery sweep failed"),
            }
        }
    }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received");
}
