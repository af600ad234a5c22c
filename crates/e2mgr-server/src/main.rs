// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! E2 Manager - RAN connection lifecycle server
//!
//! An HTTP server responsible for:
//! - X2 and EN-DC setup requests (instance selection, association, dispatch)
//! - The big red button (shut down every RAN connection)
//! - Read-only views over RANs and the termination-instance pool

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use e2mgr_core::E2Manager;
use e2mgr_core::bus::TcpBusSender;
use e2mgr_core::config::Config;
use e2mgr_core::routing::{DEFAULT_TIMEOUT, RoutingManagerClient};
use e2mgr_core::setup_message::SetupPdus;
use e2mgr_core::store::{MemoryStore, RanStore, RetryingStore, SqliteStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "e2mgr_core=info,e2mgr_server=info".into()),
        )
        .init();

    // Load .env file if present
    if let Err(e) = dotenvy::dotenv() {
        warn!("No .env file loaded: {}", e);
    }

    let config = Config::from_env().context("Failed to load configuration")?;

    info!(
        http_addr = %config.http_addr,
        bus_addr = %config.bus_addr,
        routing_manager_url = %config.routing_manager_url,
        max_store_attempts = config.max_store_attempts,
        grace_period_secs = config.shutdown_grace_period.as_secs(),
        "Starting E2 Manager"
    );

    let backend: Arc<dyn RanStore> = if config.uses_memory_store() {
        info!("Using in-process store, state is lost on exit");
        Arc::new(MemoryStore::new())
    } else {
        let store = SqliteStore::connect(&config.database_url)
            .await
            .context("Failed to open store")?;
        info!("Connected to database");
        Arc::new(store)
    };
    let store: Arc<dyn RanStore> = Arc::new(RetryingStore::new(backend, config.retry_policy()));

    let registrar = Arc::new(RoutingManagerClient::new(
        config.routing_manager_url.clone(),
        DEFAULT_TIMEOUT,
    )?);
    let sender = Arc::new(TcpBusSender::new(config.bus_addr.clone()));
    let pdus = SetupPdus::new(config.x2_setup_pdu.clone(), config.endc_setup_pdu.clone());

    let manager = Arc::new(E2Manager::new(
        store,
        registrar,
        sender,
        pdus,
        config.shutdown_grace_period,
    ));

    let listener = TcpListener::bind(config.http_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.http_addr))?;

    info!(addr = %config.http_addr, "HTTP server ready");

    axum::serve(listener, e2mgr_server::router(manager))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("E2 Manager shut down");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown signal received");
}
