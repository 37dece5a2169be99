// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pankha: central server for a distributed hardware-cooling control plane.

pub mod aggregator;
pub mod broadcaster;
pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod gateway;
pub mod http;
pub mod license;
pub mod state;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;
use crate::http::build_router;
use crate::license::{HttpLicenseValidator, UnlimitedValidator};
use crate::state::AppState;
use pankha_storage::Storage;

/// Run the pankha server until shutdown.
pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let shutdown = CancellationToken::new();

    let storage = Storage::open(&config.db_path).await?;
    let state = Arc::new(AppState::new(storage.clone(), config.clone(), shutdown.clone()));

    let license_key = config.license_key.clone().unwrap_or_default();
    let boot_result = match &config.license_validator_url {
        Some(url) => state.license.boot_load(&storage, &HttpLicenseValidator::new(url.clone()), &license_key).await,
        None => state.license.boot_load(&storage, &UnlimitedValidator, &license_key).await,
    };
    if let Err(error) = boot_result {
        tracing::warn!(%error, "license boot-load failed, continuing without a cached license");
    }

    if let Some(history_rx) = state.aggregator.take_history_receiver().await {
        tokio::spawn(crate::aggregator::history_writer::run(history_rx, storage.clone(), shutdown.clone()));
    }
    tokio::spawn(crate::controller::run(Arc::clone(&state), shutdown.clone()));
    tokio::spawn(crate::gateway::heartbeat::run(Arc::clone(&state), shutdown.clone()));

    tracing::info!("pankha server listening on {addr}");
    let router = build_router(Arc::clone(&state));
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;

    Ok(())
}
