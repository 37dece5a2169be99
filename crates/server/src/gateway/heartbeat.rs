// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background sweep that closes agent connections that have gone quiet
//! past their heartbeat deadline (spec §4.1). The primary enforcement is
//! the per-connection `tokio::time::timeout` in `ws::handle_agent_connection`;
//! this sweep is the belt-and-suspenders backstop for a connection whose
//! read future somehow never completes (e.g. a half-open TCP socket that
//! never sends a FIN).

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::state::AppState;

const SWEEP_INTERVAL: Duration = Duration::from_secs(5);

pub async fn run(state: Arc<AppState>, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(SWEEP_INTERVAL);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => sweep(&state).await,
        }
    }
}

async fn sweep(state: &AppState) {
    for agent_id in state.registry.all_ids().await {
        if !state.registry.is_online(&agent_id).await {
            continue;
        }
        let Some(slot) = state.registry.get(&agent_id).await else { continue };
        let settings = slot.settings.read().await.clone();
        let deadline = state.config.heartbeat_deadline(settings.update_interval_ms);
        let last_seen = *slot.last_seen_at.read().await;

        let overdue = match last_seen {
            Some(last_seen) => Utc::now().signed_duration_since(last_seen).to_std().unwrap_or_default() > deadline,
            None => true,
        };
        if !overdue {
            continue;
        }

        tracing::warn!(agent_id, "heartbeat deadline exceeded, marking offline");
        if let Some(connection) = slot.connection.read().await.as_ref() {
            connection.cancel.cancel();
        }
        state.registry.mark_offline(&agent_id).await;
        let _ = state.storage.systems.mark_status(&agent_id, "offline").await;
        state.aggregator.mark_offline(&agent_id).await;
        state.dispatcher.shutdown_agent(&agent_id).await;
    }
}

#[cfg(test)]
#[path = "heartbeat_tests.rs"]
mod tests;
