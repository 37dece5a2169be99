// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agent and browser WebSocket upgrade handlers (spec §4.1, §4.3, §6).

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;

use pankha_protocol::{parse_agent_frame, parse_browser_frame, AgentInbound, AgentOutbound, BrowserInbound};

use crate::broadcaster::SubscriptionScope;
use crate::gateway::registry::{AgentConnection, AgentSettings};
use crate::state::AppState;

/// Inbound frame larger than this closes the connection as misbehaving.
const MAX_FRAME_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct AgentWsQuery {
    pub token: Option<String>,
}

/// `GET /ws/agent` — upgrade for a device agent's persistent connection.
pub async fn agent_ws_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AgentWsQuery>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_agent_connection(socket, state, query.token))
}

async fn handle_agent_connection(socket: WebSocket, state: Arc<AppState>, query_token: Option<String>) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let first = match ws_rx.next().await {
        Some(Ok(Message::Text(text))) => text,
        _ => return,
    };
    let register = match parse_agent_frame(&first) {
        Ok(AgentInbound::Register(payload)) => payload,
        _ => {
            tracing::warn!("agent connection's first frame was not register, closing");
            let _ = ws_tx.send(Message::Close(None)).await;
            return;
        }
    };

    let agent_id = register.agent_id.clone();

    if let Ok(Some(existing)) = state.storage.systems.get_by_agent_id(&agent_id).await {
        if let (Some(expected), Some(offered)) = (existing.auth_token.as_deref(), query_token.as_deref()) {
            if expected != offered {
                tracing::warn!(agent_id, "auth token mismatch, closing connection");
                let _ = ws_tx.send(Message::Close(None)).await;
                return;
            }
        }
    }

    if let Some(stale_cancel) = state.registry.existing_cancel_token(&agent_id).await {
        stale_cancel.cancel();
    }

    let system = match register_system(&state, &register).await {
        Ok(system) => system,
        Err(error) => {
            tracing::error!(agent_id, %error, "failed to persist agent registration");
            let _ = ws_tx.send(Message::Close(None)).await;
            return;
        }
    };

    let (outbound_tx, mut outbound_rx) = tokio::sync::mpsc::channel::<AgentOutbound>(256);
    let cancel = tokio_util::sync::CancellationToken::new();
    state
        .registry
        .register(
            &agent_id,
            system.id,
            AgentSettings {
                name: system.name.clone(),
                update_interval_ms: system.update_interval_ms,
                fan_step_percent: system.fan_step_percent,
                hysteresis_temp: system.hysteresis_temp,
                emergency_temp: system.emergency_temp,
                failsafe_speed: system.failsafe_speed,
                log_level: system.log_level.clone(),
                enable_fan_control: system.enable_fan_control,
            },
            AgentConnection { outbound_tx: outbound_tx.clone(), cancel: cancel.clone() },
        )
        .await;

    let deadline = state.config.heartbeat_deadline(system.update_interval_ms);
    let _ = outbound_tx.try_send(AgentOutbound::registered());
    tracing::info!(agent_id, "agent registered");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            outbound = outbound_rx.recv() => {
                match outbound {
                    Some(frame) => {
                        let Ok(text) = serde_json::to_string(&frame) else { continue };
                        if ws_tx.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            inbound = tokio::time::timeout(deadline, ws_rx.next()) => {
                match inbound {
                    Err(_) => {
                        tracing::warn!(agent_id, "agent heartbeat deadline exceeded, closing");
                        break;
                    }
                    Ok(Some(Ok(Message::Text(text)))) => {
                        if text.len() > MAX_FRAME_BYTES {
                            tracing::warn!(agent_id, "oversized frame, closing connection");
                            break;
                        }
                        state.registry.touch_seen(&agent_id).await;
                        handle_agent_frame(&state, &agent_id, system.id, &text).await;
                    }
                    Ok(Some(Ok(Message::Close(_)))) | Ok(None) => break,
                    Ok(Some(Err(_))) => break,
                    _ => {}
                }
            }
        }
    }

    state.registry.mark_offline(&agent_id).await;
    let _ = state.storage.systems.mark_status(&agent_id, "offline").await;
    state.aggregator.mark_offline(&agent_id).await;
    state.dispatcher.shutdown_agent(&agent_id).await;
    tracing::info!(agent_id, "agent disconnected");
}

async fn register_system(
    state: &AppState,
    register: &pankha_protocol::RegisterPayload,
) -> Result<pankha_storage::types::System, pankha_storage::StorageError> {
    let system = state
        .storage
        .systems
        .register(pankha_storage::types::NewSystem {
            agent_id: register.agent_id.clone(),
            name: register.name.clone(),
            auth_token: None,
            agent_version: Some(register.agent_version.clone()),
            capabilities: serde_json::to_string(&register.capabilities).unwrap_or_default(),
            update_interval_ms: register.update_interval_ms as i64,
            fan_step_percent: register.fan_step_percent as i64,
            hysteresis_temp: register.hysteresis_temp,
            emergency_temp: register.emergency_temp,
            failsafe_speed: register.failsafe_speed as i64,
            log_level: register.log_level.clone().unwrap_or_else(|| "info".into()),
        })
        .await?;

    for sensor in &register.capabilities.sensors {
        state
            .storage
            .sensors
            .upsert(
                system.id,
                &pankha_storage::types::SensorUpsert {
                    sensor_name: sensor.id.clone(),
                    sensor_label: sensor.label.clone().unwrap_or_else(|| sensor.id.clone()),
                    sensor_type: sensor.sensor_type.clone().unwrap_or_else(|| "other".into()),
                    temp_max: sensor.temp_max,
                    temp_crit: sensor.temp_crit,
                },
            )
            .await?;
    }
    for fan in &register.capabilities.fans {
        state
            .storage
            .fans
            .upsert(
                system.id,
                &pankha_storage::types::FanUpsert {
                    fan_name: fan.id.clone(),
                    fan_label: fan.label.clone().unwrap_or_else(|| fan.id.clone()),
                    min_speed: fan.min_speed as i64,
                    max_speed: fan.max_speed as i64,
                    has_pwm_control: fan.has_pwm_control,
                },
            )
            .await?;
    }

    Ok(system)
}

async fn handle_agent_frame(state: &AppState, agent_id: &str, system_id: i64, text: &str) {
    match parse_agent_frame(text) {
        Ok(AgentInbound::Register(_)) => {
            tracing::debug!(agent_id, "ignoring re-register on an already-open connection");
        }
        Ok(AgentInbound::Data(data)) => {
            state.registry.touch_data_received(agent_id).await;
            if let Err(error) = state.aggregator.ingest(&state.storage, system_id, agent_id, &data).await {
                tracing::error!(agent_id, %error, "failed to ingest agent data frame");
            }
        }
        Ok(AgentInbound::CommandResponse(response)) => {
            state.dispatcher.resolve(agent_id, response).await;
        }
        Err(error) => {
            tracing::debug!(agent_id, %error, "dropping malformed agent frame");
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrowserWsQuery {
    pub token: Option<String>,
}

/// `GET /ws/dashboard` — upgrade for a browser subscriber connection.
pub async fn browser_ws_handler(
    State(state): State<Arc<AppState>>,
    Query(_query): Query<BrowserWsQuery>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_browser_connection(socket, state))
}

const SUBSCRIBER_WRITE_DEADLINE: Duration = Duration::from_secs(5);

async fn handle_browser_connection(socket: WebSocket, state: Arc<AppState>) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let cancel = tokio_util::sync::CancellationToken::new();
    let subscription = state.broadcaster.connect(Arc::clone(&state.aggregator), SubscriptionScope::All, cancel.clone());

    loop {
        tokio::select! {
            outbound = subscription.outbound.recv() => {
                match outbound {
                    Some(frame) => {
                        let Ok(text) = serde_json::to_string(&frame) else { continue };
                        let send = ws_tx.send(Message::Text(text.into()));
                        if tokio::time::timeout(SUBSCRIBER_WRITE_DEADLINE, send).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            inbound = ws_rx.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => handle_browser_frame(&subscription, &state, &text).await,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }

    cancel.cancel();
}

async fn handle_browser_frame(subscription: &crate::broadcaster::Subscription, state: &AppState, text: &str) {
    match parse_browser_frame(text) {
        Ok(BrowserInbound::Subscribe { agent_id }) => {
            let scope = if agent_id == "all" { SubscriptionScope::All } else { SubscriptionScope::Agent(agent_id) };
            subscription.set_scope(scope).await;
            subscription.full_sync(&state.aggregator).await;
        }
        Ok(BrowserInbound::Unsubscribe) => {
            subscription.set_scope(SubscriptionScope::All).await;
        }
        Ok(BrowserInbound::RequestFullSync) => {
            subscription.full_sync(&state.aggregator).await;
        }
        Err(error) => {
            tracing::debug!(%error, "dropping malformed browser frame");
        }
    }
}

#[cfg(test)]
#[path = "ws_tests.rs"]
mod tests;
