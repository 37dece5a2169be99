// SPDX-License-Identifier: MIT OR Apache-2.0

//! System listing/detail and the optimistic single-field setters (spec §4.2,
//! §6). Each setter writes storage, updates the in-memory registry mirror,
//! and dispatches the matching command to the agent — in that order, so a
//! reconnect sees the new value even before the agent acknowledges.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use pankha_protocol::command::{
    OutboundCommand, Priority, SetAgentNamePayload, SetEmergencyTempPayload, SetEnableFanControlPayload,
    SetFailsafeSpeedPayload, SetFanSpeedPayload, SetFanStepPayload, SetHysteresisPayload, SetLogLevelPayload,
    SetUpdateIntervalPayload, SelfUpdatePayload, RescanSensorsPayload,
};

use crate::error::{PankhaError, ServerResult};
use crate::http::{check_writable, load_system};
use crate::state::AppState;

const ALLOWED_FAN_STEPS: &[i64] = &[3, 5, 10, 15, 25, 50, 100];

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub connected_agents: usize,
}

/// `GET /api/health` — unauthenticated liveness probe.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let connected_agents = state.registry.all_ids().await.len();
    Json(HealthResponse { status: "ok", connected_agents })
}

#[derive(Debug, Serialize)]
pub struct SystemSummary {
    pub id: i64,
    pub agent_id: String,
    pub name: String,
    pub status: String,
    pub online: bool,
    pub read_only: bool,
    pub update_interval_ms: i64,
    pub fan_step_percent: i64,
    pub hysteresis_temp: f64,
    pub emergency_temp: f64,
    pub failsafe_speed: i64,
    pub log_level: String,
    pub enable_fan_control: bool,
    pub last_seen_at: Option<String>,
}

/// `GET /api/systems` — list with real-time status and tier-derived read-only flag.
pub async fn list_systems(State(state): State<Arc<AppState>>) -> ServerResult<Json<Vec<SystemSummary>>> {
    let systems = state.storage.systems.list().await?;
    let admission_order = state.storage.systems.admission_order().await?;
    let agent_limit = state.license.agent_limit().await;
    let read_only = crate::gateway::registry::AgentRegistry::read_only_status(&admission_order, agent_limit);

    let mut summaries = Vec::with_capacity(systems.len());
    for system in systems {
        let online = state.registry.is_online(&system.agent_id).await;
        summaries.push(SystemSummary {
            id: system.id,
            read_only: read_only.get(&system.agent_id).copied().unwrap_or(false),
            agent_id: system.agent_id,
            name: system.name,
            status: system.status,
            online,
            update_interval_ms: system.update_interval_ms,
            fan_step_percent: system.fan_step_percent,
            hysteresis_temp: system.hysteresis_temp,
            emergency_temp: system.emergency_temp,
            failsafe_speed: system.failsafe_speed,
            log_level: system.log_level,
            enable_fan_control: system.enable_fan_control,
            last_seen_at: system.last_seen_at,
        });
    }
    Ok(Json(summaries))
}

#[derive(Debug, Serialize)]
pub struct SensorView {
    pub id: i64,
    pub sensor_name: String,
    pub sensor_label: String,
    pub sensor_type: String,
    pub current_temp: Option<f64>,
    pub is_hidden: bool,
}

#[derive(Debug, Serialize)]
pub struct FanView {
    pub id: i64,
    pub fan_name: String,
    pub fan_label: String,
    pub current_rpm: i64,
    pub current_speed: i64,
    pub min_speed: i64,
    pub max_speed: i64,
    pub has_pwm_control: bool,
    pub enabled: bool,
    pub control_state: String,
}

#[derive(Debug, Serialize)]
pub struct SystemDetail {
    #[serde(flatten)]
    pub summary: SystemSummary,
    pub sensors: Vec<SensorView>,
    pub fans: Vec<FanView>,
}

/// `GET /api/systems/:id` — details with sensors, fans, and each fan's
/// control state from the controller's state machine.
pub async fn get_system(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> ServerResult<Json<SystemDetail>> {
    let system = load_system(&state.storage, id).await?;
    let admission_order = state.storage.systems.admission_order().await?;
    let agent_limit = state.license.agent_limit().await;
    let read_only = crate::gateway::registry::AgentRegistry::read_only_status(&admission_order, agent_limit)
        .get(&system.agent_id)
        .copied()
        .unwrap_or(false);
    let online = state.registry.is_online(&system.agent_id).await;

    let sensors = state
        .storage
        .sensors
        .list_for_system(system.id)
        .await?
        .into_iter()
        .map(|s| SensorView {
            id: s.id,
            sensor_name: s.sensor_name,
            sensor_label: s.sensor_label,
            sensor_type: s.sensor_type,
            current_temp: s.current_temp,
            is_hidden: s.is_hidden,
        })
        .collect();

    let mut fans = Vec::new();
    for fan in state.storage.fans.list_for_system(system.id).await? {
        let control_state = state.controller_state.state_of(fan.id).await;
        fans.push(FanView {
            id: fan.id,
            fan_name: fan.fan_name,
            fan_label: fan.fan_label,
            current_rpm: fan.current_rpm,
            current_speed: fan.current_speed,
            min_speed: fan.min_speed,
            max_speed: fan.max_speed,
            has_pwm_control: fan.has_pwm_control,
            enabled: fan.enabled,
            control_state: control_state.as_str().to_string(),
        });
    }

    Ok(Json(SystemDetail {
        summary: SystemSummary {
            id: system.id,
            agent_id: system.agent_id,
            name: system.name,
            status: system.status,
            online,
            read_only,
            update_interval_ms: system.update_interval_ms,
            fan_step_percent: system.fan_step_percent,
            hysteresis_temp: system.hysteresis_temp,
            emergency_temp: system.emergency_temp,
            failsafe_speed: system.failsafe_speed,
            log_level: system.log_level,
            enable_fan_control: system.enable_fan_control,
            last_seen_at: system.last_seen_at,
        },
        sensors,
        fans,
    }))
}

#[derive(Debug, Deserialize)]
pub struct NameRequest {
    pub name: String,
}

/// `PUT /api/systems/:id/name`
pub async fn put_name(State(state): State<Arc<AppState>>, Path(id): Path<i64>, Json(body): Json<NameRequest>) -> ServerResult<Json<SystemSummary>> {
    let system = load_system(&state.storage, id).await?;
    check_writable(&state, &system.agent_id).await?;

    state.storage.systems.rename(&system.agent_id, &body.name).await?;
    state.registry.update_settings(&system.agent_id, |s| s.name = body.name.clone()).await;
    state.aggregator.notify_name_changed(&system.agent_id, &body.name);
    state
        .dispatcher
        .dispatch(&system.agent_id, OutboundCommand::SetAgentName(SetAgentNamePayload { name: body.name }), Priority::Normal)
        .await;

    refresh_summary(&state, id).await
}

#[derive(Debug, Deserialize)]
pub struct FanStepRequest {
    pub fan_step_percent: i64,
}

/// `PUT /api/systems/:id/fan-step`
pub async fn put_fan_step(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<FanStepRequest>,
) -> ServerResult<Json<SystemSummary>> {
    if !ALLOWED_FAN_STEPS.contains(&body.fan_step_percent) {
        return Err(PankhaError::validation(format!("fan_step_percent must be one of {ALLOWED_FAN_STEPS:?}")));
    }
    let system = load_system(&state.storage, id).await?;
    check_writable(&state, &system.agent_id).await?;

    state.storage.systems.set_fan_step_percent(&system.agent_id, body.fan_step_percent).await?;
    state.registry.update_settings(&system.agent_id, |s| s.fan_step_percent = body.fan_step_percent).await;
    state
        .dispatcher
        .dispatch(
            &system.agent_id,
            OutboundCommand::SetFanStep(SetFanStepPayload { fan_step_percent: body.fan_step_percent as u8 }),
            Priority::Normal,
        )
        .await;

    refresh_summary(&state, id).await
}

#[derive(Debug, Deserialize)]
pub struct HysteresisRequest {
    pub hysteresis_temp: f64,
}

/// `PUT /api/systems/:id/hysteresis`
pub async fn put_hysteresis(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<HysteresisRequest>,
) -> ServerResult<Json<SystemSummary>> {
    if body.hysteresis_temp < 0.0 {
        return Err(PankhaError::validation("hysteresis_temp cannot be negative"));
    }
    let system = load_system(&state.storage, id).await?;
    check_writable(&state, &system.agent_id).await?;

    state.storage.systems.set_hysteresis_temp(&system.agent_id, body.hysteresis_temp).await?;
    state.registry.update_settings(&system.agent_id, |s| s.hysteresis_temp = body.hysteresis_temp).await;
    state
        .dispatcher
        .dispatch(&system.agent_id, OutboundCommand::SetHysteresis(SetHysteresisPayload { hysteresis_temp: body.hysteresis_temp }), Priority::Normal)
        .await;

    refresh_summary(&state, id).await
}

#[derive(Debug, Deserialize)]
pub struct EmergencyTempRequest {
    pub emergency_temp: f64,
}

/// `PUT /api/systems/:id/emergency-temp`
pub async fn put_emergency_temp(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<EmergencyTempRequest>,
) -> ServerResult<Json<SystemSummary>> {
    let system = load_system(&state.storage, id).await?;
    check_writable(&state, &system.agent_id).await?;

    state.storage.systems.set_emergency_temp(&system.agent_id, body.emergency_temp).await?;
    state.registry.update_settings(&system.agent_id, |s| s.emergency_temp = body.emergency_temp).await;
    state
        .dispatcher
        .dispatch(&system.agent_id, OutboundCommand::SetEmergencyTemp(SetEmergencyTempPayload { emergency_temp: body.emergency_temp }), Priority::Normal)
        .await;

    refresh_summary(&state, id).await
}

#[derive(Debug, Deserialize)]
pub struct LogLevelRequest {
    pub log_level: String,
}

/// `PUT /api/systems/:id/log-level`
pub async fn put_log_level(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<LogLevelRequest>,
) -> ServerResult<Json<SystemSummary>> {
    let system = load_system(&state.storage, id).await?;
    check_writable(&state, &system.agent_id).await?;

    state.storage.systems.set_log_level(&system.agent_id, &body.log_level).await?;
    state.registry.update_settings(&system.agent_id, |s| s.log_level = body.log_level.clone()).await;
    state
        .dispatcher
        .dispatch(&system.agent_id, OutboundCommand::SetLogLevel(SetLogLevelPayload { log_level: body.log_level }), Priority::Normal)
        .await;

    refresh_summary(&state, id).await
}

#[derive(Debug, Deserialize)]
pub struct FailsafeSpeedRequest {
    pub failsafe_speed: i64,
}

/// `PUT /api/systems/:id/failsafe-speed`
pub async fn put_failsafe_speed(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<FailsafeSpeedRequest>,
) -> ServerResult<Json<SystemSummary>> {
    if !(0..=100).contains(&body.failsafe_speed) {
        return Err(PankhaError::validation("failsafe_speed must be within 0..=100"));
    }
    let system = load_system(&state.storage, id).await?;
    check_writable(&state, &system.agent_id).await?;

    state.storage.systems.set_failsafe_speed(&system.agent_id, body.failsafe_speed).await?;
    state.registry.update_settings(&system.agent_id, |s| s.failsafe_speed = body.failsafe_speed).await;
    state
        .dispatcher
        .dispatch(
            &system.agent_id,
            OutboundCommand::SetFailsafeSpeed(SetFailsafeSpeedPayload { failsafe_speed: body.failsafe_speed as u8 }),
            Priority::Normal,
        )
        .await;

    refresh_summary(&state, id).await
}

#[derive(Debug, Deserialize)]
pub struct EnableFanControlRequest {
    pub enabled: bool,
}

/// `PUT /api/systems/:id/enable-fan-control`
pub async fn put_enable_fan_control(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<EnableFanControlRequest>,
) -> ServerResult<Json<SystemSummary>> {
    let system = load_system(&state.storage, id).await?;
    check_writable(&state, &system.agent_id).await?;

    state.storage.systems.set_enable_fan_control(&system.agent_id, body.enabled).await?;
    state.registry.update_settings(&system.agent_id, |s| s.enable_fan_control = body.enabled).await;
    state
        .dispatcher
        .dispatch(&system.agent_id, OutboundCommand::SetEnableFanControl(SetEnableFanControlPayload { enabled: body.enabled }), Priority::Normal)
        .await;

    refresh_summary(&state, id).await
}

#[derive(Debug, Deserialize)]
pub struct UpdateIntervalRequest {
    pub update_interval_ms: i64,
}

/// `PUT /api/systems/:id/update-interval`
pub async fn put_update_interval(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateIntervalRequest>,
) -> ServerResult<Json<SystemSummary>> {
    if body.update_interval_ms <= 0 {
        return Err(PankhaError::validation("update_interval_ms must be positive"));
    }
    let system = load_system(&state.storage, id).await?;
    check_writable(&state, &system.agent_id).await?;

    state.storage.systems.set_update_interval_ms(&system.agent_id, body.update_interval_ms).await?;
    state.registry.update_settings(&system.agent_id, |s| s.update_interval_ms = body.update_interval_ms).await;
    state
        .dispatcher
        .dispatch(
            &system.agent_id,
            OutboundCommand::SetUpdateInterval(SetUpdateIntervalPayload { update_interval_ms: body.update_interval_ms as u64 }),
            Priority::Normal,
        )
        .await;

    refresh_summary(&state, id).await
}

#[derive(Debug, Deserialize)]
pub struct FanSpeedRequest {
    pub speed: u8,
}

/// `PUT /api/systems/:id/fans/:fan_id` — a direct `setFanSpeed`, subject to
/// the same admission check as every other write. Yields control to the
/// manual write for the rest of this tick (spec §4.5 state machine).
pub async fn put_fan_speed(
    State(state): State<Arc<AppState>>,
    Path((id, fan_id)): Path<(i64, i64)>,
    Json(body): Json<FanSpeedRequest>,
) -> ServerResult<()> {
    let system = load_system(&state.storage, id).await?;
    check_writable(&state, &system.agent_id).await?;
    let fan = state.storage.fans.get(fan_id).await?;
    if fan.system_id != system.id {
        return Err(PankhaError::not_found(format!("fan {fan_id} does not belong to system {id}")));
    }

    state.controller_state.note_manual_write(fan.id).await;
    state
        .dispatcher
        .dispatch(&system.agent_id, OutboundCommand::SetFanSpeed(SetFanSpeedPayload { fan_id: fan.fan_name, speed: body.speed }), Priority::Normal)
        .await;
    Ok(())
}

/// `POST /api/systems/:id/update` — dispatches `selfUpdate`.
pub async fn post_self_update(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> ServerResult<()> {
    let system = load_system(&state.storage, id).await?;
    check_writable(&state, &system.agent_id).await?;
    state
        .dispatcher
        .dispatch(&system.agent_id, OutboundCommand::SelfUpdate(SelfUpdatePayload { target_version: None }), Priority::Normal)
        .await;
    Ok(())
}

/// `POST /api/systems/:id/rescan-sensors` — asks the agent to re-enumerate
/// its hardware sensors; newly discovered ones arrive on the next `data` frame.
pub async fn post_rescan_sensors(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> ServerResult<()> {
    let system = load_system(&state.storage, id).await?;
    check_writable(&state, &system.agent_id).await?;
    state
        .dispatcher
        .dispatch(&system.agent_id, OutboundCommand::RescanSensors(RescanSensorsPayload {}), Priority::Normal)
        .await;
    Ok(())
}

async fn refresh_summary(state: &AppState, id: i64) -> ServerResult<Json<SystemSummary>> {
    let system = load_system(&state.storage, id).await?;
    let admission_order = state.storage.systems.admission_order().await?;
    let agent_limit = state.license.agent_limit().await;
    let read_only = crate::gateway::registry::AgentRegistry::read_only_status(&admission_order, agent_limit)
        .get(&system.agent_id)
        .copied()
        .unwrap_or(false);
    let online = state.registry.is_online(&system.agent_id).await;
    Ok(Json(SystemSummary {
        id: system.id,
        agent_id: system.agent_id,
        name: system.name,
        status: system.status,
        online,
        read_only,
        update_interval_ms: system.update_interval_ms,
        fan_step_percent: system.fan_step_percent,
        hysteresis_temp: system.hysteresis_temp,
        emergency_temp: system.emergency_temp,
        failsafe_speed: system.failsafe_speed,
        log_level: system.log_level,
        enable_fan_control: system.enable_fan_control,
        last_seen_at: system.last_seen_at,
    }))
}

#[cfg(test)]
#[path = "systems_tests.rs"]
mod tests;
