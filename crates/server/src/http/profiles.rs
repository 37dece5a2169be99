// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fan curve assignment, curve authoring, and the sensor/fan label and
//! visibility endpoints that back the dashboard's per-system customization
//! (spec §4.3, §4.4).

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use pankha_protocol::command::{ApplyFanProfilePayload, OutboundCommand, Priority, UpdateSensorMappingPayload};

use crate::error::{PankhaError, ServerResult};
use crate::http::{check_writable, load_system};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AssignProfileRequest {
    pub fan_id: i64,
    pub profile_name: String,
    pub sensor_id: Option<i64>,
    pub sensor_identifier: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AssignmentView {
    pub id: i64,
    pub fan_id: i64,
    pub profile_id: i64,
    pub sensor_id: Option<i64>,
    pub sensor_identifier: Option<String>,
}

/// `PUT /api/systems/:id/profile` — assigns (or re-assigns) a curve to a
/// fan. The controller tick picks up the new assignment on its next run;
/// `ApplyFanProfile` is dispatched too so an agent that also tracks
/// profiles locally (older firmware) stays in sync.
pub async fn put_profile(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<AssignProfileRequest>,
) -> ServerResult<Json<AssignmentView>> {
    let system = load_system(&state.storage, id).await?;
    check_writable(&state, &system.agent_id).await?;

    let fan = state.storage.fans.get(body.fan_id).await?;
    if fan.system_id != system.id {
        return Err(PankhaError::not_found(format!("fan {} does not belong to system {id}", body.fan_id)));
    }
    let profile = state
        .storage
        .profiles
        .find_by_name(Some(system.id), &body.profile_name)
        .await?
        .ok_or_else(|| PankhaError::not_found(format!("no profile named {:?} for system {id}", body.profile_name)))?;

    let assignment = state
        .storage
        .assignments
        .set_active(fan.id, profile.id, body.sensor_id, body.sensor_identifier.as_deref())
        .await?;
    state.controller_state.note_assignment_created(fan.id).await;
    state
        .dispatcher
        .dispatch(
            &system.agent_id,
            OutboundCommand::ApplyFanProfile(ApplyFanProfilePayload { fan_id: fan.fan_name, profile_name: body.profile_name }),
            Priority::Normal,
        )
        .await;

    Ok(Json(AssignmentView {
        id: assignment.id,
        fan_id: assignment.fan_id,
        profile_id: assignment.profile_id,
        sensor_id: assignment.sensor_id,
        sensor_identifier: assignment.sensor_identifier,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CreateProfileRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub curve: Vec<(f64, i64)>,
}

#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub is_builtin: bool,
    pub curve: Vec<(f64, i64)>,
}

/// `POST /api/systems/:id/profiles` — creates a system-scoped custom curve.
pub async fn post_profiles(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<CreateProfileRequest>,
) -> ServerResult<Json<ProfileView>> {
    let system = load_system(&state.storage, id).await?;
    check_writable(&state, &system.agent_id).await?;

    let profile = state.storage.profiles.create(Some(system.id), &body.name, &body.description, &body.curve).await?;
    let points = state.storage.profiles.curve_points(profile.id).await?;

    Ok(Json(ProfileView {
        id: profile.id,
        name: profile.profile_name,
        description: profile.description,
        is_builtin: profile.is_builtin,
        curve: points.into_iter().map(|p| (p.temperature, p.fan_speed)).collect(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct LabelRequest {
    pub label: String,
}

/// `PUT /api/systems/:id/sensors/:sensor_id/label` — renames a sensor's
/// display label and pushes the new mapping to the agent so its own
/// reporting uses the same name.
pub async fn put_sensor_label(
    State(state): State<Arc<AppState>>,
    Path((id, sensor_id)): Path<(i64, i64)>,
    Json(body): Json<LabelRequest>,
) -> ServerResult<()> {
    let system = load_system(&state.storage, id).await?;
    check_writable(&state, &system.agent_id).await?;
    let sensor = state.storage.sensors.get(sensor_id).await?;
    if sensor.system_id != system.id {
        return Err(PankhaError::not_found(format!("sensor {sensor_id} does not belong to system {id}")));
    }

    state.storage.sensors.set_label(sensor_id, &body.label).await?;
    state
        .dispatcher
        .dispatch(
            &system.agent_id,
            OutboundCommand::UpdateSensorMapping(UpdateSensorMappingPayload { sensor_id: sensor.sensor_name, mapped_label: body.label }),
            Priority::Normal,
        )
        .await;
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct VisibilityRequest {
    pub hidden: bool,
}

/// `PUT /api/systems/:id/sensors/:sensor_id/visibility`
pub async fn put_sensor_visibility(
    State(state): State<Arc<AppState>>,
    Path((id, sensor_id)): Path<(i64, i64)>,
    Json(body): Json<VisibilityRequest>,
) -> ServerResult<()> {
    let system = load_system(&state.storage, id).await?;
    check_writable(&state, &system.agent_id).await?;
    let sensor = state.storage.sensors.get(sensor_id).await?;
    if sensor.system_id != system.id {
        return Err(PankhaError::not_found(format!("sensor {sensor_id} does not belong to system {id}")));
    }

    state.storage.sensors.set_hidden(sensor_id, body.hidden).await?;
    Ok(())
}

/// `PUT /api/systems/:id/fans/:fan_id/label`
pub async fn put_fan_label(
    State(state): State<Arc<AppState>>,
    Path((id, fan_id)): Path<(i64, i64)>,
    Json(body): Json<LabelRequest>,
) -> ServerResult<()> {
    let system = load_system(&state.storage, id).await?;
    check_writable(&state, &system.agent_id).await?;
    let fan = state.storage.fans.get(fan_id).await?;
    if fan.system_id != system.id {
        return Err(PankhaError::not_found(format!("fan {fan_id} does not belong to system {id}")));
    }

    state.storage.fans.set_label(fan_id, &body.label).await?;
    Ok(())
}

/// `PUT /api/systems/:id/sensor-groups/:group/visibility` — hides or shows
/// every sensor whose label carries the `group:` prefix (spec §4.4).
pub async fn put_sensor_group_visibility(
    State(state): State<Arc<AppState>>,
    Path((id, group)): Path<(i64, String)>,
    Json(body): Json<VisibilityRequest>,
) -> ServerResult<()> {
    let system = load_system(&state.storage, id).await?;
    check_writable(&state, &system.agent_id).await?;

    state.storage.visibility.set_hidden(system.id, &group, body.hidden).await?;
    let prefix = format!("{group}:");
    for sensor in state.storage.sensors.find_by_label_prefix(system.id, &prefix).await? {
        state.storage.sensors.set_hidden(sensor.id, body.hidden).await?;
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct SensorVisibilityResponse {
    pub hidden_groups: Vec<String>,
}

/// `GET /api/systems/:id/sensor-visibility`
pub async fn get_sensor_visibility(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> ServerResult<Json<SensorVisibilityResponse>> {
    let system = load_system(&state.storage, id).await?;
    let hidden_groups = state.storage.visibility.hidden_groups(system.id).await?;
    Ok(Json(SensorVisibilityResponse { hidden_groups }))
}

#[cfg(test)]
#[path = "profiles_tests.rs"]
mod tests;
