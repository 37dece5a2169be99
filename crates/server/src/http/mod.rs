// SPDX-License-Identifier: MIT OR Apache-2.0

//! REST surface over the gateway/aggregator/dispatcher/controller services
//! (spec §4.7, §6), wired the way the teacher's `transport::build_router`
//! composes routes: one flat route table, bearer auth and CORS as layers.

pub mod auth;
pub mod deploy;
pub mod emergency;
pub mod history;
pub mod profiles;
pub mod settings;
pub mod systems;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::error::{PankhaError, ServerResult};
use crate::gateway::ws::{agent_ws_handler, browser_ws_handler};
use crate::state::AppState;
use pankha_storage::types::System;
use pankha_storage::Storage;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(systems::health))
        .route("/api/systems", get(systems::list_systems))
        .route("/api/systems/{id}", get(systems::get_system))
        .route("/api/systems/{id}/name", put(systems::put_name))
        .route("/api/systems/{id}/fan-step", put(systems::put_fan_step))
        .route("/api/systems/{id}/hysteresis", put(systems::put_hysteresis))
        .route("/api/systems/{id}/emergency-temp", put(systems::put_emergency_temp))
        .route("/api/systems/{id}/log-level", put(systems::put_log_level))
        .route("/api/systems/{id}/failsafe-speed", put(systems::put_failsafe_speed))
        .route("/api/systems/{id}/enable-fan-control", put(systems::put_enable_fan_control))
        .route("/api/systems/{id}/update-interval", put(systems::put_update_interval))
        .route("/api/systems/{id}/fans/{fan_id}", put(systems::put_fan_speed))
        .route("/api/systems/{id}/update", post(systems::post_self_update))
        .route("/api/systems/{id}/rescan-sensors", post(systems::post_rescan_sensors))
        .route("/api/systems/{id}/profile", put(profiles::put_profile))
        .route("/api/systems/{id}/profiles", post(profiles::post_profiles))
        .route("/api/systems/{id}/sensors/{sensor_id}/label", put(profiles::put_sensor_label))
        .route("/api/systems/{id}/sensors/{sensor_id}/visibility", put(profiles::put_sensor_visibility))
        .route("/api/systems/{id}/fans/{fan_id}/label", put(profiles::put_fan_label))
        .route("/api/systems/{id}/sensor-groups/{group}/visibility", put(profiles::put_sensor_group_visibility))
        .route("/api/systems/{id}/sensor-visibility", get(profiles::get_sensor_visibility))
        .route("/api/systems/{id}/history", get(history::get_history))
        .route("/api/systems/{id}/charts", get(history::get_charts))
        .route("/api/settings", get(settings::get_all).put(settings::put_all))
        .route("/api/settings/{key}", get(settings::get_one).put(settings::put_one))
        .route("/api/deploy/templates", post(deploy::post_template))
        .route("/api/deploy/linux", get(deploy::get_linux_installer))
        .route("/api/deploy/binaries/{arch}", get(deploy::get_binary))
        .route("/api/emergency-stop", post(emergency::post_emergency_stop))
        .route("/ws/agent", get(agent_ws_handler))
        .route("/ws/dashboard", get(browser_ws_handler))
        .layer(middleware::from_fn_with_state(state.clone(), auth::auth_layer))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Loads a system by its storage id, translating a missing row to `NotFound`.
pub(crate) async fn load_system(storage: &Storage, id: i64) -> ServerResult<System> {
    Ok(storage.systems.get(id).await?)
}

/// Spec §4.6: a read-only system's write endpoints fail with an
/// upgrade-required `AdmissionDenied` instead of taking effect.
pub(crate) async fn check_writable(state: &AppState, agent_id: &str) -> ServerResult<()> {
    if state.license.is_agent_read_only(&state.storage, agent_id).await? {
        return Err(PankhaError::admission_denied(format!("{agent_id} is past this license's agent limit")));
    }
    Ok(())
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
