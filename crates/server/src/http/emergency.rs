// SPDX-License-Identifier: MIT OR Apache-2.0

//! The global emergency stop (spec §6, Scenario S6): broadcasts
//! `emergencyStop` to every online agent and returns as soon as the
//! dispatches are enqueued, without waiting on agent acknowledgements.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use pankha_protocol::command::{EmergencyStopPayload, OutboundCommand, Priority};

use crate::state::AppState;

#[derive(Debug, Deserialize, Default)]
pub struct EmergencyStopRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EmergencyStopResponse {
    pub dispatched_to: usize,
}

/// `POST /api/emergency-stop`
pub async fn post_emergency_stop(State(state): State<Arc<AppState>>, Json(body): Json<EmergencyStopRequest>) -> Json<EmergencyStopResponse> {
    let agent_ids = state.registry.all_ids().await;
    let mut dispatched_to = 0;
    for agent_id in agent_ids {
        if !state.registry.is_online(&agent_id).await {
            continue;
        }
        state
            .dispatcher
            .dispatch(&agent_id, OutboundCommand::EmergencyStop(EmergencyStopPayload { reason: body.reason.clone() }), Priority::Emergency)
            .await;
        dispatched_to += 1;
    }
    Json(EmergencyStopResponse { dispatched_to })
}

#[cfg(test)]
#[path = "emergency_tests.rs"]
mod tests;
