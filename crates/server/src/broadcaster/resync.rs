// SPDX-License-Identifier: MIT OR Apache-2.0

//! Converts an in-memory `AgentSnapshot` into the wire `AgentSnapshotView`
//! sent inside `fullState`.

use serde_json::{json, Value};
use std::collections::HashMap;

use crate::aggregator::AgentSnapshot;
use pankha_protocol::browser::AgentSnapshotView;

pub fn snapshot_to_view(agent_id: &str, snapshot: &AgentSnapshot) -> AgentSnapshotView {
    let sensors: HashMap<String, Value> = snapshot
        .sensors
        .iter()
        .map(|(id, s)| (id.clone(), json!({ "temperature": s.temperature, "status": s.status })))
        .collect();
    let fans: HashMap<String, Value> = snapshot
        .fans
        .iter()
        .map(|(id, f)| (id.clone(), json!({ "rpm": f.rpm, "speed": f.speed, "status": f.status })))
        .collect();
    let system_health = snapshot.system_health.as_ref().map(|h| {
        json!({
            "cpuUsage": h.cpu_usage,
            "memoryUsage": h.memory_usage,
            "agentUptime": h.agent_uptime,
        })
    });
    AgentSnapshotView { agent_id: agent_id.to_string(), timestamp: chrono::Utc::now().to_rfc3339(), sensors, fans, system_health }
}

#[cfg(test)]
#[path = "resync_tests.rs"]
mod tests;
