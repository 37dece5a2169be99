// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::HashMap;

use pankha_protocol::DataPayload;

#[derive(Debug, Clone, PartialEq)]
pub struct SensorSnapshot {
    pub temperature: f64,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FanSnapshot {
    pub rpm: u32,
    pub speed: u8,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SystemHealthSnapshot {
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub agent_uptime: u64,
}

/// The latest reported state of one agent, keyed by the wire-level sensor
/// and fan ids (not the storage row ids).
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSnapshot {
    pub sensors: HashMap<String, SensorSnapshot>,
    pub fans: HashMap<String, FanSnapshot>,
    pub system_health: Option<SystemHealthSnapshot>,
}

impl AgentSnapshot {
    pub fn from_data_payload(data: &DataPayload) -> Self {
        let sensors = data
            .sensors
            .iter()
            .map(|s| (s.id.clone(), SensorSnapshot { temperature: s.temperature, status: s.status.clone() }))
            .collect();
        let fans = data
            .fans
            .iter()
            .map(|f| (f.id.clone(), FanSnapshot { rpm: f.rpm, speed: f.speed, status: f.status.clone() }))
            .collect();
        let system_health = data.system_health.as_ref().map(|h| SystemHealthSnapshot {
            cpu_usage: h.cpu_usage,
            memory_usage: h.memory_usage,
            agent_uptime: h.agent_uptime,
        });
        Self { sensors, fans, system_health }
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
