// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agent -> server and server -> agent message shapes (spec §4.1).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Inbound frame from an agent, tagged by `type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum AgentInbound {
    Register(RegisterPayload),
    Data(DataPayload),
    CommandResponse(CommandResponsePayload),
}

/// `{agentId, name, agent_version, update_interval_ms, fan_step_percent,
/// failsafe_speed, hysteresis_temp, emergency_temp, log_level, capabilities}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterPayload {
    #[serde(rename = "agentId")]
    pub agent_id: String,
    pub name: String,
    pub agent_version: String,
    pub update_interval_ms: u64,
    pub fan_step_percent: u8,
    pub failsafe_speed: u8,
    pub hysteresis_temp: f64,
    pub emergency_temp: f64,
    #[serde(default)]
    pub log_level: Option<String>,
    pub capabilities: Capabilities,
}

/// Capability snapshot advertised at registration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Capabilities {
    #[serde(default)]
    pub sensors: Vec<SensorCapability>,
    #[serde(default)]
    pub fans: Vec<FanCapability>,
    #[serde(default)]
    pub fan_control: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorCapability {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub sensor_type: Option<String>,
    #[serde(default)]
    pub temp_max: Option<f64>,
    #[serde(default)]
    pub temp_crit: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FanCapability {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub has_pwm_control: bool,
    #[serde(default = "default_min_speed")]
    pub min_speed: u8,
    #[serde(default = "default_max_speed")]
    pub max_speed: u8,
}

fn default_min_speed() -> u8 {
    0
}

fn default_max_speed() -> u8 {
    100
}

/// `{agentId, timestamp, sensors:[...], fans:[...], systemHealth:{...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPayload {
    #[serde(rename = "agentId")]
    pub agent_id: String,
    pub timestamp: String,
    #[serde(default)]
    pub sensors: Vec<SensorReport>,
    #[serde(default)]
    pub fans: Vec<FanReport>,
    #[serde(default, rename = "systemHealth")]
    pub system_health: Option<SystemHealth>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorReport {
    pub id: String,
    pub temperature: f64,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FanReport {
    pub id: String,
    pub rpm: u32,
    pub speed: u8,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemHealth {
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub agent_uptime: u64,
}

/// `{commandId, success, data?, error?, timestamp}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponsePayload {
    #[serde(rename = "commandId")]
    pub command_id: String,
    pub success: bool,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
    pub timestamp: String,
}

/// Outbound envelope to an agent: `{commandId, type, payload}`, or the bare
/// `{"type":"registered"}` confirmation (no `commandId`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentOutbound {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub command_id: Option<String>,
    #[serde(flatten)]
    pub command: crate::command::OutboundCommand,
}

impl AgentOutbound {
    /// The `{"type":"registered"}` connection-accepted confirmation.
    pub fn registered() -> Self {
        Self { command_id: None, command: crate::command::OutboundCommand::Registered }
    }

    /// Wrap a command variant with its correlation id for dispatch.
    pub fn command(command_id: impl Into<String>, command: crate::command::OutboundCommand) -> Self {
        Self { command_id: Some(command_id.into()), command }
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
