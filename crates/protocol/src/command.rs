// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound command kinds (spec §4.1) and the dispatcher's priority/status enums (spec §3, §4.4).

use serde::{Deserialize, Serialize};

/// Dispatch priority. `Ord` is derived in declaration order, so
/// `Priority::Emergency > Priority::High > Priority::Normal > Priority::Low`
/// falls directly out of the derive — the same trick the priority queue
/// (`BinaryHeap`) in `pankha-server`'s dispatcher relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Normal,
    High,
    Emergency,
}

/// Terminal and in-flight states of a dispatched `Command` (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandStatus {
    Pending,
    Sent,
    Succeeded,
    Failed,
    Timedout,
    Superseded,
}

/// Every outbound command kind the gateway may send to an agent, plus the
/// `registered` connection-accepted marker. Adjacently tagged so the wire
/// shape is `{"type": "...", "payload": {...}}` with `payload` omitted for
/// content-free variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum OutboundCommand {
    Registered,
    SetFanSpeed(SetFanSpeedPayload),
    SetUpdateInterval(SetUpdateIntervalPayload),
    ApplyFanProfile(ApplyFanProfilePayload),
    SetFanStep(SetFanStepPayload),
    SetHysteresis(SetHysteresisPayload),
    SetEmergencyTemp(SetEmergencyTempPayload),
    SetFailsafeSpeed(SetFailsafeSpeedPayload),
    SetLogLevel(SetLogLevelPayload),
    SetEnableFanControl(SetEnableFanControlPayload),
    SetAgentName(SetAgentNamePayload),
    EmergencyStop(EmergencyStopPayload),
    SelfUpdate(SelfUpdatePayload),
    RescanSensors(RescanSensorsPayload),
    UpdateSensorMapping(UpdateSensorMappingPayload),
}

impl OutboundCommand {
    /// The fan this command targets, if any — used by the dispatcher's
    /// same-fan supersedence rule (spec §4.4).
    pub fn fan_id(&self) -> Option<&str> {
        match self {
            Self::SetFanSpeed(p) => Some(&p.fan_id),
            _ => None,
        }
    }

    /// Short name for logging, matching the wire `type` string.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::SetFanSpeed(_) => "setFanSpeed",
            Self::SetUpdateInterval(_) => "setUpdateInterval",
            Self::ApplyFanProfile(_) => "applyFanProfile",
            Self::SetFanStep(_) => "setFanStep",
            Self::SetHysteresis(_) => "setHysteresis",
            Self::SetEmergencyTemp(_) => "setEmergencyTemp",
            Self::SetFailsafeSpeed(_) => "setFailsafeSpeed",
            Self::SetLogLevel(_) => "setLogLevel",
            Self::SetEnableFanControl(_) => "setEnableFanControl",
            Self::SetAgentName(_) => "setAgentName",
            Self::EmergencyStop(_) => "emergencyStop",
            Self::SelfUpdate(_) => "selfUpdate",
            Self::RescanSensors(_) => "rescanSensors",
            Self::UpdateSensorMapping(_) => "updateSensorMapping",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetFanSpeedPayload {
    pub fan_id: String,
    pub speed: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetUpdateIntervalPayload {
    pub update_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyFanProfilePayload {
    pub fan_id: String,
    pub profile_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetFanStepPayload {
    pub fan_step_percent: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetHysteresisPayload {
    pub hysteresis_temp: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetEmergencyTempPayload {
    pub emergency_temp: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetFailsafeSpeedPayload {
    pub failsafe_speed: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetLogLevelPayload {
    pub log_level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetEnableFanControlPayload {
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetAgentNamePayload {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyStopPayload {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelfUpdatePayload {
    #[serde(default)]
    pub target_version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RescanSensorsPayload {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSensorMappingPayload {
    pub sensor_id: String,
    pub mapped_label: String,
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
