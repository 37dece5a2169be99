// SPDX-License-Identifier: MIT OR Apache-2.0

//! Browser (dashboard) <-> server message shapes (spec §4.3, §6).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Inbound message from a browser subscriber.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum BrowserInbound {
    /// `subscribe(agentId | "all")`.
    Subscribe {
        #[serde(rename = "agentId")]
        agent_id: String,
    },
    Unsubscribe,
    RequestFullSync,
}

/// Outbound message to a browser subscriber.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum BrowserOutbound {
    /// Complete current snapshot for every agent the subscriber may see.
    FullState { agents: Vec<AgentSnapshotView> },
    /// Minimal diff of one agent's snapshot since this subscriber's baseline.
    SystemDelta {
        #[serde(rename = "agentId")]
        agent_id: String,
        timestamp: String,
        changes: SystemDeltaChanges,
    },
    SystemOffline {
        #[serde(rename = "agentId")]
        agent_id: String,
    },
    NameChanged {
        #[serde(rename = "agentId")]
        agent_id: String,
        name: String,
    },
    LicenseChanged { tier: String, agent_limit: Option<u32> },
    /// Emitted when the subscriber's outbound queue overflowed and frames
    /// were dropped; the dashboard should send `requestFullSync`.
    ResyncSuggested,
}

/// A whole-agent view sent inside `fullState`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSnapshotView {
    #[serde(rename = "agentId")]
    pub agent_id: String,
    pub timestamp: String,
    pub sensors: HashMap<String, Value>,
    pub fans: HashMap<String, Value>,
    #[serde(rename = "systemHealth", skip_serializing_if = "Option::is_none")]
    pub system_health: Option<Value>,
}

/// `{sensors:{sensorName:{fieldsChanged}}, fans:{fanName:{fieldsChanged}}, systemHealth?}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemDeltaChanges {
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub sensors: HashMap<String, HashMap<String, Value>>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub fans: HashMap<String, HashMap<String, Value>>,
    #[serde(default, rename = "systemHealth", skip_serializing_if = "Option::is_none")]
    pub system_health: Option<HashMap<String, Value>>,
}

impl SystemDeltaChanges {
    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty() && self.fans.is_empty() && self.system_health.is_none()
    }
}

#[cfg(test)]
#[path = "browser_tests.rs"]
mod tests;
