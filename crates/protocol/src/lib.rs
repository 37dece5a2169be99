// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire protocol types shared by the agent gateway, the browser broadcaster,
//! and (conceptually) the per-host agents themselves.
//!
//! Field names intentionally follow the original mixed camelCase/snake_case
//! convention of the wire format (e.g. `agentId` alongside `update_interval_ms`)
//! rather than normalizing it — agents in the field already speak this shape.

pub mod agent;
pub mod browser;
pub mod command;

pub use agent::{
    AgentInbound, AgentOutbound, Capabilities, CommandResponsePayload, DataPayload, FanCapability, FanReport,
    RegisterPayload, SensorCapability, SensorReport, SystemHealth,
};
pub use browser::{BrowserInbound, BrowserOutbound, SystemDeltaChanges};
pub use command::{CommandStatus, OutboundCommand, Priority};

/// Parse a raw inbound agent frame.
///
/// Unknown `type` values and malformed JSON both surface as `Err` — callers
/// decide the failure policy (drop-and-log for unknown frames, connection-fatal
/// for a missing first `register`), this function never panics on bad input.
pub fn parse_agent_frame(raw: &str) -> Result<AgentInbound, FrameError> {
    serde_json::from_str(raw).map_err(|e| FrameError(e.to_string()))
}

/// Parse a raw inbound browser (dashboard) frame.
pub fn parse_browser_frame(raw: &str) -> Result<BrowserInbound, FrameError> {
    serde_json::from_str(raw).map_err(|e| FrameError(e.to_string()))
}

/// A frame that failed to parse as JSON or didn't match any known `type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameError(pub String);

impl std::fmt::Display for FrameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "malformed frame: {}", self.0)
    }
}

impl std::error::Error for FrameError {}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
