// SPDX-License-Identifier: MIT OR Apache-2.0

//! Threshold-gated diffing between a subscriber's last-sent baseline and the
//! aggregator's current snapshot.

use std::collections::HashMap;

use serde_json::{json, Value};

use crate::aggregator::AgentSnapshot;
use pankha_protocol::SystemDeltaChanges;

const CPU_MEMORY_THRESHOLD: f64 = 1.0;
const UPTIME_THRESHOLD_SECS: u64 = 60;
const TEMPERATURE_THRESHOLD: f64 = 0.1;
const RPM_THRESHOLD: u32 = 5;

/// Computes the fields that changed enough to be worth sending, relative to
/// `baseline`. A fan's `speed` field is included on any change at all.
pub fn diff(baseline: Option<&AgentSnapshot>, current: &AgentSnapshot) -> SystemDeltaChanges {
    let mut changes = SystemDeltaChanges::default();

    for (id, sensor) in &current.sensors {
        let prev = baseline.and_then(|b| b.sensors.get(id));
        let mut fields: HashMap<String, Value> = HashMap::new();
        let temp_changed = match prev {
            Some(p) => (p.temperature - sensor.temperature).abs() >= TEMPERATURE_THRESHOLD,
            None => true,
        };
        if temp_changed {
            fields.insert("temperature".into(), json!(sensor.temperature));
        }
        if prev.map(|p| &p.status) != Some(&sensor.status) {
            fields.insert("status".into(), json!(sensor.status));
        }
        if !fields.is_empty() {
            changes.sensors.insert(id.clone(), fields);
        }
    }

    for (id, fan) in &current.fans {
        let prev = baseline.and_then(|b| b.fans.get(id));
        let mut fields: HashMap<String, Value> = HashMap::new();
        let rpm_changed = match prev {
            Some(p) => p.rpm.abs_diff(fan.rpm) >= RPM_THRESHOLD,
            None => true,
        };
        if rpm_changed {
            fields.insert("rpm".into(), json!(fan.rpm));
        }
        if prev.map(|p| p.speed) != Some(fan.speed) {
            fields.insert("speed".into(), json!(fan.speed));
        }
        if prev.map(|p| &p.status) != Some(&fan.status) {
            fields.insert("status".into(), json!(fan.status));
        }
        if !fields.is_empty() {
            changes.fans.insert(id.clone(), fields);
        }
    }

    if let Some(health) = &current.system_health {
        let prev = baseline.and_then(|b| b.system_health.as_ref());
        let mut fields: HashMap<String, Value> = HashMap::new();
        let cpu_changed = prev.map(|p| (p.cpu_usage - health.cpu_usage).abs() >= CPU_MEMORY_THRESHOLD).unwrap_or(true);
        let mem_changed =
            prev.map(|p| (p.memory_usage - health.memory_usage).abs() >= CPU_MEMORY_THRESHOLD).unwrap_or(true);
        let uptime_changed = prev
            .map(|p| p.agent_uptime.abs_diff(health.agent_uptime) >= UPTIME_THRESHOLD_SECS)
            .unwrap_or(true);
        if cpu_changed {
            fields.insert("cpuUsage".into(), json!(health.cpu_usage));
        }
        if mem_changed {
            fields.insert("memoryUsage".into(), json!(health.memory_usage));
        }
        if uptime_changed {
            fields.insert("agentUptime".into(), json!(health.agent_uptime));
        }
        if !fields.is_empty() {
            changes.system_health = Some(fields);
        }
    }

    changes
}

#[cfg(test)]
#[path = "delta_tests.rs"]
mod tests;
