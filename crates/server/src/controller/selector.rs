// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resolves an assignment's temperature source — a single sensor, the
//! hottest sensor on the system, or the hottest sensor in a labelled group —
//! to one current reading per tick.

use pankha_storage::types::Assignment;
use pankha_storage::Storage;

use crate::aggregator::AgentSnapshot;

pub const HIGHEST_SENSOR: &str = "__highest__";
pub const GROUP_PREFIX: &str = "__group__";

/// Looks up the current temperature for `assignment` against `snapshot`
/// (the owning agent's live data). Returns `None` if the referenced sensor
/// isn't reporting or the assignment has nothing it can resolve.
pub async fn resolve_temperature(
    storage: &Storage,
    system_id: i64,
    snapshot: &AgentSnapshot,
    assignment: &Assignment,
) -> Option<f64> {
    if let Some(identifier) = assignment.sensor_identifier.as_deref() {
        if identifier == HIGHEST_SENSOR {
            return highest_among(storage, system_id, snapshot, None).await;
        }
        if let Some(tag) = identifier.strip_prefix(GROUP_PREFIX) {
            return highest_among(storage, system_id, snapshot, Some(tag)).await;
        }
        return None;
    }

    let sensor_id = assignment.sensor_id?;
    let sensor = storage.sensors.get(sensor_id).await.ok()?;
    snapshot.sensors.get(&sensor.sensor_name).map(|s| s.temperature)
}

async fn highest_among(storage: &Storage, system_id: i64, snapshot: &AgentSnapshot, label_prefix: Option<&str>) -> Option<f64> {
    let sensors = match label_prefix {
        Some(prefix) => storage.sensors.find_by_label_prefix(system_id, prefix).await.ok()?,
        None => storage.sensors.list_for_system(system_id).await.ok()?,
    };

    sensors
        .into_iter()
        .filter(|s| !s.is_hidden)
        .filter_map(|s| snapshot.sensors.get(&s.sensor_name).map(|reading| reading.temperature))
        .fold(None, |max, temperature| match max {
            Some(current) if current >= temperature => Some(current),
            _ => Some(temperature),
        })
}

#[cfg(test)]
#[path = "selector_tests.rs"]
mod tests;
