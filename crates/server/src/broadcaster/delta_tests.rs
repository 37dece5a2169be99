use super::*;
use crate::aggregator::{FanSnapshot, SensorSnapshot, SystemHealthSnapshot};
use std::collections::HashMap;

fn snapshot(temp: f64, rpm: u32, speed: u8) -> AgentSnapshot {
    let mut sensors = HashMap::new();
    sensors.insert("cpu0".to_string(), SensorSnapshot { temperature: temp, status: None });
    let mut fans = HashMap::new();
    fans.insert("fan1".to_string(), FanSnapshot { rpm, speed, status: None });
    AgentSnapshot { sensors, fans, system_health: None }
}

#[test]
fn no_baseline_reports_everything() {
    let current = snapshot(50.0, 1000, 40);
    let changes = diff(None, &current);
    assert!(changes.sensors.contains_key("cpu0"));
    assert!(changes.fans.contains_key("fan1"));
}

#[test]
fn sub_threshold_temperature_change_is_suppressed() {
    let baseline = snapshot(50.0, 1000, 40);
    let current = snapshot(50.05, 1000, 40);
    let changes = diff(Some(&baseline), &current);
    assert!(changes.is_empty());
}

#[test]
fn temperature_change_at_threshold_is_reported() {
    let baseline = snapshot(50.0, 1000, 40);
    let current = snapshot(50.1, 1000, 40);
    let changes = diff(Some(&baseline), &current);
    assert!(changes.sensors["cpu0"].contains_key("temperature"));
}

#[test]
fn rpm_change_below_threshold_is_suppressed_but_speed_always_reports() {
    let baseline = snapshot(50.0, 1000, 40);
    let current = snapshot(50.0, 1002, 45);
    let changes = diff(Some(&baseline), &current);
    let fan_fields = &changes.fans["fan1"];
    assert!(!fan_fields.contains_key("rpm"));
    assert!(fan_fields.contains_key("speed"));
}

#[test]
fn system_health_sub_threshold_changes_are_suppressed() {
    let mut baseline = snapshot(50.0, 1000, 40);
    baseline.system_health = Some(SystemHealthSnapshot { cpu_usage: 10.0, memory_usage: 20.0, agent_uptime: 100 });
    let mut current = snapshot(50.0, 1000, 40);
    current.system_health = Some(SystemHealthSnapshot { cpu_usage: 10.2, memory_usage: 20.0, agent_uptime: 100 });

    let changes = diff(Some(&baseline), &current);
    let health = changes.system_health.unwrap();
    assert!(!health.contains_key("cpuUsage"));
    assert!(!health.contains_key("memoryUsage"));
    assert!(!health.contains_key("agentUptime"));
}

#[test]
fn system_health_reports_above_threshold_changes() {
    let mut baseline = snapshot(50.0, 1000, 40);
    baseline.system_health = Some(SystemHealthSnapshot { cpu_usage: 10.0, memory_usage: 20.0, agent_uptime: 100 });
    let mut current = snapshot(50.0, 1000, 40);
    current.system_health = Some(SystemHealthSnapshot { cpu_usage: 12.0, memory_usage: 20.0, agent_uptime: 200 });

    let changes = diff(Some(&baseline), &current);
    let health = changes.system_health.unwrap();
    assert!(health.contains_key("cpuUsage"));
    assert!(!health.contains_key("memoryUsage"));
    assert!(health.contains_key("agentUptime"));
}
