use super::*;
use crate::aggregator::{FanSnapshot, SensorSnapshot};

#[test]
fn converts_sensors_and_fans_into_json_views() {
    let mut sensors = HashMap::new();
    sensors.insert("cpu0".to_string(), SensorSnapshot { temperature: 44.0, status: None });
    let mut fans = HashMap::new();
    fans.insert("fan1".to_string(), FanSnapshot { rpm: 900, speed: 30, status: None });
    let snapshot = AgentSnapshot { sensors, fans, system_health: None };

    let view = snapshot_to_view("rig-1", &snapshot);

    assert_eq!(view.agent_id, "rig-1");
    assert_eq!(view.sensors["cpu0"]["temperature"], 44.0);
    assert_eq!(view.fans["fan1"]["rpm"], 900);
    assert!(view.system_health.is_none());
}
