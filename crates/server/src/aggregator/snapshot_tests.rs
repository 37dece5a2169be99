use super::*;
use pankha_protocol::{FanReport, SensorReport, SystemHealth};

fn sample_payload() -> DataPayload {
    DataPayload {
        agent_id: "rig-1".into(),
        timestamp: "2026-07-27T00:00:00Z".into(),
        sensors: vec![SensorReport { id: "cpu0".into(), temperature: 55.0, status: None }],
        fans: vec![FanReport { id: "fan1".into(), rpm: 1200, speed: 40, status: None }],
        system_health: Some(SystemHealth { cpu_usage: 12.5, memory_usage: 30.0, agent_uptime: 3600 }),
    }
}

#[test]
fn builds_a_snapshot_keyed_by_wire_ids() {
    let snapshot = AgentSnapshot::from_data_payload(&sample_payload());
    assert_eq!(snapshot.sensors["cpu0"].temperature, 55.0);
    assert_eq!(snapshot.fans["fan1"].rpm, 1200);
    assert_eq!(snapshot.fans["fan1"].speed, 40);
    assert_eq!(snapshot.system_health.unwrap().agent_uptime, 3600);
}

#[test]
fn missing_system_health_is_none() {
    let mut payload = sample_payload();
    payload.system_health = None;
    let snapshot = AgentSnapshot::from_data_payload(&payload);
    assert!(snapshot.system_health.is_none());
}
