use super::*;
use crate::config::ServerConfig;
use pankha_protocol::{Capabilities, DataPayload, FanCapability, RegisterPayload, SensorCapability};
use pankha_storage::Storage;

fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".into(),
        port: 0,
        auth_token: None,
        db_path: "unused".into(),
        controller_tick_ms: 2000,
        default_fan_step_percent: 5,
        default_hysteresis_temp: 3.0,
        heartbeat_multiplier: 3,
        history_queue_capacity: 64,
        full_resync_secs: 300,
        license_validator_url: None,
        license_key: None,
    }
}

async fn test_state() -> Arc<AppState> {
    let storage = Storage::open_in_memory().await.unwrap();
    Arc::new(AppState::new(storage, test_config(), tokio_util::sync::CancellationToken::new()))
}

fn sample_register() -> RegisterPayload {
    RegisterPayload {
        agent_id: "rig-1".into(),
        name: "Rig".into(),
        agent_version: "1.0.0".into(),
        update_interval_ms: 2000,
        fan_step_percent: 5,
        failsafe_speed: 60,
        hysteresis_temp: 3.0,
        emergency_temp: 90.0,
        log_level: Some("info".into()),
        capabilities: Capabilities {
            sensors: vec![SensorCapability { id: "cpu0".into(), label: Some("CPU".into()), sensor_type: Some("cpu".into()), temp_max: None, temp_crit: None }],
            fans: vec![FanCapability { id: "fan1".into(), label: Some("Front".into()), has_pwm_control: true, min_speed: 20, max_speed: 100 }],
            fan_control: true,
        },
    }
}

#[tokio::test]
async fn register_system_creates_system_sensors_and_fans() {
    let state = test_state().await;
    let register = sample_register();

    let system = register_system(&state, &register).await.unwrap();

    assert_eq!(system.agent_id, "rig-1");
    let sensors = state.storage.sensors.list_for_system(system.id).await.unwrap();
    assert_eq!(sensors.len(), 1);
    assert_eq!(sensors[0].sensor_label, "CPU");
    let fans = state.storage.fans.list_for_system(system.id).await.unwrap();
    assert_eq!(fans.len(), 1);
    assert_eq!(fans[0].max_speed, 100);
}

#[tokio::test]
async fn register_system_is_idempotent_across_reconnects() {
    let state = test_state().await;
    let register = sample_register();

    let first = register_system(&state, &register).await.unwrap();
    let second = register_system(&state, &register).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(state.storage.sensors.list_for_system(first.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn handle_agent_frame_ingests_a_data_payload() {
    let state = test_state().await;
    let system = register_system(&state, &sample_register()).await.unwrap();

    let data = DataPayload {
        agent_id: "rig-1".into(),
        timestamp: "2026-07-27T00:00:00Z".into(),
        sensors: vec![pankha_protocol::SensorReport { id: "cpu0".into(), temperature: 55.0, status: None }],
        fans: vec![pankha_protocol::FanReport { id: "fan1".into(), rpm: 1200, speed: 40, status: None }],
        system_health: None,
    };
    let frame = serde_json::json!({"type": "data", "data": data}).to_string();

    handle_agent_frame(&state, "rig-1", system.id, &frame).await;

    let snapshot = state.aggregator.snapshot("rig-1").await.unwrap();
    assert_eq!(snapshot.sensors.get("cpu0").unwrap().temperature, 55.0);
}

#[tokio::test]
async fn handle_agent_frame_drops_malformed_json_without_panicking() {
    let state = test_state().await;
    handle_agent_frame(&state, "rig-1", 1, "not json").await;
}

#[tokio::test]
async fn handle_agent_frame_accepts_an_unmatched_command_response_without_panicking() {
    let state = test_state().await;
    let system = register_system(&state, &sample_register()).await.unwrap();

    let frame = serde_json::json!({
        "type": "commandResponse",
        "data": {"commandId": "unknown", "success": true, "timestamp": "2026-07-27T00:00:00Z"},
    })
    .to_string();

    handle_agent_frame(&state, "rig-1", system.id, &frame).await;
}
