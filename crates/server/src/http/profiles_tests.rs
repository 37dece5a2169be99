use std::sync::Arc;

use axum_test::TestServer;
use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;
use crate::http::build_router;
use crate::state::AppState;
use pankha_storage::types::{FanUpsert, NewSystem};
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

async fn harness() -> (TestServer, Arc<AppState>, i64, i64) {
    let storage = Storage::open_in_memory().await.unwrap();
    let system = storage
        .systems
        .register(NewSystem {
            agent_id: "rig-1".into(),
            name: "rig-1".into(),
            auth_token: None,
            agent_version: None,
            capabilities: "{}".into(),
            update_interval_ms: 2000,
            fan_step_percent: 5,
            hysteresis_temp: 3.0,
            emergency_temp: 90.0,
            failsafe_speed: 60,
            log_level: "info".into(),
        })
        .await
        .unwrap();
    let fan = storage
        .fans
        .upsert(system.id, &FanUpsert { fan_name: "fan0".into(), fan_label: "Fan 0".into(), min_speed: 0, max_speed: 100, has_pwm_control: true })
        .await
        .unwrap();
    let state = Arc::new(AppState::new(storage, test_config(), CancellationToken::new()));
    let server = TestServer::new(build_router(state.clone())).unwrap();
    (server, state, system.id, fan.id)
}

#[tokio::test]
async fn post_profiles_creates_a_custom_curve() {
    let (server, _state, id, _fan_id) = harness().await;
    let response = server
        .post(&format!("/api/systems/{id}/profiles"))
        .json(&serde_json::json!({"name": "silent", "description": "quiet rig", "curve": [[30.0, 20], [70.0, 100]]}))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["name"], "silent");
    assert_eq!(body["curve"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn post_profiles_rejects_a_single_point_curve() {
    let (server, _state, id, _fan_id) = harness().await;
    let response = server.post(&format!("/api/systems/{id}/profiles")).json(&serde_json::json!({"name": "bad", "curve": [[30.0, 20]]})).await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn put_profile_assigns_an_existing_named_curve_to_a_fan() {
    let (server, state, id, fan_id) = harness().await;
    state.storage.profiles.create(Some(id), "silent", "quiet", &[(30.0, 20), (70.0, 100)]).await.unwrap();

    let response = server.put(&format!("/api/systems/{id}/profile")).json(&serde_json::json!({"fan_id": fan_id, "profile_name": "silent"})).await;
    response.assert_status_ok();

    let active = state.storage.assignments.active_for_fan(fan_id).await.unwrap();
    assert!(active.is_some());
}

#[tokio::test]
async fn put_profile_404s_for_an_unknown_profile_name() {
    let (server, _state, id, fan_id) = harness().await;
    let response = server.put(&format!("/api/systems/{id}/profile")).json(&serde_json::json!({"fan_id": fan_id, "profile_name": "nope"})).await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sensor_group_visibility_hides_every_sensor_under_the_prefix() {
    let (server, state, id, _fan_id) = harness().await;
    state
        .storage
        .sensors
        .upsert(id, &pankha_storage::types::SensorUpsert { sensor_name: "gpu0".into(), sensor_label: "gpu:core".into(), sensor_type: "temp".into(), temp_max: None, temp_crit: None })
        .await
        .unwrap();
    state
        .storage
        .sensors
        .upsert(id, &pankha_storage::types::SensorUpsert { sensor_name: "gpu1".into(), sensor_label: "gpu:vram".into(), sensor_type: "temp".into(), temp_max: None, temp_crit: None })
        .await
        .unwrap();

    let response = server.put(&format!("/api/systems/{id}/sensor-groups/gpu/visibility")).json(&serde_json::json!({"hidden": true})).await;
    response.assert_status_ok();

    let sensors = state.storage.sensors.list_for_system(id).await.unwrap();
    assert!(sensors.iter().all(|s| s.is_hidden));

    let visibility = server.get(&format!("/api/systems/{id}/sensor-visibility")).await;
    let body: serde_json::Value = visibility.json();
    assert_eq!(body["hidden_groups"][0], "gpu");
}
