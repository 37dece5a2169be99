use std::sync::Arc;

use axum_test::TestServer;
use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;
use crate::http::build_router;
use crate::state::AppState;
use pankha_storage::types::NewSystem;
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

async fn new_server_with_system(agent_id: &str) -> (TestServer, Arc<AppState>, i64) {
    let storage = Storage::open_in_memory().await.unwrap();
    let system = storage
        .systems
        .register(NewSystem {
            agent_id: agent_id.into(),
            name: agent_id.into(),
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
    let state = Arc::new(AppState::new(storage, test_config(), CancellationToken::new()));
    let server = TestServer::new(build_router(state.clone())).unwrap();
    (server, state, system.id)
}

#[tokio::test]
async fn health_reports_zero_connected_agents_with_nobody_online() {
    let (server, _state, _id) = new_server_with_system("rig-1").await;
    let response = server.get("/api/health").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["connected_agents"], 0);
}

#[tokio::test]
async fn list_systems_includes_the_registered_system() {
    let (server, _state, _id) = new_server_with_system("rig-1").await;
    let response = server.get("/api/systems").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["agent_id"], "rig-1");
    assert_eq!(body[0]["online"], false);
}

#[tokio::test]
async fn get_system_404s_for_an_unknown_id() {
    let (server, _state, _id) = new_server_with_system("rig-1").await;
    let response = server.get("/api/systems/9999").await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn put_name_persists_and_updates_the_registry_mirror() {
    let (server, state, id) = new_server_with_system("rig-1").await;
    let response = server.put(&format!("/api/systems/{id}/name")).json(&serde_json::json!({"name": "Render Node 1"})).await;
    response.assert_status_ok();

    let system = state.storage.systems.get(id).await.unwrap();
    assert_eq!(system.name, "Render Node 1");
}

#[tokio::test]
async fn put_fan_step_rejects_a_value_outside_the_allowed_set() {
    let (server, _state, id) = new_server_with_system("rig-1").await;
    let response = server.put(&format!("/api/systems/{id}/fan-step")).json(&serde_json::json!({"fan_step_percent": 7})).await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn put_fan_step_accepts_an_allowed_value() {
    let (server, state, id) = new_server_with_system("rig-1").await;
    let response = server.put(&format!("/api/systems/{id}/fan-step")).json(&serde_json::json!({"fan_step_percent": 25})).await;
    response.assert_status_ok();
    let system = state.storage.systems.get(id).await.unwrap();
    assert_eq!(system.fan_step_percent, 25);
}

#[tokio::test]
async fn put_update_interval_rejects_a_non_positive_value() {
    let (server, _state, id) = new_server_with_system("rig-1").await;
    let response = server.put(&format!("/api/systems/{id}/update-interval")).json(&serde_json::json!({"update_interval_ms": 0})).await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn put_fan_speed_404s_for_a_fan_belonging_to_another_system() {
    let (server, state, id) = new_server_with_system("rig-1").await;
    let other = state
        .storage
        .systems
        .register(NewSystem {
            agent_id: "rig-2".into(),
            name: "rig-2".into(),
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
    let fan = state
        .storage
        .fans
        .upsert(other.id, &pankha_storage::types::FanUpsert { fan_name: "fan0".into(), fan_label: "fan0".into(), min_speed: 0, max_speed: 100, has_pwm_control: true })
        .await
        .unwrap();

    let response = server.put(&format!("/api/systems/{id}/fans/{}", fan.id)).json(&serde_json::json!({"speed": 50})).await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}
