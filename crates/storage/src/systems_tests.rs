use super::*;
use crate::pool::open_in_memory;

fn sample(agent_id: &str) -> NewSystem {
    NewSystem {
        agent_id: agent_id.to_string(),
        name: format!("rig-{agent_id}"),
        auth_token: Some("tok".into()),
        agent_version: Some("1.0.0".into()),
        capabilities: "{}".into(),
        update_interval_ms: 2000,
        fan_step_percent: 5,
        hysteresis_temp: 3.0,
        emergency_temp: 90.0,
        failsafe_speed: 60,
        log_level: "info".into(),
    }
}

#[tokio::test]
async fn register_is_idempotent_on_agent_id() {
    let repo = SystemsRepo::new(open_in_memory().await.unwrap());
    let first = repo.register(sample("rig-1")).await.unwrap();
    let second = repo.register(sample("rig-1")).await.unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(repo.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn admission_order_is_registration_order() {
    let repo = SystemsRepo::new(open_in_memory().await.unwrap());
    repo.register(sample("rig-a")).await.unwrap();
    repo.register(sample("rig-b")).await.unwrap();
    repo.register(sample("rig-c")).await.unwrap();
    assert_eq!(repo.admission_order().await.unwrap(), vec!["rig-a", "rig-b", "rig-c"]);
}

#[tokio::test]
async fn get_unknown_system_is_not_found() {
    let repo = SystemsRepo::new(open_in_memory().await.unwrap());
    assert!(matches!(repo.get(999).await, Err(StorageError::NotFound(_))));
}

#[tokio::test]
async fn rename_updates_name_only() {
    let repo = SystemsRepo::new(open_in_memory().await.unwrap());
    repo.register(sample("rig-1")).await.unwrap();
    repo.rename("rig-1", "Renamed Rig").await.unwrap();
    let system = repo.get_by_agent_id("rig-1").await.unwrap().unwrap();
    assert_eq!(system.name, "Renamed Rig");
}

#[tokio::test]
async fn mark_status_transitions_offline_and_online() {
    let repo = SystemsRepo::new(open_in_memory().await.unwrap());
    repo.register(sample("rig-1")).await.unwrap();
    repo.mark_status("rig-1", "offline").await.unwrap();
    let system = repo.get_by_agent_id("rig-1").await.unwrap().unwrap();
    assert_eq!(system.status, "offline");
}

#[tokio::test]
async fn set_enable_fan_control_persists_bool() {
    let repo = SystemsRepo::new(open_in_memory().await.unwrap());
    repo.register(sample("rig-1")).await.unwrap();
    repo.set_enable_fan_control("rig-1", false).await.unwrap();
    let system = repo.get_by_agent_id("rig-1").await.unwrap().unwrap();
    assert!(!system.enable_fan_control);
}

#[tokio::test]
async fn delete_unknown_agent_is_not_found() {
    let repo = SystemsRepo::new(open_in_memory().await.unwrap());
    assert!(matches!(repo.delete("ghost").await, Err(StorageError::NotFound(_))));
}
