use super::*;
use crate::pool::open_in_memory;
use crate::systems::SystemsRepo;
use crate::types::NewSystem;

async fn seed_system(pool: &sqlx::SqlitePool) -> i64 {
    let repo = SystemsRepo::new(pool.clone());
    let system = repo
        .register(NewSystem {
            agent_id: "rig-1".into(),
            name: "Rig One".into(),
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
    system.id
}

fn sample_fan() -> FanUpsert {
    FanUpsert {
        fan_name: "fan1".into(),
        fan_label: "Front Intake".into(),
        min_speed: 20,
        max_speed: 100,
        has_pwm_control: true,
    }
}

#[tokio::test]
async fn upsert_is_keyed_by_system_and_fan_name() {
    let pool = open_in_memory().await.unwrap();
    let system_id = seed_system(&pool).await;
    let repo = FansRepo::new(pool);

    let first = repo.upsert(system_id, &sample_fan()).await.unwrap();
    let second = repo.upsert(system_id, &sample_fan()).await.unwrap();
    assert_eq!(first.id, second.id);
}

#[tokio::test]
async fn update_reading_sets_rpm_and_speed() {
    let pool = open_in_memory().await.unwrap();
    let system_id = seed_system(&pool).await;
    let repo = FansRepo::new(pool);
    let fan = repo.upsert(system_id, &sample_fan()).await.unwrap();

    repo.update_reading(fan.id, 1800, 55).await.unwrap();
    let refreshed = repo.get(fan.id).await.unwrap();
    assert_eq!(refreshed.current_rpm, 1800);
    assert_eq!(refreshed.current_speed, 55);
}

#[tokio::test]
async fn set_enabled_on_unknown_fan_is_not_found() {
    let pool = open_in_memory().await.unwrap();
    let repo = FansRepo::new(pool);
    assert!(matches!(repo.set_enabled(999, false).await, Err(StorageError::NotFound(_))));
}

#[tokio::test]
async fn find_by_name_returns_none_when_absent() {
    let pool = open_in_memory().await.unwrap();
    let system_id = seed_system(&pool).await;
    let repo = FansRepo::new(pool);
    assert!(repo.find_by_name(system_id, "fan9").await.unwrap().is_none());
}

#[tokio::test]
async fn set_label_renames_the_fan() {
    let pool = open_in_memory().await.unwrap();
    let system_id = seed_system(&pool).await;
    let repo = FansRepo::new(pool);
    let fan = repo.upsert(system_id, &sample_fan()).await.unwrap();

    repo.set_label(fan.id, "Rear Exhaust").await.unwrap();

    assert_eq!(repo.get(fan.id).await.unwrap().fan_label, "Rear Exhaust");
}

#[tokio::test]
async fn set_label_on_unknown_fan_is_not_found() {
    let pool = open_in_memory().await.unwrap();
    let repo = FansRepo::new(pool);
    assert!(matches!(repo.set_label(999, "x").await, Err(StorageError::NotFound(_))));
}
