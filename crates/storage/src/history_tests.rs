use super::*;
use crate::pool::open_in_memory;
use crate::systems::SystemsRepo;
use crate::types::NewSystem;
use chrono::Duration;

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

#[tokio::test]
async fn insert_batch_then_query_range_round_trips() {
    let pool = open_in_memory().await.unwrap();
    let system_id = seed_system(&pool).await;
    let repo = HistoryRepo::new(pool);

    let now = Utc::now();
    let samples = vec![
        HistorySample {
            system_id,
            sensor_id: Some(1),
            fan_id: None,
            temperature: Some(55.0),
            fan_speed: None,
            fan_rpm: None,
            timestamp: now,
        },
        HistorySample {
            system_id,
            sensor_id: None,
            fan_id: Some(1),
            temperature: None,
            fan_speed: Some(60),
            fan_rpm: Some(1500),
            timestamp: now + Duration::seconds(5),
        },
    ];
    repo.insert_batch(&samples).await.unwrap();

    let rows = repo
        .query_range(system_id, now - Duration::minutes(1), now + Duration::minutes(1))
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].temperature, Some(55.0));
    assert_eq!(rows[1].fan_rpm, Some(1500));
}

#[tokio::test]
async fn insert_batch_of_empty_slice_is_a_no_op() {
    let pool = open_in_memory().await.unwrap();
    let repo = HistoryRepo::new(pool);
    repo.insert_batch(&[]).await.unwrap();
}

#[tokio::test]
async fn purge_older_than_removes_only_stale_rows() {
    let pool = open_in_memory().await.unwrap();
    let system_id = seed_system(&pool).await;
    let repo = HistoryRepo::new(pool);

    let now = Utc::now();
    repo.insert_batch(&[
        HistorySample {
            system_id,
            sensor_id: Some(1),
            fan_id: None,
            temperature: Some(40.0),
            fan_speed: None,
            fan_rpm: None,
            timestamp: now - Duration::days(100),
        },
        HistorySample {
            system_id,
            sensor_id: Some(1),
            fan_id: None,
            temperature: Some(45.0),
            fan_speed: None,
            fan_rpm: None,
            timestamp: now,
        },
    ])
    .await
    .unwrap();

    let purged = repo.purge_older_than(now - Duration::days(1)).await.unwrap();
    assert_eq!(purged, 1);

    let remaining = repo
        .query_range(system_id, now - Duration::days(200), now + Duration::days(1))
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].temperature, Some(45.0));
}
