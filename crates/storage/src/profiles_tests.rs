use super::*;
use crate::pool::open_in_memory;

#[tokio::test]
async fn create_requires_at_least_two_curve_points() {
    let repo = ProfilesRepo::new(open_in_memory().await.unwrap());
    let result = repo.create(None, "flat", "single point", &[(50.0, 30)]).await;
    assert!(matches!(result, Err(StorageError::Conflict(_))));
}

#[tokio::test]
async fn create_persists_ordered_curve_points() {
    let repo = ProfilesRepo::new(open_in_memory().await.unwrap());
    let profile = repo
        .create(
            None,
            "balanced",
            "default curve",
            &[(30.0, 20), (60.0, 50), (80.0, 100)],
        )
        .await
        .unwrap();

    let points = repo.curve_points(profile.id).await.unwrap();
    assert_eq!(points.len(), 3);
    assert_eq!(points[0].point_order, 0);
    assert_eq!(points[2].fan_speed, 100);
}

#[tokio::test]
async fn global_profiles_are_visible_to_every_system() {
    let repo = ProfilesRepo::new(open_in_memory().await.unwrap());
    repo.create(None, "silent", "", &[(0.0, 10), (100.0, 30)]).await.unwrap();
    let visible = repo.list_visible_to(42).await.unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].profile_name, "silent");
}

#[tokio::test]
async fn builtin_profiles_cannot_be_deleted() {
    let pool = open_in_memory().await.unwrap();
    sqlx::query(
        "INSERT INTO fan_profiles (system_id, profile_name, description, is_builtin) VALUES (NULL, 'silent', '', 1)",
    )
    .execute(&pool)
    .await
    .unwrap();
    let repo = ProfilesRepo::new(pool);
    let builtin = repo.find_by_name(None, "silent").await.unwrap().unwrap();
    assert!(matches!(repo.delete(builtin.id).await, Err(StorageError::Conflict(_))));
}
