use sqlx::SqlitePool;

use crate::error::StorageResult;

#[derive(Clone)]
pub struct VisibilityRepo {
    pool: SqlitePool,
}

impl VisibilityRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn set_hidden(&self, system_id: i64, group_name: &str, hidden: bool) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sensor_group_visibility (system_id, group_name, is_hidden) VALUES (?, ?, ?)
            ON CONFLICT(system_id, group_name) DO UPDATE SET is_hidden = excluded.is_hidden
            "#,
        )
        .bind(system_id)
        .bind(group_name)
        .bind(hidden)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn hidden_groups(&self, system_id: i64) -> StorageResult<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT group_name FROM sensor_group_visibility WHERE system_id = ? AND is_hidden = 1",
        )
        .bind(system_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }
}

#[cfg(test)]
#[path = "visibility_tests.rs"]
mod tests;
