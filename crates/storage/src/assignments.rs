use sqlx::SqlitePool;

use crate::error::{StorageError, StorageResult};
use crate::types::Assignment;

#[derive(Clone)]
pub struct AssignmentsRepo {
    pool: SqlitePool,
}

impl AssignmentsRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn active_for_fan(&self, fan_id: i64) -> StorageResult<Option<Assignment>> {
        let row = sqlx::query_as::<_, Assignment>(
            "SELECT * FROM fan_profile_assignments WHERE fan_id = ? AND is_active = 1",
        )
        .bind(fan_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn list_for_system(&self, system_id: i64) -> StorageResult<Vec<Assignment>> {
        let rows = sqlx::query_as::<_, Assignment>(
            r#"
            SELECT a.* FROM fan_profile_assignments a
            JOIN fans f ON f.id = a.fan_id
            WHERE f.system_id = ? AND a.is_active = 1
            "#,
        )
        .bind(system_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Makes `profile_id` the active assignment for `fan_id`, deactivating
    /// whatever was previously assigned. The partial unique index on
    /// `(fan_id) WHERE is_active = 1` is what actually enforces "at most
    /// one active assignment" — this method just keeps the prior row
    /// around (deactivated) as assignment history instead of deleting it.
    pub async fn set_active(
        &self,
        fan_id: i64,
        profile_id: i64,
        sensor_id: Option<i64>,
        sensor_identifier: Option<&str>,
    ) -> StorageResult<Assignment> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE fan_profile_assignments SET is_active = 0 WHERE fan_id = ? AND is_active = 1")
            .bind(fan_id)
            .execute(&mut *tx)
            .await?;

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO fan_profile_assignments (fan_id, profile_id, sensor_id, sensor_identifier, is_active)
            VALUES (?, ?, ?, ?, 1)
            RETURNING id
            "#,
        )
        .bind(fan_id)
        .bind(profile_id)
        .bind(sensor_id)
        .bind(sensor_identifier)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        sqlx::query_as::<_, Assignment>("SELECT * FROM fan_profile_assignments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("assignment {id}")))
    }

    pub async fn clear(&self, fan_id: i64) -> StorageResult<()> {
        sqlx::query("UPDATE fan_profile_assignments SET is_active = 0 WHERE fan_id = ? AND is_active = 1")
            .bind(fan_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "assignments_tests.rs"]
mod tests;
