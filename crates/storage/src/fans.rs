use sqlx::SqlitePool;

use crate::error::{StorageError, StorageResult};
use crate::types::{Fan, FanUpsert};

#[derive(Clone)]
pub struct FansRepo {
    pool: SqlitePool,
}

impl FansRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list_for_system(&self, system_id: i64) -> StorageResult<Vec<Fan>> {
        let rows = sqlx::query_as::<_, Fan>(
            "SELECT * FROM fans WHERE system_id = ? ORDER BY fan_name ASC",
        )
        .bind(system_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get(&self, id: i64) -> StorageResult<Fan> {
        sqlx::query_as::<_, Fan>("SELECT * FROM fans WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("fan {id}")))
    }

    pub async fn upsert(&self, system_id: i64, fan: &FanUpsert) -> StorageResult<Fan> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO fans (system_id, fan_name, fan_label, min_speed, max_speed, has_pwm_control)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(system_id, fan_name) DO UPDATE SET
                fan_label = excluded.fan_label,
                min_speed = excluded.min_speed,
                max_speed = excluded.max_speed,
                has_pwm_control = excluded.has_pwm_control
            RETURNING id
            "#,
        )
        .bind(system_id)
        .bind(&fan.fan_name)
        .bind(&fan.fan_label)
        .bind(fan.min_speed)
        .bind(fan.max_speed)
        .bind(fan.has_pwm_control)
        .fetch_one(&self.pool)
        .await?;

        self.get(id).await
    }

    pub async fn update_reading(&self, id: i64, rpm: i64, speed: i64) -> StorageResult<()> {
        sqlx::query("UPDATE fans SET current_rpm = ?, current_speed = ? WHERE id = ?")
            .bind(rpm)
            .bind(speed)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_enabled(&self, id: i64, enabled: bool) -> StorageResult<()> {
        let result = sqlx::query("UPDATE fans SET enabled = ? WHERE id = ?")
            .bind(enabled)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("fan {id}")));
        }
        Ok(())
    }

    pub async fn set_label(&self, id: i64, label: &str) -> StorageResult<()> {
        let result = sqlx::query("UPDATE fans SET fan_label = ? WHERE id = ?")
            .bind(label)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("fan {id}")));
        }
        Ok(())
    }

    pub async fn find_by_name(&self, system_id: i64, fan_name: &str) -> StorageResult<Option<Fan>> {
        let row = sqlx::query_as::<_, Fan>("SELECT * FROM fans WHERE system_id = ? AND fan_name = ?")
            .bind(system_id)
            .bind(fan_name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }
}

#[cfg(test)]
#[path = "fans_tests.rs"]
mod tests;
