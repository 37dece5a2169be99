use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::{StorageError, StorageResult};
use crate::types::{NewSystem, System};

#[derive(Clone)]
pub struct SystemsRepo {
    pool: SqlitePool,
}

impl SystemsRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_by_agent_id(&self, agent_id: &str) -> StorageResult<Option<System>> {
        let row = sqlx::query_as::<_, System>("SELECT * FROM systems WHERE agent_id = ?")
            .bind(agent_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn get(&self, id: i64) -> StorageResult<System> {
        sqlx::query_as::<_, System>("SELECT * FROM systems WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("system {id}")))
    }

    pub async fn list(&self) -> StorageResult<Vec<System>> {
        let rows = sqlx::query_as::<_, System>("SELECT * FROM systems ORDER BY created_at ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Agent ids ordered oldest-registered first, used by license admission
    /// to decide which systems keep an active slot when `agent_limit` is
    /// lower than the number of systems on file.
    pub async fn admission_order(&self) -> StorageResult<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT agent_id FROM systems ORDER BY created_at ASC")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    pub async fn register(&self, new: NewSystem) -> StorageResult<System> {
        let now = Utc::now().to_rfc3339();
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO systems (
                agent_id, name, status, auth_token, agent_version, capabilities,
                update_interval_ms, fan_step_percent, hysteresis_temp, emergency_temp,
                failsafe_speed, log_level, created_at, updated_at, last_seen_at
            ) VALUES (?, ?, 'online', ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(agent_id) DO UPDATE SET
                name = excluded.name,
                status = 'online',
                auth_token = excluded.auth_token,
                agent_version = excluded.agent_version,
                capabilities = excluded.capabilities,
                update_interval_ms = excluded.update_interval_ms,
                fan_step_percent = excluded.fan_step_percent,
                hysteresis_temp = excluded.hysteresis_temp,
                emergency_temp = excluded.emergency_temp,
                failsafe_speed = excluded.failsafe_speed,
                log_level = excluded.log_level,
                updated_at = excluded.updated_at,
                last_seen_at = excluded.last_seen_at
            RETURNING id
            "#,
        )
        .bind(&new.agent_id)
        .bind(&new.name)
        .bind(&new.auth_token)
        .bind(&new.agent_version)
        .bind(&new.capabilities)
        .bind(new.update_interval_ms)
        .bind(new.fan_step_percent)
        .bind(new.hysteresis_temp)
        .bind(new.emergency_temp)
        .bind(new.failsafe_speed)
        .bind(&new.log_level)
        .bind(&now)
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool)
        .await?;

        self.get(id).await
    }

    pub async fn mark_status(&self, agent_id: &str, status: &str) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE systems SET status = ?, updated_at = ?, last_seen_at = ? WHERE agent_id = ?")
            .bind(status)
            .bind(&now)
            .bind(&now)
            .bind(agent_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn rename(&self, agent_id: &str, name: &str) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query("UPDATE systems SET name = ?, updated_at = ? WHERE agent_id = ?")
            .bind(name)
            .bind(&now)
            .bind(agent_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("system {agent_id}")));
        }
        Ok(())
    }

    pub async fn set_update_interval_ms(&self, agent_id: &str, value: i64) -> StorageResult<()> {
        self.touch_i64("update_interval_ms", agent_id, value).await
    }

    pub async fn set_fan_step_percent(&self, agent_id: &str, value: i64) -> StorageResult<()> {
        self.touch_i64("fan_step_percent", agent_id, value).await
    }

    pub async fn set_failsafe_speed(&self, agent_id: &str, value: i64) -> StorageResult<()> {
        self.touch_i64("failsafe_speed", agent_id, value).await
    }

    pub async fn set_hysteresis_temp(&self, agent_id: &str, value: f64) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE systems SET hysteresis_temp = ?, updated_at = ? WHERE agent_id = ?")
            .bind(value)
            .bind(&now)
            .bind(agent_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_emergency_temp(&self, agent_id: &str, value: f64) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE systems SET emergency_temp = ?, updated_at = ? WHERE agent_id = ?")
            .bind(value)
            .bind(&now)
            .bind(agent_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_log_level(&self, agent_id: &str, value: &str) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE systems SET log_level = ?, updated_at = ? WHERE agent_id = ?")
            .bind(value)
            .bind(&now)
            .bind(agent_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_enable_fan_control(&self, agent_id: &str, enabled: bool) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE systems SET enable_fan_control = ?, updated_at = ? WHERE agent_id = ?")
            .bind(enabled)
            .bind(&now)
            .bind(agent_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn touch_i64(&self, column: &'static str, agent_id: &str, value: i64) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let sql = format!("UPDATE systems SET {column} = ?, updated_at = ? WHERE agent_id = ?");
        sqlx::query(&sql)
            .bind(value)
            .bind(&now)
            .bind(agent_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, agent_id: &str) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM systems WHERE agent_id = ?")
            .bind(agent_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("system {agent_id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "systems_tests.rs"]
mod tests;
