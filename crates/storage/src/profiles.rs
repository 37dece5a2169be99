use sqlx::SqlitePool;

use crate::error::{StorageError, StorageResult};
use crate::types::{CurvePoint, FanProfile};

#[derive(Clone)]
pub struct ProfilesRepo {
    pool: SqlitePool,
}

impl ProfilesRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: i64) -> StorageResult<FanProfile> {
        sqlx::query_as::<_, FanProfile>("SELECT * FROM fan_profiles WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("fan profile {id}")))
    }

    pub async fn find_by_name(&self, system_id: Option<i64>, name: &str) -> StorageResult<Option<FanProfile>> {
        let row = sqlx::query_as::<_, FanProfile>(
            "SELECT * FROM fan_profiles WHERE profile_name = ? AND (system_id IS ? OR system_id IS NULL)",
        )
        .bind(name)
        .bind(system_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Profiles visible to a system: its own custom profiles plus the
    /// global built-ins shared across every agent.
    pub async fn list_visible_to(&self, system_id: i64) -> StorageResult<Vec<FanProfile>> {
        let rows = sqlx::query_as::<_, FanProfile>(
            "SELECT * FROM fan_profiles WHERE system_id = ? OR system_id IS NULL ORDER BY is_builtin DESC, profile_name ASC",
        )
        .bind(system_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn create(
        &self,
        system_id: Option<i64>,
        profile_name: &str,
        description: &str,
        curve: &[(f64, i64)],
    ) -> StorageResult<FanProfile> {
        if curve.len() < 2 {
            return Err(StorageError::Conflict(
                "a fan curve needs at least two points".into(),
            ));
        }
        let mut tx = self.pool.begin().await?;

        let profile_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO fan_profiles (system_id, profile_name, description, is_builtin) VALUES (?, ?, ?, 0) RETURNING id",
        )
        .bind(system_id)
        .bind(profile_name)
        .bind(description)
        .fetch_one(&mut *tx)
        .await?;

        for (order, (temperature, fan_speed)) in curve.iter().enumerate() {
            sqlx::query(
                "INSERT INTO fan_curve_points (profile_id, point_order, temperature, fan_speed) VALUES (?, ?, ?, ?)",
            )
            .bind(profile_id)
            .bind(order as i64)
            .bind(temperature)
            .bind(fan_speed)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        self.get(profile_id).await
    }

    pub async fn curve_points(&self, profile_id: i64) -> StorageResult<Vec<CurvePoint>> {
        let rows = sqlx::query_as::<_, CurvePoint>(
            "SELECT * FROM fan_curve_points WHERE profile_id = ? ORDER BY point_order ASC",
        )
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn delete(&self, id: i64) -> StorageResult<()> {
        let profile = self.get(id).await?;
        if profile.is_builtin {
            return Err(StorageError::Conflict("built-in profiles cannot be deleted".into()));
        }
        sqlx::query("DELETE FROM fan_profiles WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "profiles_tests.rs"]
mod tests;
