use sqlx::SqlitePool;

use crate::error::{StorageError, StorageResult};
use crate::types::{Sensor, SensorUpsert};

#[derive(Clone)]
pub struct SensorsRepo {
    pool: SqlitePool,
}

impl SensorsRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list_for_system(&self, system_id: i64) -> StorageResult<Vec<Sensor>> {
        let rows = sqlx::query_as::<_, Sensor>(
            "SELECT * FROM sensors WHERE system_id = ? ORDER BY sensor_name ASC",
        )
        .bind(system_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get(&self, id: i64) -> StorageResult<Sensor> {
        sqlx::query_as::<_, Sensor>("SELECT * FROM sensors WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("sensor {id}")))
    }

    /// Inserts newly discovered sensors and refreshes label/type/limits for
    /// ones already on file; never removes a sensor that stops reporting,
    /// since hidden/disconnected sensors still keep their curve assignments.
    pub async fn upsert(&self, system_id: i64, sensor: &SensorUpsert) -> StorageResult<Sensor> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO sensors (system_id, sensor_name, sensor_label, sensor_type, temp_max, temp_crit)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(system_id, sensor_name) DO UPDATE SET
                sensor_label = excluded.sensor_label,
                sensor_type = excluded.sensor_type,
                temp_max = excluded.temp_max,
                temp_crit = excluded.temp_crit
            RETURNING id
            "#,
        )
        .bind(system_id)
        .bind(&sensor.sensor_name)
        .bind(&sensor.sensor_label)
        .bind(&sensor.sensor_type)
        .bind(sensor.temp_max)
        .bind(sensor.temp_crit)
        .fetch_one(&self.pool)
        .await?;

        self.get(id).await
    }

    pub async fn update_reading(&self, id: i64, temperature: f64) -> StorageResult<()> {
        sqlx::query("UPDATE sensors SET current_temp = ? WHERE id = ?")
            .bind(temperature)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_hidden(&self, id: i64, hidden: bool) -> StorageResult<()> {
        sqlx::query("UPDATE sensors SET is_hidden = ? WHERE id = ?")
            .bind(hidden)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_label(&self, id: i64, label: &str) -> StorageResult<()> {
        let result = sqlx::query("UPDATE sensors SET sensor_label = ? WHERE id = ?")
            .bind(label)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("sensor {id}")));
        }
        Ok(())
    }

    pub async fn find_by_label_prefix(&self, system_id: i64, prefix: &str) -> StorageResult<Vec<Sensor>> {
        let pattern = format!("{prefix}%");
        let rows = sqlx::query_as::<_, Sensor>(
            "SELECT * FROM sensors WHERE system_id = ? AND sensor_label LIKE ? ORDER BY sensor_name ASC",
        )
        .bind(system_id)
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
#[path = "sensors_tests.rs"]
mod tests;
