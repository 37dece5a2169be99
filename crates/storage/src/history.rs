use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::StorageResult;
use crate::types::HistorySample;

#[derive(Clone)]
pub struct HistoryRepo {
    pool: SqlitePool,
}

impl HistoryRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Bulk insert in one transaction; this is what the aggregator's
    /// periodic flush calls, so batching keeps the write amplification
    /// down to one fsync per flush interval rather than one per sample.
    pub async fn insert_batch(&self, samples: &[HistorySample]) -> StorageResult<()> {
        if samples.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await?;
        for sample in samples {
            sqlx::query(
                r#"
                INSERT INTO monitoring_data
                    (system_id, sensor_id, fan_id, temperature, fan_speed, fan_rpm, timestamp)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(sample.system_id)
            .bind(sample.sensor_id)
            .bind(sample.fan_id)
            .bind(sample.temperature)
            .bind(sample.fan_speed)
            .bind(sample.fan_rpm)
            .bind(sample.timestamp.to_rfc3339())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn query_range(
        &self,
        system_id: i64,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> StorageResult<Vec<HistorySample>> {
        let rows: Vec<(i64, Option<i64>, Option<i64>, Option<f64>, Option<i64>, Option<i64>, String)> =
            sqlx::query_as(
                r#"
                SELECT system_id, sensor_id, fan_id, temperature, fan_speed, fan_rpm, timestamp
                FROM monitoring_data
                WHERE system_id = ? AND timestamp >= ? AND timestamp <= ?
                ORDER BY timestamp ASC
                "#,
            )
            .bind(system_id)
            .bind(since.to_rfc3339())
            .bind(until.to_rfc3339())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(system_id, sensor_id, fan_id, temperature, fan_speed, fan_rpm, timestamp)| {
                DateTime::parse_from_rfc3339(&timestamp)
                    .ok()
                    .map(|ts| HistorySample {
                        system_id,
                        sensor_id,
                        fan_id,
                        temperature,
                        fan_speed,
                        fan_rpm,
                        timestamp: ts.with_timezone(&Utc),
                    })
            })
            .collect())
    }

    /// Deletes rows older than the license's retention window. Returns the
    /// number of rows purged so the caller can log it.
    pub async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> StorageResult<u64> {
        let result = sqlx::query("DELETE FROM monitoring_data WHERE timestamp < ?")
            .bind(cutoff.to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
#[path = "history_tests.rs"]
mod tests;
