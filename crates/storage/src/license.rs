use sqlx::SqlitePool;

use crate::error::StorageResult;
use crate::types::License;

#[derive(Clone)]
pub struct LicenseRepo {
    pool: SqlitePool,
}

impl LicenseRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Only one license is ever active; callers load it once at startup
    /// and again whenever a revalidation completes.
    pub async fn load(&self) -> StorageResult<Option<License>> {
        let row = sqlx::query_as::<_, License>("SELECT * FROM licenses ORDER BY validated_at DESC LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn save(&self, license: &License) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO licenses (license_key, tier, agent_limit, retention_days, alert_limit, validated_at, expires_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(license_key) DO UPDATE SET
                tier = excluded.tier,
                agent_limit = excluded.agent_limit,
                retention_days = excluded.retention_days,
                alert_limit = excluded.alert_limit,
                validated_at = excluded.validated_at,
                expires_at = excluded.expires_at
            "#,
        )
        .bind(&license.license_key)
        .bind(&license.tier)
        .bind(license.agent_limit)
        .bind(license.retention_days)
        .bind(license.alert_limit)
        .bind(&license.validated_at)
        .bind(&license.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "license_tests.rs"]
mod tests;
