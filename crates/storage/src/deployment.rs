use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::{StorageError, StorageResult};
use crate::types::DeploymentTemplate;

#[derive(Clone)]
pub struct DeploymentRepo {
    pool: SqlitePool,
}

impl DeploymentRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_template(
        &self,
        token: &str,
        config: &str,
        expires_at: chrono::DateTime<Utc>,
    ) -> StorageResult<DeploymentTemplate> {
        sqlx::query(
            "INSERT INTO deployment_templates (token, config, expires_at, used_count) VALUES (?, ?, ?, 0)",
        )
        .bind(token)
        .bind(config)
        .bind(expires_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        sqlx::query_as::<_, DeploymentTemplate>("SELECT * FROM deployment_templates WHERE token = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("deployment template {token}")))
    }

    /// Atomically bumps `used_count` and returns the template, so long as
    /// it hasn't expired. A single-use template can still be consumed more
    /// than once; expiry, not a one-shot flag, is what bounds reuse.
    pub async fn consume_token(&self, token: &str) -> StorageResult<DeploymentTemplate> {
        let template = sqlx::query_as::<_, DeploymentTemplate>(
            "SELECT * FROM deployment_templates WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StorageError::NotFound(format!("deployment template {token}")))?;

        let expires_at = chrono::DateTime::parse_from_rfc3339(&template.expires_at)
            .map_err(|e| StorageError::Conflict(format!("corrupt expires_at for {token}: {e}")))?;
        if expires_at < Utc::now() {
            return Err(StorageError::Conflict(format!("deployment token {token} has expired")));
        }

        sqlx::query("UPDATE deployment_templates SET used_count = used_count + 1 WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(DeploymentTemplate {
            used_count: template.used_count + 1,
            ..template
        })
    }
}

#[cfg(test)]
#[path = "deployment_tests.rs"]
mod tests;
