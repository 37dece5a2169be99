// SPDX-License-Identifier: MIT OR Apache-2.0

//! License/admission policy (spec §4.6): a cached tier decision that gates
//! which agents the controller is allowed to actuate.

use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tokio::sync::RwLock;

use pankha_storage::types::License;
use pankha_storage::Storage;

use crate::error::{PankhaError, ServerResult};
use crate::gateway::registry::AgentRegistry;

/// How long a cached decision is authoritative without talking to the
/// validator again.
pub const CACHE_FRESHNESS: ChronoDuration = ChronoDuration::hours(24);

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedLicense {
    pub tier: String,
    pub agent_limit: Option<i64>,
    pub retention_days: i64,
    pub alert_limit: Option<i64>,
    pub expires_at: Option<String>,
}

/// Talks to the remote entitlement service. The HTTP implementation is what
/// ships; tests supply a canned one instead of reaching the network.
pub trait LicenseValidator: Send + Sync {
    fn validate(&self, license_key: &str) -> impl std::future::Future<Output = ServerResult<ValidatedLicense>> + Send;
}

/// Default validator, used whenever `PANKHA_LICENSE_VALIDATOR_URL` is set.
pub struct HttpLicenseValidator {
    client: reqwest::Client,
    base_url: String,
}

impl HttpLicenseValidator {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), base_url: base_url.into() }
    }
}

#[derive(serde::Deserialize)]
struct ValidateResponse {
    tier: String,
    agent_limit: Option<i64>,
    retention_days: i64,
    alert_limit: Option<i64>,
    expires_at: Option<String>,
}

impl LicenseValidator for HttpLicenseValidator {
    async fn validate(&self, license_key: &str) -> ServerResult<ValidatedLicense> {
        let url = format!("{}/v1/licenses/{license_key}/validate", self.base_url);
        let response = self
            .client
            .post(&url)
            .send()
            .await
            .map_err(|e| PankhaError::license(format!("validator unreachable: {e}")))?;
        if !response.status().is_success() {
            return Err(PankhaError::license(format!("validator returned {}", response.status())));
        }
        let body: ValidateResponse = response.json().await.map_err(|e| PankhaError::license(format!("malformed validator response: {e}")))?;
        Ok(ValidatedLicense {
            tier: body.tier,
            agent_limit: body.agent_limit,
            retention_days: body.retention_days,
            alert_limit: body.alert_limit,
            expires_at: body.expires_at,
        })
    }
}

/// Always-free fallback used when no validator URL is configured: grants an
/// unlimited tier so self-hosted deployments without a license key still work.
pub struct UnlimitedValidator;

impl LicenseValidator for UnlimitedValidator {
    async fn validate(&self, _license_key: &str) -> ServerResult<ValidatedLicense> {
        Ok(ValidatedLicense { tier: "unlimited".into(), agent_limit: None, retention_days: 90, alert_limit: None, expires_at: None })
    }
}

/// Holds the single cached license row in memory, refreshed at boot and
/// whenever an operator re-validates explicitly.
pub struct LicenseCache {
    current: RwLock<Option<License>>,
}

impl LicenseCache {
    pub fn new() -> Self {
        Self { current: RwLock::new(None) }
    }

    pub async fn current(&self) -> Option<License> {
        self.current.read().await.clone()
    }

    pub async fn agent_limit(&self) -> Option<i64> {
        self.current.read().await.as_ref().and_then(|l| l.agent_limit)
    }

    /// Loads the persisted license row and, if it's stale (or missing),
    /// attempts to revalidate. A remote failure falls back to whatever was
    /// on file — degraded, never a hard failure (spec §7 `LicenseError`).
    pub async fn boot_load(&self, storage: &Storage, validator: &impl LicenseValidator, license_key: &str) -> ServerResult<()> {
        let cached = storage.license.load().await?;
        let is_fresh = cached.as_ref().is_some_and(|license| is_fresh(license));

        if is_fresh {
            *self.current.write().await = cached;
            return Ok(());
        }

        match validator.validate(license_key).await {
            Ok(validated) => {
                let license = License {
                    license_key: license_key.to_string(),
                    tier: validated.tier,
                    agent_limit: validated.agent_limit,
                    retention_days: validated.retention_days,
                    alert_limit: validated.alert_limit,
                    validated_at: Utc::now().to_rfc3339(),
                    expires_at: validated.expires_at,
                };
                storage.license.save(&license).await?;
                *self.current.write().await = Some(license);
                Ok(())
            }
            Err(error) => {
                if let Some(cached) = cached {
                    tracing::warn!(%error, "license validator unreachable, honoring stale cache");
                    *self.current.write().await = Some(cached);
                    Ok(())
                } else {
                    Err(error)
                }
            }
        }
    }

    /// Whether `agent_id` is read-only under the current license, per the
    /// admission ordering over every known system.
    pub async fn is_agent_read_only(&self, storage: &Storage, agent_id: &str) -> ServerResult<bool> {
        let agent_limit = self.agent_limit().await;
        let admission_order = storage.systems.admission_order().await?;
        let statuses = AgentRegistry::read_only_status(&admission_order, agent_limit);
        Ok(statuses.get(agent_id).copied().unwrap_or(false))
    }
}

impl Default for LicenseCache {
    fn default() -> Self {
        Self::new()
    }
}

fn is_fresh(license: &License) -> bool {
    DateTime::parse_from_rfc3339(&license.validated_at)
        .map(|validated_at| Utc::now() - validated_at.with_timezone(&Utc) < CACHE_FRESHNESS)
        .unwrap_or(false)
}

/// Wraps a `LicenseCache` and the broadcaster hook so the boot-load/refresh
/// path can notify subscribers of a license change (spec §4.6). Kept as a
/// free function rather than a method on `LicenseCache` to keep the cache
/// itself decoupled from the aggregator.
pub async fn refresh_and_notify(
    cache: &LicenseCache,
    storage: &Storage,
    aggregator: &crate::aggregator::Aggregator,
    validator: &impl LicenseValidator,
    license_key: &str,
) -> ServerResult<()> {
    let before = cache.current().await;
    cache.boot_load(storage, validator, license_key).await?;
    let after = cache.current().await;

    if before.as_ref().map(|l| (&l.tier, l.agent_limit)) != after.as_ref().map(|l| (&l.tier, l.agent_limit)) {
        if let Some(license) = &after {
            aggregator.notify_license_changed(&license.tier, license.agent_limit.map(|n| n.max(0) as u32));
        }
    }
    Ok(())
}

#[allow(dead_code)]
fn _type_check_arc(_: Arc<LicenseCache>) {}

#[cfg(test)]
#[path = "license_tests.rs"]
mod tests;
