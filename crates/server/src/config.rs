// SPDX-License-Identifier: MIT OR Apache-2.0

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the pankha central server.
#[derive(Debug, Clone, clap::Args)]
pub struct ServerConfig {
    /// Host to bind on.
    #[arg(long, default_value = "0.0.0.0", env = "PANKHA_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 7340, env = "PANKHA_PORT")]
    pub port: u16,

    /// Bearer token for the REST API. If unset, auth is disabled.
    #[arg(long, env = "PANKHA_AUTH_TOKEN")]
    pub auth_token: Option<String>,

    /// Path to the SQLite database file.
    #[arg(long, default_value = "pankha.db", env = "PANKHA_DB_PATH")]
    pub db_path: PathBuf,

    /// Default controller tick interval in milliseconds (range 500-60000).
    #[arg(long, default_value_t = 2000, env = "PANKHA_CONTROLLER_TICK_MS")]
    pub controller_tick_ms: u64,

    /// Default fan-step percent for newly registered systems.
    #[arg(long, default_value_t = 5, env = "PANKHA_DEFAULT_FAN_STEP")]
    pub default_fan_step_percent: u8,

    /// Default hysteresis band (degrees C) for newly registered systems.
    #[arg(long, default_value_t = 3.0, env = "PANKHA_DEFAULT_HYSTERESIS")]
    pub default_hysteresis_temp: f64,

    /// Multiplier applied to a system's `update_interval_ms` to derive the
    /// heartbeat deadline; the deadline floor is 15s regardless.
    #[arg(long, default_value_t = 3, env = "PANKHA_HEARTBEAT_MULTIPLIER")]
    pub heartbeat_multiplier: u32,

    /// Bounded capacity of the history write queue.
    #[arg(long, default_value_t = 4096, env = "PANKHA_HISTORY_QUEUE_CAPACITY")]
    pub history_queue_capacity: usize,

    /// Interval, in seconds, of the periodic full-resync broadcast.
    #[arg(long, default_value_t = 300, env = "PANKHA_FULL_RESYNC_SECS")]
    pub full_resync_secs: u64,

    /// URL of the remote license validator.
    #[arg(long, env = "PANKHA_LICENSE_VALIDATOR_URL")]
    pub license_validator_url: Option<String>,

    /// License key to present to the validator. Unset means self-hosted,
    /// unlimited operation.
    #[arg(long, env = "PANKHA_LICENSE_KEY")]
    pub license_key: Option<String>,
}

impl ServerConfig {
    pub fn controller_tick_interval(&self) -> Duration {
        Duration::from_millis(self.controller_tick_ms.clamp(500, 60_000))
    }

    pub fn full_resync_interval(&self) -> Duration {
        Duration::from_secs(self.full_resync_secs)
    }

    pub fn heartbeat_deadline(&self, update_interval_ms: i64) -> Duration {
        let scaled = update_interval_ms.max(0) as u64 * self.heartbeat_multiplier as u64;
        Duration::from_millis(scaled).max(Duration::from_secs(15))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
