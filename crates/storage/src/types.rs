use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct System {
    pub id: i64,
    pub agent_id: String,
    pub name: String,
    pub status: String,
    pub auth_token: Option<String>,
    pub agent_version: Option<String>,
    pub capabilities: String,
    pub config_data: String,
    pub update_interval_ms: i64,
    pub fan_step_percent: i64,
    pub hysteresis_temp: f64,
    pub emergency_temp: f64,
    pub failsafe_speed: i64,
    pub log_level: String,
    pub enable_fan_control: bool,
    pub created_at: String,
    pub updated_at: String,
    pub last_seen_at: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewSystem {
    pub agent_id: String,
    pub name: String,
    pub auth_token: Option<String>,
    pub agent_version: Option<String>,
    pub capabilities: String,
    pub update_interval_ms: i64,
    pub fan_step_percent: i64,
    pub hysteresis_temp: f64,
    pub emergency_temp: f64,
    pub failsafe_speed: i64,
    pub log_level: String,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Sensor {
    pub id: i64,
    pub system_id: i64,
    pub sensor_name: String,
    pub sensor_label: String,
    pub sensor_type: String,
    pub current_temp: Option<f64>,
    pub temp_max: Option<f64>,
    pub temp_crit: Option<f64>,
    pub is_hidden: bool,
}

#[derive(Debug, Clone)]
pub struct SensorUpsert {
    pub sensor_name: String,
    pub sensor_label: String,
    pub sensor_type: String,
    pub temp_max: Option<f64>,
    pub temp_crit: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Fan {
    pub id: i64,
    pub system_id: i64,
    pub fan_name: String,
    pub fan_label: String,
    pub current_rpm: i64,
    pub current_speed: i64,
    pub min_speed: i64,
    pub max_speed: i64,
    pub has_pwm_control: bool,
    pub enabled: bool,
}

#[derive(Debug, Clone)]
pub struct FanUpsert {
    pub fan_name: String,
    pub fan_label: String,
    pub min_speed: i64,
    pub max_speed: i64,
    pub has_pwm_control: bool,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct FanProfile {
    pub id: i64,
    pub system_id: Option<i64>,
    pub profile_name: String,
    pub description: String,
    pub is_builtin: bool,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct CurvePoint {
    pub id: i64,
    pub profile_id: i64,
    pub point_order: i64,
    pub temperature: f64,
    pub fan_speed: i64,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Assignment {
    pub id: i64,
    pub fan_id: i64,
    pub profile_id: i64,
    pub sensor_id: Option<i64>,
    pub sensor_identifier: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistorySample {
    pub system_id: i64,
    pub sensor_id: Option<i64>,
    pub fan_id: Option<i64>,
    pub temperature: Option<f64>,
    pub fan_speed: Option<i64>,
    pub fan_rpm: Option<i64>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct License {
    pub license_key: String,
    pub tier: String,
    pub agent_limit: Option<i64>,
    pub retention_days: i64,
    pub alert_limit: Option<i64>,
    pub validated_at: String,
    pub expires_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct DeploymentTemplate {
    pub token: String,
    pub config: String,
    pub expires_at: String,
    pub used_count: i64,
}
