// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operator-facing key/value settings (spec §6). A small fixed whitelist
//! instead of an open key space, so a typo in a client never silently
//! creates a setting nobody reads.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{PankhaError, ServerResult};
use crate::state::AppState;

const ALLOWED_KEYS: &[&str] = &["controller_update_interval", "graph_history_hours", "data_retention_days", "accent_color", "hover_tint_color"];

fn check_allowed(key: &str) -> ServerResult<()> {
    if ALLOWED_KEYS.contains(&key) {
        Ok(())
    } else {
        Err(PankhaError::validation(format!("{key} is not a recognized setting")))
    }
}

/// `GET /api/settings` — every whitelisted key currently on file.
pub async fn get_all(State(state): State<Arc<AppState>>) -> ServerResult<Json<HashMap<String, String>>> {
    let rows = state.storage.settings.all().await?;
    Ok(Json(rows.into_iter().filter(|(key, _)| ALLOWED_KEYS.contains(&key.as_str())).collect()))
}

/// `PUT /api/settings` — bulk upsert; rejects the whole batch on the first
/// unrecognized key so a typo never partially lands.
pub async fn put_all(State(state): State<Arc<AppState>>, Json(body): Json<HashMap<String, String>>) -> ServerResult<()> {
    for key in body.keys() {
        check_allowed(key)?;
    }
    for (key, value) in &body {
        state.storage.settings.set(key, value).await?;
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct SettingValue {
    pub value: Option<String>,
}

/// `GET /api/settings/:key`
pub async fn get_one(State(state): State<Arc<AppState>>, Path(key): Path<String>) -> ServerResult<Json<SettingValue>> {
    check_allowed(&key)?;
    let value = state.storage.settings.get(&key).await?;
    Ok(Json(SettingValue { value }))
}

#[derive(Debug, Deserialize)]
pub struct PutSettingRequest {
    pub value: String,
}

/// `PUT /api/settings/:key`
pub async fn put_one(State(state): State<Arc<AppState>>, Path(key): Path<String>, Json(body): Json<PutSettingRequest>) -> ServerResult<()> {
    check_allowed(&key)?;
    state.storage.settings.set(&key, &body.value).await?;
    Ok(())
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
