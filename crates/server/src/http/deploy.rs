// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agent installer distribution (spec §6). Deliberately thin: a deployment
//! template is just the JSON config a fresh agent should register with,
//! handed out behind a short-lived token so the installer script and the
//! binary download can both be unauthenticated one-liners (`curl | sh`).

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{PankhaError, ServerResult};
use crate::state::AppState;

const TOKEN_TTL_HOURS: i64 = 24;
const SUPPORTED_ARCHES: &[&str] = &["x86_64-linux", "aarch64-linux"];

#[derive(Debug, Deserialize)]
pub struct CreateTemplateRequest {
    pub config: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct TemplateResponse {
    pub token: String,
    pub expires_at: String,
    pub installer_url: String,
}

/// `POST /api/deploy/templates` — mints a token an operator can hand to a
/// new host for a one-line install.
pub async fn post_template(State(state): State<Arc<AppState>>, Json(body): Json<CreateTemplateRequest>) -> ServerResult<Json<TemplateResponse>> {
    let token = Uuid::new_v4().to_string();
    let expires_at = Utc::now() + Duration::hours(TOKEN_TTL_HOURS);
    let config = serde_json::to_string(&body.config).map_err(|e| PankhaError::validation(format!("config is not valid JSON: {e}")))?;

    let template = state.storage.deployment.create_template(&token, &config, expires_at).await?;
    Ok(Json(TemplateResponse {
        token: template.token.clone(),
        expires_at: template.expires_at,
        installer_url: format!("/api/deploy/linux?token={}", template.token),
    }))
}

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub token: String,
}

/// `GET /api/deploy/linux?token=...` — a shell script that downloads the
/// right binary and writes out the templated config.
pub async fn get_linux_installer(State(state): State<Arc<AppState>>, Query(query): Query<TokenQuery>) -> ServerResult<Response> {
    let template = state.storage.deployment.consume_token(&query.token).await?;
    let script = format!(
        "#!/bin/sh\nset -e\narch=$(uname -m)\ncurl -fsSL \"$PANKHA_SERVER/api/deploy/binaries/${{arch}}?token={token}\" -o /usr/local/bin/pankha-agent\nchmod +x /usr/local/bin/pankha-agent\ncat > /etc/pankha-agent.json <<'EOF'\n{config}\nEOF\n",
        token = template.token,
        config = template.config,
    );
    Ok(([(header::CONTENT_TYPE, "text/x-shellscript")], script).into_response())
}

/// `GET /api/deploy/binaries/:arch?token=...` — serves the agent binary for
/// the requested architecture. No binary artifacts are bundled with this
/// server, so a valid token on an unknown arch still 404s.
pub async fn get_binary(State(state): State<Arc<AppState>>, Path(arch): Path<String>, Query(query): Query<TokenQuery>) -> ServerResult<Response> {
    state.storage.deployment.consume_token(&query.token).await?;
    if !SUPPORTED_ARCHES.contains(&arch.as_str()) {
        return Err(PankhaError::not_found(format!("no agent binary for architecture {arch}")));
    }
    Err(PankhaError::not_found(format!("agent binary for {arch} is not bundled with this server")))
}

#[cfg(test)]
#[path = "deploy_tests.rs"]
mod tests;
