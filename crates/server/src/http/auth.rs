// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bearer-token middleware for the REST surface (spec §6). Agent and browser
//! WebSocket upgrades authenticate inside their own handlers instead, via the
//! `?token=` query parameter, so both paths are exempt here.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::PankhaError;
use crate::state::AppState;

fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    let mut acc = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        acc |= x ^ y;
    }
    acc == 0
}

fn validate_bearer(headers: &HeaderMap, expected: Option<&str>) -> Result<(), PankhaError> {
    let Some(expected) = expected else { return Ok(()) };

    let header = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| PankhaError::unauthorized("missing authorization header"))?;
    let token = header.strip_prefix("Bearer ").ok_or_else(|| PankhaError::unauthorized("malformed authorization header"))?;

    if constant_time_eq(token, expected) {
        Ok(())
    } else {
        Err(PankhaError::unauthorized("invalid bearer token"))
    }
}

/// Exempt: `/api/health` and both WebSocket upgrade paths.
pub async fn auth_layer(State(state): State<Arc<AppState>>, req: Request<axum::body::Body>, next: Next) -> Response {
    let path = req.uri().path();
    if path == "/api/health" || path.starts_with("/ws/") {
        return next.run(req).await;
    }

    if let Err(error) = validate_bearer(req.headers(), state.config.auth_token.as_deref()) {
        return error.into_response();
    }

    next.run(req).await
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
