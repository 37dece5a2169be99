// SPDX-License-Identifier: MIT OR Apache-2.0

//! Historical sensor/fan readings for the dashboard's charts, clamped to
//! the license tier's retention window (spec §4.6, §4.7).

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PankhaError, ServerResult};
use crate::http::load_system;
use crate::state::AppState;

const DEFAULT_WINDOW_HOURS: i64 = 24;
const DEFAULT_RETENTION_DAYS: i64 = 90;

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct HistorySampleView {
    pub sensor_id: Option<i64>,
    pub fan_id: Option<i64>,
    pub temperature: Option<f64>,
    pub fan_speed: Option<i64>,
    pub fan_rpm: Option<i64>,
    pub timestamp: DateTime<Utc>,
}

async fn resolve_range(state: &AppState, query: &RangeQuery) -> ServerResult<(DateTime<Utc>, DateTime<Utc>)> {
    let until = query.until.unwrap_or_else(Utc::now);
    if let Some(since) = query.since {
        if since > until {
            return Err(PankhaError::validation("since must not be after until"));
        }
    }
    let retention_days = state.license.current().await.map(|l| l.retention_days).unwrap_or(DEFAULT_RETENTION_DAYS);
    let earliest_allowed = until - Duration::days(retention_days);
    let since = query.since.unwrap_or_else(|| until - Duration::hours(DEFAULT_WINDOW_HOURS)).max(earliest_allowed);
    Ok((since, until))
}

/// `GET /api/systems/:id/history` — raw samples in `[since, until]`.
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(query): Query<RangeQuery>,
) -> ServerResult<Json<Vec<HistorySampleView>>> {
    let system = load_system(&state.storage, id).await?;
    let (since, until) = resolve_range(&state, &query).await?;

    let samples = state.storage.history.query_range(system.id, since, until).await?;
    Ok(Json(
        samples
            .into_iter()
            .map(|s| HistorySampleView {
                sensor_id: s.sensor_id,
                fan_id: s.fan_id,
                temperature: s.temperature,
                fan_speed: s.fan_speed,
                fan_rpm: s.fan_rpm,
                timestamp: s.timestamp,
            })
            .collect(),
    ))
}

#[derive(Debug, Serialize)]
pub struct ChartSeries {
    pub sensor_id: Option<i64>,
    pub fan_id: Option<i64>,
    pub points: Vec<(DateTime<Utc>, Option<f64>, Option<i64>)>,
}

/// `GET /api/systems/:id/charts` — the same range, grouped into one series
/// per sensor/fan so the dashboard can draw a line per entity without
/// re-grouping client-side.
pub async fn get_charts(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(query): Query<RangeQuery>,
) -> ServerResult<Json<Vec<ChartSeries>>> {
    let system = load_system(&state.storage, id).await?;
    let (since, until) = resolve_range(&state, &query).await?;
    let samples = state.storage.history.query_range(system.id, since, until).await?;

    let mut series: Vec<ChartSeries> = Vec::new();
    for sample in samples {
        let slot = series.iter_mut().find(|s| s.sensor_id == sample.sensor_id && s.fan_id == sample.fan_id);
        let point = (sample.timestamp, sample.temperature, sample.fan_speed);
        match slot {
            Some(existing) => existing.points.push(point),
            None => series.push(ChartSeries { sensor_id: sample.sensor_id, fan_id: sample.fan_id, points: vec![point] }),
        }
    }
    Ok(Json(series))
}

#[cfg(test)]
#[path = "history_tests.rs"]
mod tests;
