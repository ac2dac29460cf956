// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Report collection views: list, live stream, CSV export, leaderboard and map.

use crate::error::{AppError, Result};
use crate::models::{calculate_leaderboard, LeaderboardEntry, PigeonReport};
use crate::services::export::{reports_to_csv, CSV_FILENAME};
use crate::services::{MapView, ReportSnapshot};
use crate::AppState;
use axum::{
    extract::State,
    http::header,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    routing::get,
    Json, Router,
};
use futures_util::{Stream, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// How long a request waits for the feed's first load.
const FIRST_LOAD_TIMEOUT: Duration = Duration::from_secs(5);

/// Report routes (require authentication).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/reports", get(list_reports))
        .route("/api/reports/stream", get(stream_reports))
        .route("/api/reports/export.csv", get(export_csv))
        .route("/api/leaderboard", get(get_leaderboard))
        .route("/api/map", get(get_map))
        .route("/api/map/geojson", get(get_map_geojson))
        .route("/api/map/stream", get(stream_map))
}

/// Latest snapshot, waiting briefly for the first load if needed.
async fn loaded_snapshot(state: &AppState) -> Result<ReportSnapshot> {
    let current = state.feed.current();
    if current.loaded {
        return Ok(current);
    }

    let mut subscription = state.feed.subscribe();
    state.feed.refresh();

    match tokio::time::timeout(FIRST_LOAD_TIMEOUT, subscription.next()).await {
        Ok(Some(snapshot)) => Ok(snapshot),
        Ok(None) | Err(_) => Err(AppError::Unavailable(
            "Reports are still loading".to_string(),
        )),
    }
}

// ─── Reports ─────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ReportsResponse {
    pub reports: Vec<PigeonReport>,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub version: u64,
}

impl From<&ReportSnapshot> for ReportsResponse {
    fn from(snapshot: &ReportSnapshot) -> Self {
        Self {
            reports: snapshot.reports.as_ref().clone(),
            version: snapshot.version,
        }
    }
}

/// All reports, most recent first.
async fn list_reports(State(state): State<Arc<AppState>>) -> Result<Json<ReportsResponse>> {
    let snapshot = loaded_snapshot(&state).await?;
    Ok(Json(ReportsResponse::from(&snapshot)))
}

/// Server-sent `reports` events, one full snapshot per change.
async fn stream_reports(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = std::result::Result<Event, axum::Error>>> {
    let stream = state.feed.subscribe().into_stream().map(|snapshot| {
        Event::default()
            .event("reports")
            .id(snapshot.version.to_string())
            .json_data(ReportsResponse::from(&snapshot))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// CSV export of every report.
async fn export_csv(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse> {
    let snapshot = loaded_snapshot(&state).await?;
    let csv = reports_to_csv(&snapshot.reports);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", CSV_FILENAME),
            ),
        ],
        csv,
    ))
}

// ─── Leaderboard ─────────────────────────────────────────────

async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<LeaderboardEntry>>> {
    let snapshot = loaded_snapshot(&state).await?;
    Ok(Json(calculate_leaderboard(&snapshot.reports)))
}

// ─── Map ─────────────────────────────────────────────────────

async fn get_map(State(state): State<Arc<AppState>>) -> Result<Json<MapView>> {
    let snapshot = loaded_snapshot(&state).await?;
    Ok(Json(MapView::from_reports(&snapshot.reports)))
}

async fn get_map_geojson(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse> {
    let snapshot = loaded_snapshot(&state).await?;
    let collection = MapView::from_reports(&snapshot.reports).to_geojson();
    let body = serde_json::to_string(&collection).map_err(anyhow::Error::from)?;

    Ok(([(header::CONTENT_TYPE, "application/geo+json")], body))
}

/// Server-sent `map` events. Each connection owns one map view that is
/// re-synced on every snapshot.
async fn stream_map(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = std::result::Result<Event, axum::Error>>> {
    let mut view = MapView::new();
    let stream = state
        .feed
        .subscribe()
        .into_stream()
        .map(move |snapshot| {
            view.sync(&snapshot.reports);
            Event::default()
                .event("map")
                .id(snapshot.version.to_string())
                .json_data(&view)
        });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
