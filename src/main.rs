// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pigeon Tracker API Server
//!
//! Accepts pigeon sighting photos, has them counted and described by an AI
//! model, stores confirmed reports in Firebase and serves the live
//! leaderboard, map and CSV export.

use pigeon_tracker::{
    config::Config,
    db::FirestoreDb,
    services::{
        FirebaseTokenVerifier, GeminiAnalyzer, ObjectStore, ReportFeed, ReportGateway,
        UploadPipeline,
    },
    AppState,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Upload sessions untouched for this long are dropped.
const SESSION_TTL_MINUTES: i64 = 60;
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(600);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Pigeon Tracker API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.firebase_project_id)
        .await
        .expect("Failed to connect to Firestore");

    let store = ObjectStore::new(&config.storage_bucket);
    tracing::info!(bucket = %store.bucket(), "Firebase Storage client initialized");

    let token_verifier = Arc::new(
        FirebaseTokenVerifier::new(&config.firebase_project_id)
            .expect("Failed to initialize ID token verifier"),
    );

    // Live report snapshots for the leaderboard, map and export
    let feed = ReportFeed::spawn(db.clone(), config.feed_refresh_interval);
    tracing::info!(
        refresh_secs = config.feed_refresh_interval.as_secs(),
        "Report feed started"
    );

    let analyzer =
        GeminiAnalyzer::new(config.gemini_api_key.clone(), config.analysis_model.clone());
    tracing::info!(model = %analyzer.model_version(), "Photo analyzer initialized");

    let pipeline = UploadPipeline::new(
        analyzer,
        ReportGateway::new(db.clone(), store.clone()),
        config.max_upload_bytes,
    )
    .with_feed_notifier(feed.notifier());

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        store,
        token_verifier,
        pipeline,
        feed,
    });

    spawn_session_sweeper(state.clone());

    // Build router
    let app = pigeon_tracker::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Periodically drop abandoned upload sessions.
fn spawn_session_sweeper(state: Arc<AppState>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let evicted = state.pipeline.evict_stale(
                chrono::Utc::now(),
                chrono::Duration::minutes(SESSION_TTL_MINUTES),
            );
            if evicted > 0 {
                tracing::info!(evicted, "Evicted stale upload sessions");
            }
        }
    });
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pigeon_tracker=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
