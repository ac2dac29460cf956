// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::Response;
use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header};
use pigeon_tracker::config::Config;
use pigeon_tracker::db::FirestoreDb;
use pigeon_tracker::error::AppError;
use pigeon_tracker::models::PigeonReport;
use pigeon_tracker::routes::create_router;
use pigeon_tracker::services::{
    FirebaseTokenVerifier, GeminiAnalyzer, ObjectStore, ReportFeed, ReportGateway, ReportSource,
    UploadPipeline,
};
use pigeon_tracker::AppState;
use serde_json::json;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// HS256 secret shared by the static verifier and `create_test_token`.
#[allow(dead_code)]
pub const TEST_TOKEN_SECRET: &[u8] = b"pigeon-tracker-test-secret";
#[allow(dead_code)]
pub const TEST_KID: &str = "test-kid";

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Fixed report collection for the feed.
#[derive(Clone, Default)]
pub struct StaticReports(pub Vec<PigeonReport>);

impl ReportSource for StaticReports {
    async fn list_reports(&self) -> Result<Vec<PigeonReport>, AppError> {
        Ok(self.0.clone())
    }
}

/// Create a Firebase-style ID token signed with the test secret.
#[allow(dead_code)]
pub fn create_test_token(user_id: &str, email: &str, email_verified: bool) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let project = Config::test_default().firebase_project_id;

    let claims = json!({
        "iss": format!("https://securetoken.google.com/{}", project),
        "aud": project,
        "sub": user_id,
        "iat": now,
        "auth_time": now,
        "exp": now + 3600,
        "email": email,
        "email_verified": email_verified,
    });

    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(TEST_KID.to_string());
    encode(&header, &claims, &EncodingKey::from_secret(TEST_TOKEN_SECRET)).unwrap()
}

/// Sample report with a valid shape.
#[allow(dead_code)]
pub fn sample_report(id: &str, user_id: &str, pigeon_count: u32, timestamp: &str) -> PigeonReport {
    PigeonReport {
        id: id.to_string(),
        user_id: user_id.to_string(),
        user_email: format!("{}@example.com", user_id),
        alias: pigeon_tracker::services::generate_alias(user_id),
        timestamp: timestamp.to_string(),
        location: "-38.71830, -62.26610".to_string(),
        pigeon_count,
        ai_description: "Palomas en la plaza.".to_string(),
        photo_url: "https://example.com/photo.jpg".to_string(),
        photo_hash: "0".repeat(64),
        model_version: "googleai/gemini-2.0-flash".to_string(),
    }
}

/// Options for building a test app.
#[derive(Default)]
pub struct TestAppOptions {
    /// Reports served by the feed
    pub reports: Vec<PigeonReport>,
    /// Base URL of a fake Generative Language endpoint
    pub analyzer_base_url: Option<String>,
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with(TestAppOptions::default())
}

/// Create a test app with a fixed report collection and optional fake
/// analyzer endpoint. Must be called inside a Tokio runtime.
#[allow(dead_code)]
pub fn create_test_app_with(options: TestAppOptions) -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = test_db_offline();
    let store = ObjectStore::new_mock(&config.storage_bucket);

    let token_verifier = Arc::new(
        FirebaseTokenVerifier::new_with_static_key(
            &config.firebase_project_id,
            TEST_KID,
            Algorithm::HS256,
            DecodingKey::from_secret(TEST_TOKEN_SECRET),
        )
        .unwrap(),
    );

    let feed = ReportFeed::spawn(StaticReports(options.reports), config.feed_refresh_interval);

    let mut analyzer =
        GeminiAnalyzer::new(config.gemini_api_key.clone(), config.analysis_model.clone());
    if let Some(base_url) = options.analyzer_base_url {
        analyzer = analyzer.with_base_url(base_url);
    }

    let pipeline = UploadPipeline::new(
        analyzer,
        ReportGateway::new(db.clone(), store.clone()),
        config.max_upload_bytes,
    )
    .with_feed_notifier(feed.notifier());

    let state = Arc::new(AppState {
        config,
        db,
        store,
        token_verifier,
        pipeline,
        feed,
    });

    (create_router(state.clone()), state)
}

/// Serve a canned `generateContent` reply on a local port.
///
/// Returns the base URL to hand to `GeminiAnalyzer::with_base_url`.
#[allow(dead_code)]
pub async fn spawn_fake_gemini(status: u16, body: serde_json::Value) -> String {
    use axum::http::StatusCode;
    use axum::routing::post;

    let status = StatusCode::from_u16(status).unwrap();
    let app = axum::Router::new().route(
        "/models/{*rest}",
        post(move || {
            let body = body.clone();
            async move { (status, axum::Json(body)) }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

/// Model reply in the shape the analyzer requests.
#[allow(dead_code)]
pub fn gemini_reply(pigeon_count: i64, description: &str) -> serde_json::Value {
    let text = json!({ "pigeonCount": pigeon_count, "photoDescription": description }).to_string();
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }],
        "modelVersion": "gemini-2.0-flash"
    })
}

/// Small valid PNG.
#[allow(dead_code)]
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 90]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Read a response body as text.
#[allow(dead_code)]
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
