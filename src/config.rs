// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Firebase and Gemini credentials are injected at process start (Cloud Run
//! secret bindings or a local `.env` file). A missing credential fails
//! startup instead of producing a half-initialized client.

use std::env;
use std::time::Duration;

/// Default Gemini model used for photo analysis.
pub const DEFAULT_ANALYSIS_MODEL: &str = "gemini-2.0-flash";

/// Default upper bound for a raw photo upload (before compression).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Firebase / GCP project ID (Firestore database and ID token audience)
    pub firebase_project_id: String,
    /// Firebase Storage bucket for report photos and avatars
    pub storage_bucket: String,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Gemini model name used for analysis
    pub analysis_model: String,
    /// Interval between background refreshes of the report feed
    pub feed_refresh_interval: Duration,
    /// Largest raw photo accepted by the upload pipeline
    pub max_upload_bytes: usize,

    // --- Secrets ---
    /// Generative Language API key
    pub gemini_api_key: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let feed_refresh_secs = env::var("REPORT_FEED_REFRESH_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(30);

        Ok(Self {
            firebase_project_id: env::var("FIREBASE_PROJECT_ID")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("FIREBASE_PROJECT_ID"))?,
            storage_bucket: env::var("FIREBASE_STORAGE_BUCKET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("FIREBASE_STORAGE_BUCKET"))?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:9002".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            analysis_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| DEFAULT_ANALYSIS_MODEL.to_string()),
            feed_refresh_interval: Duration::from_secs(feed_refresh_secs),
            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),

            gemini_api_key: env::var("GEMINI_API_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("GEMINI_API_KEY"))?,
        })
    }

    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            firebase_project_id: "test-project".to_string(),
            storage_bucket: "test-project.appspot.com".to_string(),
            frontend_url: "http://localhost:9002".to_string(),
            port: 8080,
            analysis_model: DEFAULT_ANALYSIS_MODEL.to_string(),
            feed_refresh_interval: Duration::from_secs(3600),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            gemini_api_key: "test_api_key".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
