// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase Storage client.
//!
//! Uploads go through the Firebase Storage REST API with the caller's own
//! ID token, so the bucket's security rules apply exactly as they would to
//! the web client.

use dashmap::DashMap;
use serde::Deserialize;
use std::sync::Arc;

const FIREBASE_STORAGE_URL: &str = "https://firebasestorage.googleapis.com/v0";

/// Storage key for a report photo.
pub fn report_photo_path(photo_hash: &str) -> String {
    format!("pigeon_reports/{}.jpg", photo_hash)
}

/// Storage key for a profile picture.
pub fn avatar_path(user_id: &str) -> String {
    format!("avatars/{}.jpg", user_id)
}

#[derive(Clone)]
enum Backend {
    Remote { http: reqwest::Client, base_url: String },
    Memory(Arc<DashMap<String, Vec<u8>>>),
}

/// Object store for photos.
#[derive(Clone)]
pub struct ObjectStore {
    backend: Backend,
    bucket: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    name: String,
    #[serde(default)]
    download_tokens: Option<String>,
}

impl ObjectStore {
    /// Create a client for `bucket`.
    ///
    /// For local development with the emulator, set
    /// FIREBASE_STORAGE_EMULATOR_HOST.
    pub fn new(bucket: &str) -> Self {
        let base_url = match std::env::var("FIREBASE_STORAGE_EMULATOR_HOST") {
            Ok(host) => {
                tracing::info!(host = %host, "Using Firebase Storage Emulator");
                format!("http://{}/v0", host.trim_end_matches('/'))
            }
            Err(_) => FIREBASE_STORAGE_URL.to_string(),
        };
        Self::with_base_url(bucket, base_url)
    }

    pub fn with_base_url(bucket: &str, base_url: impl Into<String>) -> Self {
        Self {
            backend: Backend::Remote {
                http: reqwest::Client::new(),
                base_url: base_url.into(),
            },
            bucket: bucket.to_string(),
        }
    }

    /// In-memory store for tests. Download URLs point at a fake host.
    pub fn new_mock(bucket: &str) -> Self {
        Self {
            backend: Backend::Memory(Arc::new(DashMap::new())),
            bucket: bucket.to_string(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Bytes stored at `path` (in-memory backend only).
    pub fn stored_object(&self, path: &str) -> Option<Vec<u8>> {
        match &self.backend {
            Backend::Memory(objects) => objects.get(path).map(|entry| entry.value().clone()),
            Backend::Remote { .. } => None,
        }
    }

    /// Upload a JPEG to `path`, overwriting any existing object, and return
    /// its download URL.
    pub async fn upload_jpeg(
        &self,
        path: &str,
        bytes: Vec<u8>,
        id_token: &str,
    ) -> Result<String, String> {
        match &self.backend {
            Backend::Memory(objects) => {
                objects.insert(path.to_string(), bytes);
                Ok(format!(
                    "https://storage.invalid/{}/{}",
                    self.bucket,
                    urlencoding::encode(path)
                ))
            }
            Backend::Remote { http, base_url } => {
                self.upload_remote(http, base_url, path, bytes, id_token)
                    .await
            }
        }
    }

    async fn upload_remote(
        &self,
        http: &reqwest::Client,
        base_url: &str,
        path: &str,
        bytes: Vec<u8>,
        id_token: &str,
    ) -> Result<String, String> {
        let url = format!(
            "{}/b/{}/o?name={}",
            base_url,
            self.bucket,
            urlencoding::encode(path)
        );

        let size = bytes.len();
        let response = http
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, format!("Firebase {}", id_token))
            .header(reqwest::header::CONTENT_TYPE, "image/jpeg")
            .body(bytes)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("HTTP {}: {}", status, body));
        }

        let uploaded: UploadResponse = response.json().await.map_err(|e| e.to_string())?;

        tracing::debug!(path = %uploaded.name, bytes = size, "Uploaded object");

        Ok(download_url(
            base_url,
            &self.bucket,
            &uploaded.name,
            uploaded.download_tokens.as_deref(),
        ))
    }
}

/// Tokenized public download URL for an object.
fn download_url(base_url: &str, bucket: &str, name: &str, tokens: Option<&str>) -> String {
    let mut url = format!(
        "{}/b/{}/o/{}?alt=media",
        base_url,
        bucket,
        urlencoding::encode(name)
    );
    // Several tokens may be returned comma-separated; any one works
    if let Some(token) = tokens.and_then(|t| t.split(',').next()).filter(|t| !t.is_empty()) {
        url.push_str("&token=");
        url.push_str(token);
    }
    url
}
