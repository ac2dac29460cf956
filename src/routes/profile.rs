// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Current-user routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::services::compressor::ImageCompressor;
use crate::services::generate_alias;
use crate::services::storage::avatar_path;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderMap},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Largest profile picture accepted before compression.
pub const AVATAR_MAX_BYTES: usize = 2 * 1024 * 1024;

const AVATAR_CONTENT_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/me", get(get_me)).route(
        "/api/profile/photo",
        // Headroom so oversized bodies reach the explicit size check
        post(upload_profile_photo).layer(DefaultBodyLimit::max(AVATAR_MAX_BYTES + 1024)),
    )
}

// ─── User Profile ────────────────────────────────────────────

/// Current user response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub user_id: String,
    pub email: Option<String>,
    pub email_verified: bool,
    pub alias: String,
}

async fn get_me(Extension(user): Extension<AuthUser>) -> Json<UserResponse> {
    Json(UserResponse {
        alias: generate_alias(&user.user_id),
        user_id: user.user_id,
        email: user.email,
        email_verified: user.email_verified,
    })
}

// ─── Profile Photo ───────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProfilePhotoResponse {
    pub photo_url: String,
}

/// Check an avatar upload before any image work.
fn validate_avatar(content_type: Option<&str>, size: usize) -> Result<()> {
    let content_type = content_type.unwrap_or_default();
    if !AVATAR_CONTENT_TYPES.contains(&content_type) {
        return Err(AppError::BadRequest(
            "Profile photo must be a JPEG, PNG or WebP image".to_string(),
        ));
    }
    if size == 0 {
        return Err(AppError::BadRequest("Empty upload".to_string()));
    }
    if size > AVATAR_MAX_BYTES {
        return Err(AppError::PayloadTooLarge(
            "Profile photo must be 2 MB or smaller".to_string(),
        ));
    }
    Ok(())
}

/// Replace the caller's profile picture.
async fn upload_profile_photo(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ProfilePhotoResponse>> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    validate_avatar(content_type, body.len())?;

    let photo = ImageCompressor::AVATAR
        .compress_blocking(body.to_vec())
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let photo_url = state
        .store
        .upload_jpeg(&avatar_path(&user.user_id), photo.jpeg, &user.id_token)
        .await
        .map_err(|e| AppError::Storage(format!("Failed to upload profile photo: {}", e)))?;

    tracing::info!(user_id = %user.user_id, "Profile photo updated");

    Ok(Json(ProfilePhotoResponse { photo_url }))
}
