// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Upload workflow routes.
//!
//! Every call returns the caller's session view. Failures of the analysis
//! or persistence calls are reported inside that view (stage `error`), not
//! as HTTP errors.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::services::location::LocationUpdate;
use crate::services::pipeline::{SessionView, Submitter};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderMap},
    routing::{get, post, put},
    Extension, Json, Router,
};
use std::sync::Arc;

/// Upload routes (require a verified email).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes(max_upload_bytes: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/upload", get(get_session))
        .route(
            "/api/upload/photo",
            post(select_photo).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/api/upload/analyze", post(analyze))
        .route("/api/upload/location", put(update_location))
        .route("/api/upload/submit", post(submit))
        .route("/api/upload/reset", post(reset))
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<SessionView> {
    Json(state.pipeline.view(&user.user_id))
}

/// Raw image body; the Content-Type header names its format.
async fn select_photo(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SessionView>> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    let view = state
        .pipeline
        .start(&user.user_id, body.to_vec(), content_type)
        .await?;
    Ok(Json(view))
}

async fn analyze(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<SessionView>> {
    Ok(Json(state.pipeline.analyze(&user.user_id).await?))
}

async fn update_location(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(update): Json<LocationUpdate>,
) -> Result<Json<SessionView>> {
    Ok(Json(state.pipeline.update_location(&user.user_id, update)?))
}

async fn submit(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<SessionView>> {
    let email = user
        .email
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("Account has no email address".to_string()))?;

    let view = state
        .pipeline
        .submit(Submitter {
            user_id: &user.user_id,
            email,
            id_token: &user.id_token,
        })
        .await?;
    Ok(Json(view))
}

async fn reset(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<SessionView> {
    Json(state.pipeline.reset(&user.user_id))
}
