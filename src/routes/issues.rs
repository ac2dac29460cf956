// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User feedback route.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{IssueReport, NewIssue};
use crate::time_utils::format_report_timestamp;
use crate::AppState;
use axum::{extract::State, http::StatusCode, routing::post, Extension, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use validator::Validate;

/// Issue routes. Authentication is optional and applied in routes/mod.rs.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/issues", post(create_issue))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIssueResponse {
    pub id: String,
}

async fn create_issue(
    State(state): State<Arc<AppState>>,
    user: Option<Extension<AuthUser>>,
    Json(input): Json<NewIssue>,
) -> Result<(StatusCode, Json<CreateIssueResponse>)> {
    input
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let (user_id, user_email) = match user {
        Some(Extension(user)) => (Some(user.user_id), user.email),
        None => (None, None),
    };

    let issue = IssueReport::new(
        input,
        user_id,
        user_email,
        format_report_timestamp(chrono::Utc::now()),
    );
    let stored = state.db.create_issue(&issue).await?;

    Ok((StatusCode::CREATED, Json(CreateIssueResponse { id: stored.id })))
}
