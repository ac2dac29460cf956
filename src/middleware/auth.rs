// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase ID token authentication middleware.

use crate::error::AppError;
use crate::services::TokenError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// Cookie Firebase Hosting forwards to backends.
pub const SESSION_COOKIE: &str = "__session";

/// Authenticated user extracted from a Firebase ID token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub email: Option<String>,
    pub email_verified: bool,
    /// Raw ID token, forwarded to Firebase Storage for uploads
    pub id_token: String,
}

/// Bearer header first, then the session cookie.
fn extract_token(headers: &HeaderMap, jar: &CookieJar) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    match bearer {
        Some(token) => Some(token.to_string()),
        None => jar
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|t| !t.is_empty()),
    }
}

async fn authenticate(state: &AppState, token: String) -> Result<AuthUser, AppError> {
    match state.token_verifier.verify(&token).await {
        Ok(user) => Ok(AuthUser {
            user_id: user.uid,
            email: user.email,
            email_verified: user.email_verified,
            id_token: token,
        }),
        Err(TokenError::Invalid(reason)) => {
            tracing::debug!(reason = %reason, "Rejected ID token");
            Err(AppError::InvalidToken)
        }
        Err(e @ TokenError::Unavailable(_)) => Err(AppError::Internal(e.into())),
    }
}

/// Middleware that requires a valid ID token.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(request.headers(), &jar).ok_or(AppError::Unauthorized)?;
    let user = authenticate(&state, token).await?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Middleware that requires a valid ID token with a verified email.
pub async fn require_verified_email(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(request.headers(), &jar).ok_or(AppError::Unauthorized)?;
    let user = authenticate(&state, token).await?;

    if !user.email_verified {
        tracing::info!(user_id = %user.user_id, "Blocked unverified account");
        return Err(AppError::EmailNotVerified);
    }

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Middleware that attaches the user when a token is present.
///
/// Requests without a token pass through anonymously; an invalid token is
/// still rejected.
pub async fn optional_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(token) = extract_token(request.headers(), &jar) {
        let user = authenticate(&state, token).await?;
        request.extensions_mut().insert(user);
    }
    Ok(next.run(request).await)
}
