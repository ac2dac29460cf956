// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use pigeon_tracker::error::AppError;

async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_status_mapping() {
    let cases = [
        (AppError::Unauthorized, StatusCode::UNAUTHORIZED, "unauthorized"),
        (AppError::InvalidToken, StatusCode::UNAUTHORIZED, "invalid_token"),
        (
            AppError::EmailNotVerified,
            StatusCode::FORBIDDEN,
            "email_not_verified",
        ),
        (
            AppError::NotFound("x".to_string()),
            StatusCode::NOT_FOUND,
            "not_found",
        ),
        (
            AppError::PayloadTooLarge("x".to_string()),
            StatusCode::PAYLOAD_TOO_LARGE,
            "payload_too_large",
        ),
        (
            AppError::Conflict("x".to_string()),
            StatusCode::CONFLICT,
            "conflict",
        ),
        (
            AppError::NoPigeonsDetected,
            StatusCode::UNPROCESSABLE_ENTITY,
            "no_pigeons_detected",
        ),
        (
            AppError::Analysis("x".to_string()),
            StatusCode::BAD_GATEWAY,
            "analysis_error",
        ),
        (
            AppError::Unavailable("x".to_string()),
            StatusCode::SERVICE_UNAVAILABLE,
            "unavailable",
        ),
    ];

    for (err, status, code) in cases {
        let (actual_status, body) = render(err).await;
        assert_eq!(actual_status, status);
        assert_eq!(body["error"], code);
    }
}

#[tokio::test]
async fn test_internal_details_are_hidden() {
    let (status, body) =
        render(AppError::Database("connection refused to 10.0.0.3".to_string())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.get("details").is_none());

    let (status, body) = render(AppError::Internal(anyhow::anyhow!("secret path /etc/x"))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "internal_error");
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn test_user_facing_details_are_kept() {
    let (_, body) = render(AppError::Storage(
        "Failed to upload photo: HTTP 403".to_string(),
    ))
    .await;
    assert_eq!(body["details"], "Failed to upload photo: HTTP 403");

    let (_, body) = render(AppError::LocationUnavailable("Timeout expired".to_string())).await;
    assert_eq!(body["error"], "location_unavailable");
    assert_eq!(body["details"], "Timeout expired");
}
