// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API input validation tests.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;

mod common;
use common::{body_json, create_test_app, create_test_token, png_bytes};

fn bearer() -> String {
    format!(
        "Bearer {}",
        create_test_token("user-123", "ana@example.com", true)
    )
}

// ─── Issues ──────────────────────────────────────────────────

#[tokio::test]
async fn test_issue_description_too_short() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/issues")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "issueType": "bug", "description": "broken" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_issue_whitespace_padded_description_too_short() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/issues")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "issueType": "bug", "description": "         x" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    // Rejected before the database is touched (offline mock would give 500)
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_issue_unknown_type_rejected() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/issues")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({
                        "issueType": "complaint",
                        "description": "The map does not load on my phone."
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_anonymous_issue_reaches_database() {
    let (app, _) = create_test_app();

    // Offline mock database: the request is accepted up to the write
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/issues")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({
                        "issueType": "suggestion",
                        "description": "Please add a dark mode to the map.",
                        "page": "/map"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "database_error");
}

#[tokio::test]
async fn test_issue_with_invalid_token_rejected() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/issues")
                .header(header::AUTHORIZATION, "Bearer garbage")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({
                        "issueType": "bug",
                        "description": "The upload button does nothing."
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ─── Upload ──────────────────────────────────────────────────

#[tokio::test]
async fn test_upload_rejects_non_image() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/upload/photo")
                .header(header::AUTHORIZATION, bearer())
                .header(header::CONTENT_TYPE, "text/plain")
                .body(Body::from("hello"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["details"]
        .as_str()
        .unwrap()
        .contains("Unsupported file type"));
}

#[tokio::test]
async fn test_upload_rejects_empty_body() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/upload/photo")
                .header(header::AUTHORIZATION, bearer())
                .header(header::CONTENT_TYPE, "image/png")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_rejects_undecodable_image() {
    let (app, state) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/upload/photo")
                .header(header::AUTHORIZATION, bearer())
                .header(header::CONTENT_TYPE, "image/jpeg")
                .body(Body::from(vec![0u8; 256]))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    // A rejected photo never creates a session
    assert_eq!(state.pipeline.session_count(), 0);
}

#[tokio::test]
async fn test_location_out_of_range() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/upload/location")
                .header(header::AUTHORIZATION, bearer())
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "lat": 95.0, "lng": -62.0 }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_location_error_is_recorded() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/upload/location")
                .header(header::AUTHORIZATION, bearer())
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "error": "User denied Geolocation" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["stage"], "idle");
    assert_eq!(body["location"]["error"], "User denied Geolocation");
    assert_eq!(body["location"]["loading"], false);
    assert_eq!(body["geolocation"]["timeoutMs"], 10_000);
}

#[tokio::test]
async fn test_analyze_without_session() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/upload/analyze")
                .header(header::AUTHORIZATION, bearer())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_submit_without_session() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/upload/submit")
                .header(header::AUTHORIZATION, bearer())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ─── Profile photo ───────────────────────────────────────────

#[tokio::test]
async fn test_avatar_rejects_gif() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/profile/photo")
                .header(header::AUTHORIZATION, bearer())
                .header(header::CONTENT_TYPE, "image/gif")
                .body(Body::from(vec![1u8; 64]))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_avatar_too_large() {
    let (app, _) = create_test_app();
    let oversized = vec![0u8; pigeon_tracker::routes::profile::AVATAR_MAX_BYTES + 1];

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/profile/photo")
                .header(header::AUTHORIZATION, bearer())
                .header(header::CONTENT_TYPE, "image/jpeg")
                .body(Body::from(oversized))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_avatar_upload_stores_jpeg() {
    let (app, state) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/profile/photo")
                .header(header::AUTHORIZATION, bearer())
                .header(header::CONTENT_TYPE, "image/png")
                .body(Body::from(png_bytes(800, 600)))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["photoUrl"]
        .as_str()
        .unwrap()
        .contains("avatars%2Fuser-123.jpg"));

    let stored = state.store.stored_object("avatars/user-123.jpg").unwrap();
    // JPEG magic
    assert_eq!(&stored[..2], &[0xFF, 0xD8]);
}
