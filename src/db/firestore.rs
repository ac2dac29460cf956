// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Reports (confirmed pigeon sightings)
//! - Issues (user feedback)

use crate::db::collections;
use crate::error::AppError;
use crate::models::{IssueReport, PigeonReport};

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Report Operations ───────────────────────────────────────

    /// Store a new report under a generated document ID.
    ///
    /// Returns the stored report with `id` filled in.
    pub async fn create_report(&self, report: &PigeonReport) -> Result<PigeonReport, AppError> {
        let stored: PigeonReport = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::REPORTS)
            .generate_document_id()
            .object(report)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(
            report_id = %stored.id,
            user_id = %stored.user_id,
            pigeon_count = stored.pigeon_count,
            "Report stored"
        );

        Ok(stored)
    }

    /// List every report, most recent first.
    pub async fn list_reports(&self) -> Result<Vec<PigeonReport>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::REPORTS)
            .order_by([("timestamp", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Issue Operations ────────────────────────────────────────

    /// Store a new issue report under a generated document ID.
    pub async fn create_issue(&self, issue: &IssueReport) -> Result<IssueReport, AppError> {
        let stored: IssueReport = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::ISSUES)
            .generate_document_id()
            .object(issue)
            .execute()
            .await
            .map_err(|e| AppError::Database(format!("Could not submit issue report: {}", e)))?;

        tracing::info!(
            issue_id = %stored.id,
            issue_type = ?stored.issue_type,
            "Issue report stored"
        );

        Ok(stored)
    }
}
