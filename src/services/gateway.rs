// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Persisting confirmed sightings.
//!
//! A submission is: hash the JPEG, upload it under its hash, assemble and
//! validate the record, then write it to Firestore. Each step fails with
//! its own message and nothing later runs.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::PigeonReport;
use crate::services::alias::generate_alias;
use crate::services::analysis::PhotoAnalysis;
use crate::services::compressor::CompressedPhoto;
use crate::services::storage::{report_photo_path, ObjectStore};
use crate::time_utils::format_report_timestamp;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::future::Future;
use std::sync::Arc;

/// Lowercase SHA-256 hex digest of the photo bytes.
pub fn photo_hash(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// A confirmed sighting ready to persist.
#[derive(Debug, Clone)]
pub struct ReportDraft {
    pub user_id: String,
    pub user_email: String,
    /// Caller's Firebase ID token, used to authorize the photo upload
    pub id_token: String,
    pub submitted_at: DateTime<Utc>,
    /// Already formatted as `"<lat>, <lng>"`
    pub location: String,
    pub analysis: PhotoAnalysis,
    pub photo: Arc<CompressedPhoto>,
}

/// Destination for confirmed sightings.
pub trait ReportSink: Send + Sync + 'static {
    fn submit(
        &self,
        draft: ReportDraft,
    ) -> impl Future<Output = Result<PigeonReport, AppError>> + Send;
}

/// Firebase Storage + Firestore sink.
#[derive(Clone)]
pub struct ReportGateway {
    db: FirestoreDb,
    store: ObjectStore,
}

impl ReportGateway {
    pub fn new(db: FirestoreDb, store: ObjectStore) -> Self {
        Self { db, store }
    }

    /// Build the record that will be written for `draft`.
    pub fn build_report(
        draft: &ReportDraft,
        photo_hash: String,
        photo_url: String,
    ) -> PigeonReport {
        PigeonReport {
            id: String::new(),
            user_id: draft.user_id.clone(),
            user_email: draft.user_email.clone(),
            alias: generate_alias(&draft.user_id),
            timestamp: format_report_timestamp(draft.submitted_at),
            location: draft.location.clone(),
            pigeon_count: draft.analysis.pigeon_count,
            ai_description: draft.analysis.description.clone(),
            photo_url,
            photo_hash,
            model_version: draft.analysis.model_version.clone(),
        }
    }
}

impl ReportSink for ReportGateway {
    async fn submit(&self, draft: ReportDraft) -> Result<PigeonReport, AppError> {
        let hash = photo_hash(&draft.photo.jpeg);

        // Identical photos share a key; the later upload replaces the object
        let photo_url = self
            .store
            .upload_jpeg(&report_photo_path(&hash), draft.photo.jpeg.clone(), &draft.id_token)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to upload photo: {}", e)))?;

        let report = Self::build_report(&draft, hash, photo_url);

        if let Err(reason) = report.check() {
            tracing::warn!(user_id = %draft.user_id, reason = %reason, "Rejected report");
            return Err(AppError::BadRequest("Invalid report data.".to_string()));
        }

        self.db.create_report(&report).await.map_err(|e| match e {
            AppError::Database(msg) => {
                AppError::Database(format!("Failed to save report to database: {}", msg))
            }
            other => other,
        })
    }
}
