// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Pigeon sighting report model for storage and API.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

use crate::time_utils::parse_report_timestamp;

/// Stored sighting report in Firestore (`reports` collection).
///
/// Field names are camelCase to stay compatible with documents written by
/// the web client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PigeonReport {
    /// Firestore document ID (assigned by the store)
    #[serde(alias = "_firestore_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Firebase Auth UID of the submitter
    #[validate(length(min = 1, max = 128))]
    pub user_id: String,
    /// Email of the submitter
    #[validate(email)]
    pub user_email: String,
    /// Display pseudonym derived from `user_id`
    pub alias: String,
    /// Submission time (ISO 8601, millisecond precision)
    pub timestamp: String,
    /// `"<lat>, <lng>"` with 5 decimals
    pub location: String,
    /// Number of pigeons counted by the model
    pub pigeon_count: u32,
    /// Spanish description produced by the model
    pub ai_description: String,
    /// Download URL in Firebase Storage
    #[validate(url)]
    pub photo_url: String,
    /// SHA-256 hex digest of the JPEG bytes
    pub photo_hash: String,
    /// Model that produced the count and description
    pub model_version: String,
}

impl PigeonReport {
    /// Validate a record before it is written.
    ///
    /// Field-level rules come from the `Validate` derive; the timestamp and
    /// hash formats are checked here.
    pub fn check(&self) -> Result<(), String> {
        self.validate().map_err(|e| e.to_string())?;

        if parse_report_timestamp(&self.timestamp).is_none() {
            return Err(format!("timestamp is not RFC3339: {}", self.timestamp));
        }

        if !is_sha256_hex(&self.photo_hash) {
            return Err("photoHash must be a 64-character hex digest".to_string());
        }

        Ok(())
    }
}

fn is_sha256_hex(value: &str) -> bool {
    value.len() == 64 && value.bytes().all(|b| b.is_ascii_hexdigit())
}
