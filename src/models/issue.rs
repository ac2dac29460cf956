// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! User feedback (issue report) model.

use serde::{Deserialize, Deserializer, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Kind of feedback submitted by a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum IssueType {
    Bug,
    Suggestion,
    Visual,
    Other,
}

/// Triage status. Only `New` is ever written here; later transitions are manual.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueStatus {
    #[default]
    New,
}

/// Issue creation request body.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewIssue {
    pub issue_type: IssueType,
    /// Trimmed on input so the length rule applies to what is stored
    #[serde(deserialize_with = "trimmed_string")]
    #[validate(length(min = 10, max = 5000))]
    pub description: String,
    /// Page the user was on when reporting
    #[serde(default)]
    #[validate(length(max = 512))]
    pub page: Option<String>,
}

fn trimmed_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(value.trim().to_string())
}

/// Stored issue record (`issues` collection).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueReport {
    #[serde(alias = "_firestore_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub issue_type: IssueType,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    /// Server-assigned creation time (ISO 8601)
    pub created_at: String,
    pub status: IssueStatus,
}

impl IssueReport {
    /// Build the record for a validated request. Reporter identity is optional.
    pub fn new(
        input: NewIssue,
        user_id: Option<String>,
        user_email: Option<String>,
        created_at: String,
    ) -> Self {
        Self {
            id: String::new(),
            issue_type: input.issue_type,
            description: input.description,
            user_email,
            user_id,
            page: input.page,
            created_at,
            status: IssueStatus::New,
        }
    }
}
