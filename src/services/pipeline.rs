// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user upload sessions.
//!
//! Each authenticated user has at most one session holding an
//! [`UploadMachine`] and the session's [`LocationState`]. External calls
//! (analysis, persistence) run with no map guard held; a generation counter
//! discards results that arrive after the session was reset.

use crate::error::AppError;
use crate::models::PigeonReport;
use crate::services::analysis::PhotoAnalyzer;
use crate::services::compressor::ImageCompressor;
use crate::services::gateway::{ReportDraft, ReportSink};
use crate::services::location::{
    GeolocationPolicy, LocationState, LocationUpdate, GEOLOCATION_POLICY,
};
use crate::services::upload::{Stage, UploadMachine, UploadView};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Notify;

/// One user's in-progress upload.
#[derive(Debug, Clone)]
pub struct UploadSession {
    pub machine: UploadMachine,
    pub location: LocationState,
    pub started_at: DateTime<Utc>,
    pub touched_at: DateTime<Utc>,
    generation: u64,
}

impl UploadSession {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            machine: UploadMachine::new(),
            location: LocationState::pending(now),
            started_at: now,
            touched_at: now,
            generation: 0,
        }
    }

    fn view(&self) -> SessionView {
        SessionView {
            upload: self.machine.view(&self.location),
            location: self.location.clone(),
            geolocation: GEOLOCATION_POLICY,
        }
    }
}

/// What the client sees after every call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    #[serde(flatten)]
    pub upload: UploadView,
    pub location: LocationState,
    pub geolocation: GeolocationPolicy,
}

/// Who is submitting.
#[derive(Debug, Clone, Copy)]
pub struct Submitter<'a> {
    pub user_id: &'a str,
    pub email: &'a str,
    pub id_token: &'a str,
}

/// User-facing text for a failed external call.
fn failure_message(err: AppError) -> String {
    match err {
        AppError::Analysis(msg)
        | AppError::Storage(msg)
        | AppError::BadRequest(msg)
        | AppError::Database(msg) => msg,
        other => other.to_string(),
    }
}

pub struct UploadPipeline<A, S> {
    sessions: DashMap<String, UploadSession>,
    analyzer: A,
    sink: S,
    compressor: ImageCompressor,
    max_upload_bytes: usize,
    feed_notifier: Option<Arc<Notify>>,
}

impl<A: PhotoAnalyzer, S: ReportSink> UploadPipeline<A, S> {
    pub fn new(analyzer: A, sink: S, max_upload_bytes: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            analyzer,
            sink,
            compressor: ImageCompressor::REPORT_PHOTO,
            max_upload_bytes,
            feed_notifier: None,
        }
    }

    /// Wake the report feed after every successful submission.
    pub fn with_feed_notifier(mut self, notifier: Arc<Notify>) -> Self {
        self.feed_notifier = Some(notifier);
        self
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Current view for `user_id`. Users without a session are idle.
    pub fn view(&self, user_id: &str) -> SessionView {
        match self.sessions.get(user_id) {
            Some(session) => session.view(),
            None => SessionView {
                upload: UploadMachine::new().view(&LocationState::default()),
                location: LocationState::default(),
                geolocation: GEOLOCATION_POLICY,
            },
        }
    }

    /// Validate and compress a selected image, then move to previewing.
    ///
    /// Keeps a recently resolved location; otherwise starts a fresh
    /// geolocation query for the session.
    pub async fn start(
        &self,
        user_id: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<SessionView, AppError> {
        match content_type {
            Some(ct) if ct.starts_with("image/") => {}
            Some(ct) => {
                return Err(AppError::BadRequest(format!(
                    "Unsupported file type: {}",
                    ct
                )))
            }
            None => return Err(AppError::BadRequest("Missing Content-Type".to_string())),
        }
        if bytes.is_empty() {
            return Err(AppError::BadRequest("Empty upload".to_string()));
        }
        if bytes.len() > self.max_upload_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "{} bytes exceeds the {} byte limit",
                bytes.len(),
                self.max_upload_bytes
            )));
        }

        // Fail fast before doing any image work
        if let Some(session) = self.sessions.get(user_id) {
            if session.machine.stage() != Stage::Idle {
                return Err(AppError::Conflict(format!(
                    "An upload is already {}; reset it first",
                    session.machine.stage()
                )));
            }
        }

        let photo = self
            .compressor
            .compress_blocking(bytes)
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let now = Utc::now();
        let mut session = self
            .sessions
            .entry(user_id.to_string())
            .or_insert_with(|| UploadSession::new(now));

        session.machine.select_photo(photo)?;
        session.location = session.location.restart(now);
        session.started_at = now;
        session.touched_at = now;
        session.generation += 1;

        tracing::info!(user_id, "Upload session started");
        Ok(session.view())
    }

    /// Run the photo through the analyzer.
    ///
    /// Analyzer failures land the session in the error state and are not
    /// returned as errors.
    pub async fn analyze(&self, user_id: &str) -> Result<SessionView, AppError> {
        let (photo, generation) = {
            let mut session = self.session_mut(user_id)?;
            session.touched_at = Utc::now();
            (session.machine.begin_analysis()?, session.generation)
        };

        let result = self
            .analyzer
            .analyze(&photo.data_uri)
            .await
            .map_err(failure_message);

        let mut session = self.session_mut(user_id)?;
        if session.generation != generation {
            tracing::debug!(user_id, "Discarding analysis for a reset session");
            return Ok(session.view());
        }
        session.machine.complete_analysis(result)?;
        session.touched_at = Utc::now();
        Ok(session.view())
    }

    /// Record the client's geolocation outcome.
    pub fn update_location(
        &self,
        user_id: &str,
        update: LocationUpdate,
    ) -> Result<SessionView, AppError> {
        let now = Utc::now();
        let mut session = self
            .sessions
            .entry(user_id.to_string())
            .or_insert_with(|| UploadSession::new(now));

        session
            .location
            .apply(update, now)
            .map_err(AppError::BadRequest)?;
        session.touched_at = now;
        Ok(session.view())
    }

    /// Persist the confirmed sighting.
    ///
    /// Guard failures (no pigeons, no location, busy) are returned as errors
    /// and leave the session untouched. Persistence failures land the session
    /// in the error state.
    pub async fn submit(&self, who: Submitter<'_>) -> Result<SessionView, AppError> {
        let now = Utc::now();
        let (request, generation) = {
            let mut guard = self.session_mut(who.user_id)?;
            let session = &mut *guard;
            session.location.expire_if_stale(now);
            session.touched_at = now;
            (
                session.machine.begin_submission(&session.location)?,
                session.generation,
            )
        };

        let draft = ReportDraft {
            user_id: who.user_id.to_string(),
            user_email: who.email.to_string(),
            id_token: who.id_token.to_string(),
            submitted_at: now,
            location: request.coordinates.to_report_location(),
            analysis: request.analysis,
            photo: request.photo,
        };

        let result: Result<PigeonReport, String> =
            self.sink.submit(draft).await.map_err(failure_message);

        if let Ok(report) = &result {
            tracing::info!(
                user_id = who.user_id,
                report_id = %report.id,
                pigeon_count = report.pigeon_count,
                "Sighting submitted"
            );
            if let Some(notifier) = &self.feed_notifier {
                notifier.notify_one();
            }
        }

        let mut session = self.session_mut(who.user_id)?;
        if session.generation != generation {
            tracing::debug!(user_id = who.user_id, "Discarding submission for a reset session");
            return Ok(session.view());
        }
        session.machine.complete_submission(result)?;
        session.touched_at = Utc::now();
        Ok(session.view())
    }

    /// Drop everything and return to idle. The location is kept.
    pub fn reset(&self, user_id: &str) -> SessionView {
        match self.sessions.get_mut(user_id) {
            Some(mut session) => {
                session.machine.reset();
                session.generation += 1;
                session.touched_at = Utc::now();
                session.view()
            }
            None => self.view(user_id),
        }
    }

    /// Remove sessions untouched for longer than `ttl`. Returns how many.
    pub fn evict_stale(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| now.signed_duration_since(session.touched_at) <= ttl);
        before.saturating_sub(self.sessions.len())
    }

    fn session_mut(
        &self,
        user_id: &str,
    ) -> Result<dashmap::mapref::one::RefMut<'_, String, UploadSession>, AppError> {
        self.sessions
            .get_mut(user_id)
            .ok_or_else(|| AppError::NotFound("No upload in progress".to_string()))
    }
}
