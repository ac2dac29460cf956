// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Upload workflow state machine.
//!
//! Each state carries only the data valid in it, so an analysis result can
//! never be observed without a photo and a persisted report never coexists
//! with a pending one.
//!
//! ```text
//! Idle -> Previewing -> Analyzing -> Confirming -> Submitting -> Success
//!                           |                          |
//!                           +--------> Error <---------+
//! ```
//!
//! `reset` returns to `Idle` from anywhere.

use crate::error::AppError;
use crate::models::PigeonReport;
use crate::services::analysis::PhotoAnalysis;
use crate::services::compressor::CompressedPhoto;
use crate::services::location::{Coordinates, LocationState};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Stage tag exposed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Idle,
    Previewing,
    Analyzing,
    Confirming,
    Submitting,
    Success,
    Error,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Previewing => "previewing",
            Stage::Analyzing => "analyzing",
            Stage::Confirming => "confirming",
            Stage::Submitting => "submitting",
            Stage::Success => "success",
            Stage::Error => "error",
        };
        f.write_str(name)
    }
}

/// Which external call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailedStage {
    Analysis,
    Submission,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UploadState {
    Idle,
    Previewing {
        photo: Arc<CompressedPhoto>,
    },
    Analyzing {
        photo: Arc<CompressedPhoto>,
    },
    Confirming {
        photo: Arc<CompressedPhoto>,
        analysis: PhotoAnalysis,
    },
    Submitting {
        photo: Arc<CompressedPhoto>,
        analysis: PhotoAnalysis,
    },
    Success {
        report: PigeonReport,
    },
    Error {
        stage: FailedStage,
        message: String,
    },
}

impl UploadState {
    pub fn stage(&self) -> Stage {
        match self {
            UploadState::Idle => Stage::Idle,
            UploadState::Previewing { .. } => Stage::Previewing,
            UploadState::Analyzing { .. } => Stage::Analyzing,
            UploadState::Confirming { .. } => Stage::Confirming,
            UploadState::Submitting { .. } => Stage::Submitting,
            UploadState::Success { .. } => Stage::Success,
            UploadState::Error { .. } => Stage::Error,
        }
    }
}

/// An operation that is not valid in the current state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("Cannot {operation} while {stage}")]
    InvalidTransition {
        operation: &'static str,
        stage: Stage,
    },

    #[error("Another operation is already in progress ({0})")]
    Busy(Stage),
}

/// Why a confirmed report could not be submitted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("No pigeons detected in the photo")]
    NoPigeonsDetected,

    #[error("{0}")]
    LocationUnavailable(String),

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        AppError::Conflict(err.to_string())
    }
}

impl From<SubmitError> for AppError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::NoPigeonsDetected => AppError::NoPigeonsDetected,
            SubmitError::LocationUnavailable(msg) => AppError::LocationUnavailable(msg),
            SubmitError::Transition(e) => e.into(),
        }
    }
}

/// Everything needed to persist a confirmed sighting.
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub photo: Arc<CompressedPhoto>,
    pub analysis: PhotoAnalysis,
    pub coordinates: Coordinates,
}

/// Client-facing snapshot of the machine.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadView {
    pub stage: Stage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pigeon_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<FailedStage>,
    pub no_pigeons_detected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<PigeonReport>,
    pub can_submit: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadMachine {
    state: UploadState,
}

impl Default for UploadMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadMachine {
    pub fn new() -> Self {
        Self {
            state: UploadState::Idle,
        }
    }

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    pub fn stage(&self) -> Stage {
        self.state.stage()
    }

    fn invalid(&self, operation: &'static str) -> TransitionError {
        match self.stage() {
            stage @ (Stage::Analyzing | Stage::Submitting) => TransitionError::Busy(stage),
            stage => TransitionError::InvalidTransition { operation, stage },
        }
    }

    /// `Idle -> Previewing`
    pub fn select_photo(&mut self, photo: CompressedPhoto) -> Result<(), TransitionError> {
        match self.state {
            UploadState::Idle => {
                self.state = UploadState::Previewing {
                    photo: Arc::new(photo),
                };
                Ok(())
            }
            _ => Err(self.invalid("select a photo")),
        }
    }

    /// `Previewing -> Analyzing`. Returns the photo to send to the analyzer.
    pub fn begin_analysis(&mut self) -> Result<Arc<CompressedPhoto>, TransitionError> {
        match &self.state {
            UploadState::Previewing { photo } => {
                let photo = Arc::clone(photo);
                self.state = UploadState::Analyzing {
                    photo: Arc::clone(&photo),
                };
                Ok(photo)
            }
            _ => Err(self.invalid("analyze")),
        }
    }

    /// `Analyzing -> Confirming` on success, `Analyzing -> Error` on failure.
    pub fn complete_analysis(
        &mut self,
        result: Result<PhotoAnalysis, String>,
    ) -> Result<(), TransitionError> {
        let UploadState::Analyzing { photo } = &self.state else {
            return Err(TransitionError::InvalidTransition {
                operation: "complete analysis",
                stage: self.stage(),
            });
        };

        self.state = match result {
            Ok(analysis) => UploadState::Confirming {
                photo: Arc::clone(photo),
                analysis,
            },
            Err(message) => UploadState::Error {
                stage: FailedStage::Analysis,
                message,
            },
        };
        Ok(())
    }

    /// `Confirming -> Submitting`, guarded by a positive count and resolved
    /// coordinates. A failed guard leaves the state unchanged.
    pub fn begin_submission(
        &mut self,
        location: &LocationState,
    ) -> Result<SubmissionRequest, SubmitError> {
        let UploadState::Confirming { photo, analysis } = &self.state else {
            return Err(self.invalid("submit").into());
        };

        if analysis.pigeon_count == 0 {
            return Err(SubmitError::NoPigeonsDetected);
        }

        let Some(coordinates) = location.coordinates() else {
            let reason = if location.loading {
                "Location is still being determined".to_string()
            } else {
                location
                    .error
                    .clone()
                    .unwrap_or_else(|| "Location unavailable".to_string())
            };
            return Err(SubmitError::LocationUnavailable(reason));
        };

        let request = SubmissionRequest {
            photo: Arc::clone(photo),
            analysis: analysis.clone(),
            coordinates,
        };

        self.state = UploadState::Submitting {
            photo: Arc::clone(&request.photo),
            analysis: request.analysis.clone(),
        };

        Ok(request)
    }

    /// `Submitting -> Success` on success, `Submitting -> Error` on failure.
    pub fn complete_submission(
        &mut self,
        result: Result<PigeonReport, String>,
    ) -> Result<(), TransitionError> {
        if !matches!(self.state, UploadState::Submitting { .. }) {
            return Err(TransitionError::InvalidTransition {
                operation: "complete submission",
                stage: self.stage(),
            });
        }

        self.state = match result {
            Ok(report) => UploadState::Success { report },
            Err(message) => UploadState::Error {
                stage: FailedStage::Submission,
                message,
            },
        };
        Ok(())
    }

    /// Back to `Idle` from any state, dropping everything.
    pub fn reset(&mut self) {
        self.state = UploadState::Idle;
    }

    pub fn view(&self, location: &LocationState) -> UploadView {
        let mut view = UploadView {
            stage: self.stage(),
            preview: None,
            pigeon_count: None,
            description: None,
            model_version: None,
            error: None,
            failed_stage: None,
            no_pigeons_detected: false,
            report: None,
            can_submit: false,
        };

        match &self.state {
            UploadState::Idle => {}
            UploadState::Previewing { photo } | UploadState::Analyzing { photo } => {
                view.preview = Some(photo.data_uri.clone());
            }
            UploadState::Confirming { photo, analysis } => {
                view.preview = Some(photo.data_uri.clone());
                view.pigeon_count = Some(analysis.pigeon_count);
                view.description = Some(analysis.description.clone());
                view.model_version = Some(analysis.model_version.clone());
                view.no_pigeons_detected = analysis.pigeon_count == 0;
                view.can_submit =
                    analysis.pigeon_count > 0 && location.coordinates().is_some();
            }
            UploadState::Submitting { photo, analysis } => {
                view.preview = Some(photo.data_uri.clone());
                view.pigeon_count = Some(analysis.pigeon_count);
                view.description = Some(analysis.description.clone());
                view.model_version = Some(analysis.model_version.clone());
            }
            UploadState::Success { report } => {
                view.report = Some(report.clone());
            }
            UploadState::Error { stage, message } => {
                view.error = Some(message.clone());
                view.failed_stage = Some(*stage);
            }
        }

        view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::location::LocationUpdate;
    use chrono::Utc;

    fn photo() -> CompressedPhoto {
        CompressedPhoto {
            data_uri: "data:image/jpeg;base64,AAAA".to_string(),
            jpeg: vec![0xff, 0xd8, 0xff],
            width: 4,
            height: 3,
        }
    }

    fn analysis(count: u32) -> PhotoAnalysis {
        PhotoAnalysis {
            pigeon_count: count,
            description: "Palomas en la plaza.".to_string(),
            model_version: "googleai/gemini-2.0-flash".to_string(),
        }
    }

    fn resolved_location() -> LocationState {
        let now = Utc::now();
        let mut location = LocationState::pending(now);
        location
            .apply(
                LocationUpdate::Resolved {
                    lat: -38.7183,
                    lng: -62.2661,
                },
                now,
            )
            .unwrap();
        location
    }

    fn report() -> PigeonReport {
        PigeonReport {
            id: "r1".to_string(),
            user_id: "u1".to_string(),
            user_email: "u1@example.com".to_string(),
            alias: "Audaz Halcón".to_string(),
            timestamp: "2024-05-01T10:00:00.000Z".to_string(),
            location: "-38.71830, -62.26610".to_string(),
            pigeon_count: 3,
            ai_description: "Palomas en la plaza.".to_string(),
            photo_url: "https://example.com/p.jpg".to_string(),
            photo_hash: "a".repeat(64),
            model_version: "googleai/gemini-2.0-flash".to_string(),
        }
    }

    fn confirming(count: u32) -> UploadMachine {
        let mut machine = UploadMachine::new();
        machine.select_photo(photo()).unwrap();
        machine.begin_analysis().unwrap();
        machine.complete_analysis(Ok(analysis(count))).unwrap();
        machine
    }

    #[test]
    fn test_happy_path() {
        let mut machine = confirming(3);
        assert_eq!(machine.stage(), Stage::Confirming);

        let request = machine.begin_submission(&resolved_location()).unwrap();
        assert_eq!(request.analysis.pigeon_count, 3);
        assert_eq!(
            request.coordinates.to_report_location(),
            "-38.71830, -62.26610"
        );
        assert_eq!(machine.stage(), Stage::Submitting);

        machine.complete_submission(Ok(report())).unwrap();
        assert_eq!(machine.stage(), Stage::Success);
    }

    #[test]
    fn test_zero_pigeons_blocks_submission() {
        let mut machine = confirming(0);
        let view = machine.view(&resolved_location());
        assert!(view.no_pigeons_detected);
        assert!(!view.can_submit);

        let err = machine.begin_submission(&resolved_location()).unwrap_err();
        assert_eq!(err, SubmitError::NoPigeonsDetected);
        assert_eq!(machine.stage(), Stage::Confirming);
    }

    #[test]
    fn test_missing_location_blocks_submission() {
        let mut machine = confirming(2);

        let pending = LocationState::pending(Utc::now());
        assert!(!machine.view(&pending).can_submit);
        assert!(matches!(
            machine.begin_submission(&pending),
            Err(SubmitError::LocationUnavailable(_))
        ));

        let now = Utc::now();
        let mut denied = LocationState::pending(now);
        denied
            .apply(
                LocationUpdate::Failed {
                    error: "User denied Geolocation".to_string(),
                },
                now,
            )
            .unwrap();
        assert_eq!(
            machine.begin_submission(&denied).unwrap_err(),
            SubmitError::LocationUnavailable("User denied Geolocation".to_string())
        );
        assert_eq!(machine.stage(), Stage::Confirming);
    }

    #[test]
    fn test_analysis_failure_goes_to_error() {
        let mut machine = UploadMachine::new();
        machine.select_photo(photo()).unwrap();
        machine.begin_analysis().unwrap();
        machine
            .complete_analysis(Err("Failed to analyze photo with AI. Details: boom".to_string()))
            .unwrap();

        let view = machine.view(&resolved_location());
        assert_eq!(view.stage, Stage::Error);
        assert_eq!(view.failed_stage, Some(FailedStage::Analysis));
        assert!(view.error.unwrap().contains("boom"));
        assert!(view.preview.is_none());

        // No retry without reset
        assert!(machine.begin_analysis().is_err());
        machine.reset();
        assert_eq!(machine.stage(), Stage::Idle);
    }

    #[test]
    fn test_submission_failure_goes_to_error() {
        let mut machine = confirming(1);
        machine.begin_submission(&resolved_location()).unwrap();
        machine
            .complete_submission(Err("Failed to upload photo: 403".to_string()))
            .unwrap();
        assert_eq!(
            machine.state(),
            &UploadState::Error {
                stage: FailedStage::Submission,
                message: "Failed to upload photo: 403".to_string()
            }
        );
    }

    #[test]
    fn test_in_flight_operations_report_busy() {
        let mut machine = UploadMachine::new();
        machine.select_photo(photo()).unwrap();
        machine.begin_analysis().unwrap();

        assert_eq!(
            machine.begin_analysis().unwrap_err(),
            TransitionError::Busy(Stage::Analyzing)
        );
        assert_eq!(
            machine.select_photo(photo()).unwrap_err(),
            TransitionError::Busy(Stage::Analyzing)
        );
    }

    #[test]
    fn test_submission_in_flight_blocks_resubmit() {
        let mut machine = confirming(3);
        machine.begin_submission(&resolved_location()).unwrap();
        let before = machine.clone();

        assert_eq!(
            machine.begin_submission(&resolved_location()).unwrap_err(),
            SubmitError::Transition(TransitionError::Busy(Stage::Submitting))
        );
        assert_eq!(
            machine.begin_analysis().unwrap_err(),
            TransitionError::Busy(Stage::Submitting)
        );
        assert_eq!(machine, before);
    }

    #[test]
    fn test_invalid_transitions() {
        let mut machine = UploadMachine::new();
        assert_eq!(
            machine.begin_analysis().unwrap_err(),
            TransitionError::InvalidTransition {
                operation: "analyze",
                stage: Stage::Idle
            }
        );
        assert!(machine.complete_analysis(Ok(analysis(1))).is_err());
        assert!(machine.complete_submission(Ok(report())).is_err());
        assert!(matches!(
            machine.begin_submission(&resolved_location()),
            Err(SubmitError::Transition(_))
        ));
    }

    fn assert_idle(machine: &UploadMachine) {
        assert_eq!(*machine, UploadMachine::new());

        let view = machine.view(&resolved_location());
        assert_eq!(view.stage, Stage::Idle);
        assert!(view.preview.is_none());
        assert!(view.pigeon_count.is_none());
        assert!(view.description.is_none());
        assert!(view.model_version.is_none());
        assert!(view.error.is_none());
        assert!(view.failed_stage.is_none());
        assert!(view.report.is_none());
        assert!(!view.no_pigeons_detected);
        assert!(!view.can_submit);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut machine = confirming(4);
        machine.reset();
        assert_idle(&machine);
    }

    #[test]
    fn test_reset_from_success() {
        let mut machine = confirming(4);
        machine.begin_submission(&resolved_location()).unwrap();
        machine.complete_submission(Ok(report())).unwrap();
        assert_eq!(machine.stage(), Stage::Success);

        machine.reset();
        assert_idle(&machine);
    }

    #[test]
    fn test_reset_from_error() {
        let mut machine = confirming(4);
        machine.begin_submission(&resolved_location()).unwrap();
        machine
            .complete_submission(Err("Failed to upload photo: HTTP 403".to_string()))
            .unwrap();
        assert_eq!(machine.stage(), Stage::Error);

        machine.reset();
        assert_idle(&machine);
    }

    #[test]
    fn test_view_serializes_camel_case() {
        let machine = confirming(2);
        let json = serde_json::to_value(machine.view(&resolved_location())).unwrap();
        assert_eq!(json["stage"], "confirming");
        assert_eq!(json["pigeonCount"], 2);
        assert_eq!(json["canSubmit"], true);
        assert_eq!(json["noPigeonsDetected"], false);
    }

    #[test]
    fn test_error_mapping() {
        assert!(matches!(
            AppError::from(SubmitError::NoPigeonsDetected),
            AppError::NoPigeonsDetected
        ));
        assert!(matches!(
            AppError::from(TransitionError::Busy(Stage::Submitting)),
            AppError::Conflict(_)
        ));
    }
}
