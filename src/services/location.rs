// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Geolocation state for an upload session.
//!
//! The device query runs on the client under [`GEOLOCATION_POLICY`]; the
//! outcome is reported back and held here as a coordinates/error/loading
//! triple.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Extra time allowed on top of the client timeout before giving up.
const TIMEOUT_GRACE_SECS: i64 = 5;

/// A resolved fix younger than this is kept when a new photo is chosen.
pub const FIX_REUSE_SECS: i64 = 300;

/// Query policy the client must use: high accuracy, bounded wait, no cached fix.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeolocationPolicy {
    pub enable_high_accuracy: bool,
    pub timeout_ms: u32,
    pub maximum_age_ms: u32,
}

pub const GEOLOCATION_POLICY: GeolocationPolicy = GeolocationPolicy {
    enable_high_accuracy: true,
    timeout_ms: 10_000,
    maximum_age_ms: 0,
};

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Build validated coordinates.
    pub fn new(lat: f64, lng: f64) -> Result<Self, String> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err("Coordinates must be finite numbers".to_string());
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(format!("Latitude out of range: {}", lat));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(format!("Longitude out of range: {}", lng));
        }
        Ok(Self { lat, lng })
    }

    /// Storage format: `"<lat>, <lng>"` with 5 decimals.
    pub fn to_report_location(&self) -> String {
        format!("{:.5}, {:.5}", self.lat, self.lng)
    }
}

/// Outcome of the client's geolocation query, as reported to the server.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LocationUpdate {
    Resolved { lat: f64, lng: f64 },
    Failed { error: String },
}

/// Coordinates / error / loading triple. The default is "never requested".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationState {
    pub coordinates: Option<Coordinates>,
    pub error: Option<String>,
    pub loading: bool,
    #[serde(skip)]
    requested_at: DateTime<Utc>,
    #[serde(skip)]
    resolved_at: Option<DateTime<Utc>>,
}

impl LocationState {
    /// A fresh query in flight.
    pub fn pending(now: DateTime<Utc>) -> Self {
        Self {
            coordinates: None,
            error: None,
            loading: true,
            requested_at: now,
            resolved_at: None,
        }
    }

    /// State for a newly chosen photo: a recent fix is kept, anything else
    /// starts a fresh query.
    pub fn restart(&self, now: DateTime<Utc>) -> Self {
        match self.resolved_at {
            Some(at)
                if self.coordinates.is_some()
                    && now.signed_duration_since(at) <= Duration::seconds(FIX_REUSE_SECS) =>
            {
                self.clone()
            }
            _ => Self::pending(now),
        }
    }

    /// Apply a client update. Out-of-range coordinates are rejected and leave
    /// the state untouched.
    pub fn apply(&mut self, update: LocationUpdate, now: DateTime<Utc>) -> Result<(), String> {
        match update {
            LocationUpdate::Resolved { lat, lng } => {
                self.coordinates = Some(Coordinates::new(lat, lng)?);
                self.error = None;
                self.resolved_at = Some(now);
            }
            LocationUpdate::Failed { error } => {
                self.coordinates = None;
                self.resolved_at = None;
                self.error = Some(if error.trim().is_empty() {
                    "Location unavailable".to_string()
                } else {
                    error
                });
            }
        }
        self.loading = false;
        Ok(())
    }

    /// Turn a query that outlived the policy timeout into an error.
    pub fn expire_if_stale(&mut self, now: DateTime<Utc>) {
        let deadline = self.requested_at
            + Duration::milliseconds(i64::from(GEOLOCATION_POLICY.timeout_ms))
            + Duration::seconds(TIMEOUT_GRACE_SECS);

        if self.loading && now > deadline {
            self.loading = false;
            self.error = Some("Location request timed out".to_string());
        }
    }

    /// Resolved coordinates, if any.
    pub fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }
}
