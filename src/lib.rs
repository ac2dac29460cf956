// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Pigeon Tracker: citizen-science reporting of urban pigeon sightings
//!
//! This crate provides the backend API: photo upload and AI analysis,
//! report persistence in Firebase, and the live leaderboard, map and CSV
//! views derived from the report collection.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{
    FirebaseTokenVerifier, GeminiAnalyzer, ObjectStore, ReportFeed, ReportGateway, UploadPipeline,
};
use std::sync::Arc;

/// Upload pipeline wired to the production analyzer and report store.
pub type Pipeline = UploadPipeline<GeminiAnalyzer, ReportGateway>;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub store: ObjectStore,
    pub token_verifier: Arc<FirebaseTokenVerifier>,
    pub pipeline: Pipeline,
    pub feed: ReportFeed,
}
