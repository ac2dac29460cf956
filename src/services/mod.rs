// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod alias;
pub mod analysis;
pub mod compressor;
pub mod export;
pub mod feed;
pub mod firebase_auth;
pub mod gateway;
pub mod location;
pub mod map;
pub mod pipeline;
pub mod storage;
pub mod upload;

pub use alias::generate_alias;
pub use analysis::{GeminiAnalyzer, PhotoAnalysis, PhotoAnalyzer};
pub use compressor::{CompressedPhoto, ImageCompressor};
pub use feed::{ReportFeed, ReportSnapshot, ReportSource, ReportSubscription};
pub use firebase_auth::{FirebaseTokenVerifier, FirebaseUser, TokenError};
pub use gateway::{ReportDraft, ReportGateway, ReportSink};
pub use location::{Coordinates, LocationState, LocationUpdate};
pub use map::MapView;
pub use pipeline::{Submitter, UploadPipeline};
pub use storage::ObjectStore;
pub use upload::{Stage, UploadMachine, UploadState};
