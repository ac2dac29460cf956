// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod issue;
pub mod leaderboard;
pub mod report;

pub use issue::{IssueReport, IssueStatus, IssueType, NewIssue};
pub use leaderboard::{calculate_leaderboard, LeaderboardEntry};
pub use report::PigeonReport;
