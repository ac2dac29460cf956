// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Leaderboard aggregation over the report collection.
//!
//! Entries are derived on every request from the current snapshot and are
//! never persisted.

use serde::Serialize;
use std::collections::HashMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::PigeonReport;
use crate::time_utils::parse_report_timestamp;

/// Alias shown when a report carries none.
pub const ANONYMOUS_ALIAS: &str = "Anónimo";

/// One ranked spotter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub alias: String,
    pub total_pigeons: u64,
    pub report_count: u32,
    pub rank: u32,
}

/// Rank users by total pigeons reported.
///
/// Users appear in the order they are first seen in `reports` before the
/// sort; the sort is stable, so equal totals keep that order. Each entry
/// carries the alias of the user's most recent report.
pub fn calculate_leaderboard(reports: &[PigeonReport]) -> Vec<LeaderboardEntry> {
    let mut index_by_user: HashMap<&str, usize> = HashMap::new();
    let mut entries: Vec<LeaderboardEntry> = Vec::new();
    let mut latest: Vec<Option<chrono::DateTime<chrono::Utc>>> = Vec::new();

    for report in reports {
        let idx = *index_by_user
            .entry(report.user_id.as_str())
            .or_insert_with(|| {
                entries.push(LeaderboardEntry {
                    user_id: report.user_id.clone(),
                    alias: display_alias(&report.alias),
                    total_pigeons: 0,
                    report_count: 0,
                    rank: 0,
                });
                latest.push(parse_report_timestamp(&report.timestamp));
                entries.len() - 1
            });

        let entry = &mut entries[idx];
        entry.total_pigeons += u64::from(report.pigeon_count);
        entry.report_count += 1;

        let ts = parse_report_timestamp(&report.timestamp);
        if ts > latest[idx] {
            latest[idx] = ts;
            entry.alias = display_alias(&report.alias);
        }
    }

    entries.sort_by(|a, b| b.total_pigeons.cmp(&a.total_pigeons));

    for (position, entry) in entries.iter_mut().enumerate() {
        entry.rank = position as u32 + 1;
    }

    entries
}

fn display_alias(alias: &str) -> String {
    if alias.trim().is_empty() {
        ANONYMOUS_ALIAS.to_string()
    } else {
        alias.to_string()
    }
}
