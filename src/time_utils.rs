// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for report timestamps.
//!
//! Report timestamps are stored as strings with millisecond precision and a
//! `Z` suffix, so ordering by the raw string in Firestore is chronological.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 with milliseconds and a `Z` suffix.
pub fn format_report_timestamp(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a stored report timestamp. Returns `None` for anything that is not RFC3339.
pub fn parse_report_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_has_millis_and_z() {
        let date = DateTime::from_timestamp(1_714_557_600, 5_000_000).unwrap();
        assert_eq!(format_report_timestamp(date), "2024-05-01T10:00:00.005Z");
    }

    #[test]
    fn test_parse_accepts_offsets() {
        let parsed = parse_report_timestamp("2024-05-01T07:00:00-03:00").unwrap();
        assert_eq!(format_report_timestamp(parsed), "2024-05-01T10:00:00.000Z");
        assert!(parse_report_timestamp("yesterday").is_none());
    }
}
