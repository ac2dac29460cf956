// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! CSV export of all reports.

use crate::models::PigeonReport;

pub const CSV_HEADER: &str =
    "ID,User ID,Alias,Timestamp,Location,Pigeon Count,AI Description,Photo URL";

pub const CSV_FILENAME: &str = "pigeon_reports.csv";

/// Wrap in double quotes, doubling any embedded quote.
fn quoted(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// One header line plus one line per report, joined with `\n`.
///
/// Only `Location` and `AI Description` are quoted; the other columns hold
/// ids, numbers, timestamps and URLs.
pub fn reports_to_csv(reports: &[PigeonReport]) -> String {
    let mut lines = Vec::with_capacity(reports.len() + 1);
    lines.push(CSV_HEADER.to_string());

    for report in reports {
        lines.push(
            [
                report.id.clone(),
                report.user_id.clone(),
                report.alias.clone(),
                report.timestamp.clone(),
                quoted(&report.location),
                report.pigeon_count.to_string(),
                quoted(&report.ai_description),
                report.photo_url.clone(),
            ]
            .join(","),
        );
    }

    lines.join("\n")
}
