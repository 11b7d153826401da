// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared human-readable time formatting.

use crate::calendar::Calendar;
use chrono::{DateTime, Duration, Utc};

/// Format a duration as a short human-readable string: `"5s"`, `"2m10s"`, `"1h30m"`, `"3d"`.
///
/// Negative durations format as zero.
pub fn format_duration(d: Duration) -> String {
    let secs = u64::try_from(d.num_seconds()).unwrap_or(0);
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        let m = secs / 60;
        let s = secs % 60;
        if s > 0 {
            format!("{}m{}s", m, s)
        } else {
            format!("{}m", m)
        }
    } else if secs < 86400 {
        let h = secs / 3600;
        let m = (secs % 3600) / 60;
        if m > 0 {
            format!("{}h{}m", h, m)
        } else {
            format!("{}h", h)
        }
    } else {
        format!("{}d", secs / 86400)
    }
}

/// Format an instant as local `YYYY-MM-DD HH:MM:SS` using `calendar`.
pub fn format_local(calendar: &impl Calendar, at: DateTime<Utc>) -> String {
    let date = calendar.date_of(at);
    let fields = calendar.fields(at);
    format!(
        "{} {:02}:{:02}:{:02}",
        date.format("%Y-%m-%d"),
        fields.hour,
        fields.minute,
        chrono::Timelike::second(&at)
    )
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
