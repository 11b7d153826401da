// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daily active window gating scheduler evaluation.

use crate::calendar::CalendarFields;
use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors parsing an active window
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("invalid window '{0}': expected HH:MM-HH:MM")]
    Format(String),
    #[error("invalid time '{0}' in window")]
    Time(String),
}

/// Local time-of-day range `[start, end)` in which scheduled tasks may fire.
///
/// `start == end` means the window never closes. `start > end` wraps
/// past midnight (e.g. `22:00-06:00`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ActiveWindow {
    start: NaiveTime,
    end: NaiveTime,
}

impl ActiveWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            start: truncate(start),
            end: truncate(end),
        }
    }

    /// Window that is open around the clock
    pub fn always() -> Self {
        Self::new(NaiveTime::MIN, NaiveTime::MIN)
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    /// Whether the minute described by `fields` is inside the window.
    pub fn contains(&self, fields: &CalendarFields) -> bool {
        let m = fields.minute_of_day();
        let start = minute_of_day(self.start);
        let end = minute_of_day(self.end);
        if start == end {
            true
        } else if start < end {
            start <= m && m < end
        } else {
            m >= start || m < end
        }
    }

    /// Every minute of the window, in order, starting from `start`.
    pub fn minutes(&self) -> impl Iterator<Item = NaiveTime> {
        let start = minute_of_day(self.start);
        let end = minute_of_day(self.end);
        let len = if start < end {
            end - start
        } else {
            24 * 60 - start + end
        };
        (0..len).filter_map(move |offset| {
            let m = (start + offset) % (24 * 60);
            NaiveTime::from_hms_opt(m / 60, m % 60, 0)
        })
    }
}

impl Default for ActiveWindow {
    /// 07:00-18:00
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(7, 0, 0).unwrap_or(NaiveTime::MIN),
            end: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

impl fmt::Display for ActiveWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}

impl FromStr for ActiveWindow {
    type Err = WindowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| WindowError::Format(s.to_string()))?;
        Ok(Self::new(parse_time(start)?, parse_time(end)?))
    }
}

impl TryFrom<String> for ActiveWindow {
    type Error = WindowError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ActiveWindow> for String {
    fn from(window: ActiveWindow) -> Self {
        window.to_string()
    }
}

fn parse_time(s: &str) -> Result<NaiveTime, WindowError> {
    let s = s.trim();
    if s == "24:00" {
        return Ok(NaiveTime::MIN);
    }
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|_| WindowError::Time(s.to_string()))
}

fn truncate(t: NaiveTime) -> NaiveTime {
    t.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(t)
}

fn minute_of_day(t: NaiveTime) -> u32 {
    t.hour() * 60 + t.minute()
}

#[cfg(test)]
#[path = "window_tests.rs"]
mod tests;
