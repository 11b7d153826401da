// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Calendar field extraction.
//!
//! Schedule rules are written against local wall-clock fields (the hour a
//! human expects a job to run), while the scheduler works in UTC instants.
//! The [`Calendar`] trait is the seam between the two so that matching is
//! deterministic under test regardless of the host time zone.

use chrono::{
    DateTime, Datelike, FixedOffset, Local, NaiveDate, NaiveTime, Offset, TimeZone, Timelike, Utc,
};
use serde::{Deserialize, Serialize};

/// Calendar decomposition of an instant, at minute granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarFields {
    pub year: u32,
    /// 1 = January
    pub month: u32,
    /// 1..=5, days 1-7 are week 1, 8-14 week 2, ...
    pub week_of_month: u32,
    /// ISO numbering, 1 = Monday .. 7 = Sunday
    pub weekday: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
}

impl CalendarFields {
    pub fn from_datetime<Tz: TimeZone>(at: &DateTime<Tz>) -> Self {
        let day = at.day();
        Self {
            year: u32::try_from(at.year()).unwrap_or(0),
            month: at.month(),
            week_of_month: (day - 1) / 7 + 1,
            weekday: at.weekday().number_from_monday(),
            day,
            hour: at.hour(),
            minute: at.minute(),
        }
    }

    /// Minutes since local midnight
    pub fn minute_of_day(&self) -> u32 {
        self.hour * 60 + self.minute
    }
}

/// Converts between UTC instants and local calendar fields
pub trait Calendar: Clone + Send + Sync + 'static {
    /// Decompose an instant into local calendar fields.
    fn fields(&self, at: DateTime<Utc>) -> CalendarFields;

    /// Resolve a local date and time to an instant.
    ///
    /// Returns `None` for wall-clock times skipped by a DST transition.
    fn resolve(&self, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>>;

    /// The local date an instant falls on.
    fn date_of(&self, at: DateTime<Utc>) -> NaiveDate;
}

/// Host time zone
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalCalendar;

impl Calendar for LocalCalendar {
    fn fields(&self, at: DateTime<Utc>) -> CalendarFields {
        CalendarFields::from_datetime(&at.with_timezone(&Local))
    }

    fn resolve(&self, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
        Local
            .from_local_datetime(&date.and_time(time))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    }

    fn date_of(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&Local).date_naive()
    }
}

/// Fixed UTC offset, independent of the host configuration
#[derive(Debug, Clone, Copy)]
pub struct FixedCalendar {
    offset: FixedOffset,
}

impl FixedCalendar {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn utc() -> Self {
        Self::new(Utc.fix())
    }

    /// Offset in whole hours east of UTC (negative for west).
    ///
    /// Out-of-range offsets fall back to UTC.
    pub fn hours_east(hours: i32) -> Self {
        let offset = FixedOffset::east_opt(hours * 3600).unwrap_or_else(|| Utc.fix());
        Self::new(offset)
    }
}

impl Default for FixedCalendar {
    fn default() -> Self {
        Self::utc()
    }
}

impl Calendar for FixedCalendar {
    fn fields(&self, at: DateTime<Utc>) -> CalendarFields {
        CalendarFields::from_datetime(&at.with_timezone(&self.offset))
    }

    fn resolve(&self, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
        self.offset
            .from_local_datetime(&date.and_time(time))
            .single()
            .map(|dt| dt.with_timezone(&Utc))
    }

    fn date_of(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.offset).date_naive()
    }
}

#[cfg(test)]
#[path = "calendar_tests.rs"]
mod tests;
