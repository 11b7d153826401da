// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schedule matching

use chrono::{DateTime, Utc};
use rota_core::{Calendar, CalendarFields, ScheduleRule};

/// Whether `rule` fires at the minute described by `fields`.
///
/// Every field must accept its calendar value; within a field any listed
/// value is enough. Seconds never take part.
pub fn matches(rule: &ScheduleRule, fields: &CalendarFields) -> bool {
    rule.years.accepts(fields.year)
        && rule.months.accepts(fields.month)
        && rule.weeks_of_month.accepts(fields.week_of_month)
        && rule.weekdays.accepts(fields.weekday)
        && rule.days.accepts(fields.day)
        && rule.hours.accepts(fields.hour)
        && rule.minutes.accepts(fields.minute)
}

/// [`matches`] against an instant, decomposed by `calendar`.
pub fn is_due(rule: &ScheduleRule, calendar: &impl Calendar, at: DateTime<Utc>) -> bool {
    matches(rule, &calendar.fields(at))
}

#[cfg(test)]
#[path = "matcher_tests.rs"]
mod tests;
