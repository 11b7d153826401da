// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schedule rules: per-field sets of accepted calendar values.
//!
//! A rule has seven independent fields. Each is either a wildcard or a
//! finite set of accepted values; an empty set is a degenerate rule that
//! never fires. Rules are stored and entered as text, one string per field:
//!
//! - `*`, `any`, `all`, `todos` (case-insensitive) is the wildcard
//! - the empty string is the empty set
//! - otherwise a list separated by `,`, `;` or `|` of numbers (`7` == `07`),
//!   numeric ranges (`9-17`), or for months and weekdays English or
//!   Portuguese names (`march`, `março`, `fri`, `sexta-feira`)

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Errors parsing rule text
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("invalid {field} value '{token}'")]
    InvalidToken { field: FieldKind, token: String },
    #[error("{field} value {value} is outside {min}..={max}")]
    OutOfRange {
        field: FieldKind,
        value: u32,
        min: u32,
        max: u32,
    },
}

/// Which calendar field a rule constraint applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldKind {
    Year,
    Month,
    WeekOfMonth,
    Weekday,
    Day,
    Hour,
    Minute,
}

impl FieldKind {
    pub const ALL: [FieldKind; 7] = [
        FieldKind::Year,
        FieldKind::Month,
        FieldKind::WeekOfMonth,
        FieldKind::Weekday,
        FieldKind::Day,
        FieldKind::Hour,
        FieldKind::Minute,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Year => "years",
            FieldKind::Month => "months",
            FieldKind::WeekOfMonth => "weeks_of_month",
            FieldKind::Weekday => "weekdays",
            FieldKind::Day => "days",
            FieldKind::Hour => "hours",
            FieldKind::Minute => "minutes",
        }
    }

    /// Inclusive range of accepted numeric values
    pub fn range(&self) -> (u32, u32) {
        match self {
            FieldKind::Year => (1970, 9999),
            FieldKind::Month => (1, 12),
            FieldKind::WeekOfMonth => (1, 5),
            FieldKind::Weekday => (1, 7),
            FieldKind::Day => (1, 31),
            FieldKind::Hour => (0, 23),
            FieldKind::Minute => (0, 59),
        }
    }

    fn names(&self) -> &'static [(&'static str, u32)] {
        match self {
            FieldKind::Month => MONTH_NAMES,
            FieldKind::Weekday => WEEKDAY_NAMES,
            _ => &[],
        }
    }

    fn check(&self, value: u32) -> Result<u32, RuleError> {
        let (min, max) = self.range();
        if (min..=max).contains(&value) {
            Ok(value)
        } else {
            Err(RuleError::OutOfRange {
                field: *self,
                value,
                min,
                max,
            })
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// Accent-folded, lowercase
const MONTH_NAMES: &[(&str, u32)] = &[
    ("january", 1),
    ("february", 2),
    ("march", 3),
    ("april", 4),
    ("may", 5),
    ("june", 6),
    ("july", 7),
    ("august", 8),
    ("september", 9),
    ("october", 10),
    ("november", 11),
    ("december", 12),
    ("janeiro", 1),
    ("fevereiro", 2),
    ("marco", 3),
    ("abril", 4),
    ("maio", 5),
    ("junho", 6),
    ("julho", 7),
    ("agosto", 8),
    ("setembro", 9),
    ("outubro", 10),
    ("novembro", 11),
    ("dezembro", 12),
];

const WEEKDAY_NAMES: &[(&str, u32)] = &[
    ("monday", 1),
    ("tuesday", 2),
    ("wednesday", 3),
    ("thursday", 4),
    ("friday", 5),
    ("saturday", 6),
    ("sunday", 7),
    ("segunda", 1),
    ("terca", 2),
    ("quarta", 3),
    ("quinta", 4),
    ("sexta", 5),
    ("sabado", 6),
    ("domingo", 7),
];

const WILDCARDS: &[&str] = &["*", "any", "all", "todos"];

/// One rule constraint
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Field {
    /// Accepts every value
    #[default]
    Any,
    /// Accepts exactly these values; empty accepts nothing
    Values(BTreeSet<u32>),
}

impl Field {
    pub fn values(values: impl IntoIterator<Item = u32>) -> Self {
        Field::Values(values.into_iter().collect())
    }

    /// The empty (never matching) constraint
    pub fn none() -> Self {
        Field::Values(BTreeSet::new())
    }

    pub fn accepts(&self, value: u32) -> bool {
        match self {
            Field::Any => true,
            Field::Values(set) => set.contains(&value),
        }
    }

    /// True for a non-wildcard field with no accepted values
    pub fn is_empty(&self) -> bool {
        matches!(self, Field::Values(set) if set.is_empty())
    }

    /// Parse the text form of a field.
    pub fn parse(kind: FieldKind, text: &str) -> Result<Self, RuleError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Field::none());
        }
        if WILDCARDS.iter().any(|w| text.eq_ignore_ascii_case(w)) {
            return Ok(Field::Any);
        }

        let mut set = BTreeSet::new();
        for token in text
            .split([',', ';', '|'])
            .map(str::trim)
            .filter(|t| !t.is_empty())
        {
            parse_token(kind, token, &mut set)?;
        }
        Ok(Field::Values(set))
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Any => f.write_str("*"),
            Field::Values(set) => {
                let mut first = true;
                for v in set {
                    if !first {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", v)?;
                    first = false;
                }
                Ok(())
            }
        }
    }
}

fn parse_token(kind: FieldKind, token: &str, out: &mut BTreeSet<u32>) -> Result<(), RuleError> {
    if let Some(n) = parse_number(token) {
        out.insert(kind.check(n)?);
        return Ok(());
    }

    if let Some((lo, hi)) = token.split_once('-') {
        if let (Some(lo), Some(hi)) = (parse_number(lo.trim()), parse_number(hi.trim())) {
            let lo = kind.check(lo)?;
            let hi = kind.check(hi)?;
            if lo > hi {
                return Err(RuleError::InvalidToken {
                    field: kind,
                    token: token.to_string(),
                });
            }
            out.extend(lo..=hi);
            return Ok(());
        }
    }

    match lookup_name(kind, token) {
        Some(v) => {
            out.insert(v);
            Ok(())
        }
        None => Err(RuleError::InvalidToken {
            field: kind,
            token: token.to_string(),
        }),
    }
}

fn parse_number(token: &str) -> Option<u32> {
    if !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) {
        token.parse().ok()
    } else {
        None
    }
}

/// Resolve a month or weekday name; three-letter prefixes are accepted.
fn lookup_name(kind: FieldKind, token: &str) -> Option<u32> {
    let folded = fold(token);
    let stem = folded
        .strip_suffix("-feira")
        .or_else(|| folded.strip_suffix(" feira"))
        .unwrap_or(folded.as_str());
    if stem.chars().count() < 3 {
        return None;
    }
    kind.names()
        .iter()
        .find(|(name, _)| name.starts_with(stem))
        .map(|(_, v)| *v)
}

/// Lowercase and strip the Portuguese diacritics used in month/day names
fn fold(s: &str) -> String {
    s.trim()
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

fn wildcard() -> String {
    "*".to_string()
}

/// Text form of a rule, one string per field; missing fields are wildcards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleText {
    #[serde(default = "wildcard")]
    pub years: String,
    #[serde(default = "wildcard")]
    pub months: String,
    #[serde(default = "wildcard")]
    pub weeks_of_month: String,
    #[serde(default = "wildcard")]
    pub weekdays: String,
    #[serde(default = "wildcard")]
    pub days: String,
    #[serde(default = "wildcard")]
    pub hours: String,
    #[serde(default = "wildcard")]
    pub minutes: String,
}

impl Default for RuleText {
    fn default() -> Self {
        Self {
            years: wildcard(),
            months: wildcard(),
            weeks_of_month: wildcard(),
            weekdays: wildcard(),
            days: wildcard(),
            hours: wildcard(),
            minutes: wildcard(),
        }
    }
}

/// When a task is due: every field must accept the calendar instant
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "RuleText", into = "RuleText")]
pub struct ScheduleRule {
    pub years: Field,
    pub months: Field,
    pub weeks_of_month: Field,
    pub weekdays: Field,
    pub days: Field,
    pub hours: Field,
    pub minutes: Field,
}

impl ScheduleRule {
    /// Rule with every field a wildcard (fires every minute)
    pub fn any() -> Self {
        Self::default()
    }

    /// Fire once a day at `hour:minute`
    pub fn daily_at(hour: u32, minute: u32) -> Self {
        Self::any()
            .with(FieldKind::Hour, Field::values([hour]))
            .with(FieldKind::Minute, Field::values([minute]))
    }

    /// Replace one field
    pub fn with(mut self, kind: FieldKind, field: Field) -> Self {
        *self.field_mut(kind) = field;
        self
    }

    pub fn field(&self, kind: FieldKind) -> &Field {
        match kind {
            FieldKind::Year => &self.years,
            FieldKind::Month => &self.months,
            FieldKind::WeekOfMonth => &self.weeks_of_month,
            FieldKind::Weekday => &self.weekdays,
            FieldKind::Day => &self.days,
            FieldKind::Hour => &self.hours,
            FieldKind::Minute => &self.minutes,
        }
    }

    fn field_mut(&mut self, kind: FieldKind) -> &mut Field {
        match kind {
            FieldKind::Year => &mut self.years,
            FieldKind::Month => &mut self.months,
            FieldKind::WeekOfMonth => &mut self.weeks_of_month,
            FieldKind::Weekday => &mut self.weekdays,
            FieldKind::Day => &mut self.days,
            FieldKind::Hour => &mut self.hours,
            FieldKind::Minute => &mut self.minutes,
        }
    }

    /// Fields that are non-wildcard and empty; any entry means the rule never fires.
    pub fn empty_fields(&self) -> Vec<FieldKind> {
        FieldKind::ALL
            .into_iter()
            .filter(|kind| self.field(*kind).is_empty())
            .collect()
    }

    pub fn parse(text: &RuleText) -> Result<Self, RuleError> {
        Ok(Self {
            years: Field::parse(FieldKind::Year, &text.years)?,
            months: Field::parse(FieldKind::Month, &text.months)?,
            weeks_of_month: Field::parse(FieldKind::WeekOfMonth, &text.weeks_of_month)?,
            weekdays: Field::parse(FieldKind::Weekday, &text.weekdays)?,
            days: Field::parse(FieldKind::Day, &text.days)?,
            hours: Field::parse(FieldKind::Hour, &text.hours)?,
            minutes: Field::parse(FieldKind::Minute, &text.minutes)?,
        })
    }

    pub fn to_text(&self) -> RuleText {
        RuleText {
            years: self.years.to_string(),
            months: self.months.to_string(),
            weeks_of_month: self.weeks_of_month.to_string(),
            weekdays: self.weekdays.to_string(),
            days: self.days.to_string(),
            hours: self.hours.to_string(),
            minutes: self.minutes.to_string(),
        }
    }
}

impl TryFrom<RuleText> for ScheduleRule {
    type Error = RuleError;

    fn try_from(text: RuleText) -> Result<Self, Self::Error> {
        Self::parse(&text)
    }
}

impl From<ScheduleRule> for RuleText {
    fn from(rule: ScheduleRule) -> Self {
        rule.to_text()
    }
}

impl fmt::Display for ScheduleRule {
    /// `years months weeks weekdays days hours minutes`, like a crontab line
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |field: &Field| match field.to_string() {
            s if s.is_empty() => "-".to_string(),
            s => s,
        };
        write!(
            f,
            "{} {} {} {} {} {} {}",
            show(&self.years),
            show(&self.months),
            show(&self.weeks_of_month),
            show(&self.weekdays),
            show(&self.days),
            show(&self.hours),
            show(&self.minutes),
        )
    }
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
