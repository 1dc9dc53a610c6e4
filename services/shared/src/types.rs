/// Type-safe wrappers for domain primitives
///
/// Dates arrive from the database and the clients in several shapes
/// (`2025-03-14`, `2025-03-14T10:00:00`, `2025-03-14 10:00:00+00`). These
/// types normalize them once so that grouping and comparisons are exact.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

/// Calendar day in `YYYY-MM-DD` form
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IsoDate(NaiveDate);

impl IsoDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Parse the date part of a date or timestamp string.
    ///
    /// Only the first ten characters are considered, so any time or offset
    /// suffix is ignored.
    pub fn parse_loose(raw: &str) -> Result<Self, ValidationError> {
        let head = normalize_date_prefix(raw);
        NaiveDate::parse_from_str(head, "%Y-%m-%d")
            .map(Self)
            .map_err(|_| ValidationError::InvalidDate(raw.to_string()))
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn month(&self) -> MonthKey {
        MonthKey {
            year: self.0.year(),
            month: self.0.month(),
        }
    }
}

impl fmt::Display for IsoDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl Serialize for IsoDate {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for IsoDate {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        IsoDate::parse_loose(&raw).map_err(serde::de::Error::custom)
    }
}

/// Trimmed first ten characters of a date-like string.
///
/// Used as a grouping key even when the value does not parse as a date.
pub fn normalize_date_prefix(raw: &str) -> &str {
    let trimmed = raw.trim();
    match trimmed.char_indices().nth(10) {
        Some((idx, _)) => &trimmed[..idx],
        None => trimmed,
    }
}

/// Calendar month rendered as `YYYY-MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    pub fn of(date: NaiveDate) -> Self {
        IsoDate::new(date).month()
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for MonthKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Lifecycle of an inspection checklist as shown to staff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InspectionStatus {
    NotYetDue,
    DueToday,
    Overdue,
    Completed,
}

impl InspectionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            InspectionStatus::NotYetDue => "זמן הביקורות טרם הגיע",
            InspectionStatus::DueToday => "דורש ביקורת היום",
            InspectionStatus::Overdue => "זמן הביקורת עבר",
            InspectionStatus::Completed => "הביקורת הושלמה",
        }
    }
}

impl fmt::Display for InspectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for InspectionStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}
