//! Patient identity and chronological keys.
//!
//! Continuous readings are keyed by `(PatientId, Stamp)`; lab panels by
//! `(PatientId, date)`. Wire formats are fixed: dates serialize day-month-year
//! (`31-12-2024`), times with dotted separators (`14.30.00`). The parser also
//! accepts colon-separated times; everything else is a malformed key.

use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Wire format for calendar dates.
pub const DATE_FORMAT: &str = "%d-%m-%Y";
/// Wire format for times of day (dotted separators).
pub const TIME_FORMAT: &str = "%H.%M.%S";
/// Accepted on input only.
const TIME_FORMAT_COLONS: &str = "%H:%M:%S";

// ---------------------------------------------------------------------------
// PatientId
// ---------------------------------------------------------------------------

/// Opaque patient identifier. Never blank in the canonical dataset.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientId(String);

impl PatientId {
    pub fn new(id: impl Into<String>) -> Self {
        PatientId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the identifier is empty or whitespace-only.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PatientId {
    fn from(id: &str) -> Self {
        PatientId(id.to_string())
    }
}

impl From<String> for PatientId {
    fn from(id: String) -> Self {
        PatientId(id)
    }
}

// ---------------------------------------------------------------------------
// Stamp
// ---------------------------------------------------------------------------

/// Chronological key for a continuous reading: calendar date plus time of day.
///
/// Ordering is `(date, time)`, so sorting stamps sorts chronologically.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Stamp {
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl Stamp {
    pub fn new(date: NaiveDate, time: NaiveTime) -> Self {
        Stamp { date, time }
    }

    /// Parse a date cell in the `%d-%m-%Y` wire format.
    ///
    /// Returns `None` for malformed input: the row then has no chronological
    /// key and cannot be placed on a timeline.
    pub fn parse_date(text: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).ok()
    }

    /// Parse a time cell. Dotted separators are canonical; colons accepted.
    pub fn parse_time(text: &str) -> Option<NaiveTime> {
        let t = text.trim();
        NaiveTime::parse_from_str(t, TIME_FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(t, TIME_FORMAT_COLONS))
            .ok()
    }

    /// Parse a date/time cell pair; `None` when either half is malformed.
    pub fn parse(date_text: &str, time_text: &str) -> Option<Self> {
        Some(Stamp {
            date: Self::parse_date(date_text)?,
            time: Self::parse_time(time_text)?,
        })
    }

    /// Date half in the wire format.
    pub fn date_text(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }

    /// Time half in the wire format.
    pub fn time_text(&self) -> String {
        self.time.format(TIME_FORMAT).to_string()
    }
}

impl fmt::Display for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date_text(), self.time_text())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
