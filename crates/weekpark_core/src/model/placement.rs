//! Placement domain type and canonical string codec.
//!
//! # Responsibility
//! - Define where in time an item lives: a specific day, a rolling
//!   parking window, or unplaced.
//! - Encode/decode the canonical placement strings used by storage and
//!   the placement selector (`none`, `D|<date>`, `P|<kind>|<date>`).
//!
//! # Invariants
//! - `decode(encode(p)) == p` for every placement value.
//! - Canonical day strings use `YYYY-MM-DD`, so lexicographic order of
//!   `D|...` values equals chronological order.
//! - A malformed canonical string is an invariant violation, never a
//!   user-facing input error.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

const DATE_FORMAT: &str = "%Y-%m-%d";
const UNPLACED_TOKEN: &str = "none";

/// Rolling parking window category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    /// Monday-anchored work week.
    Workweek,
    /// Saturday-anchored weekend.
    Weekend,
}

impl WindowKind {
    fn as_token(self) -> &'static str {
        match self {
            Self::Workweek => "workweek",
            Self::Weekend => "weekend",
        }
    }

    fn from_token(value: &str) -> Option<Self> {
        match value {
            "workweek" => Some(Self::Workweek),
            "weekend" => Some(Self::Weekend),
            _ => None,
        }
    }
}

/// Where in time an item currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "where")]
pub enum Placement {
    /// Not scheduled anywhere yet.
    Unplaced,
    /// Pinned to one calendar day.
    OnDay { day: NaiveDate },
    /// Staged in one rolling parking window.
    InWindow { kind: WindowKind, start: NaiveDate },
}

impl Placement {
    /// Convenience constructor for day placements.
    pub fn on_day(day: NaiveDate) -> Self {
        Self::OnDay { day }
    }

    /// Convenience constructor for window placements.
    pub fn in_window(kind: WindowKind, start: NaiveDate) -> Self {
        Self::InWindow { kind, start }
    }

    /// Returns the day for day placements.
    pub fn day(&self) -> Option<NaiveDate> {
        match self {
            Self::OnDay { day } => Some(*day),
            _ => None,
        }
    }

    /// Encodes this placement into its canonical string.
    pub fn encode(&self) -> String {
        match self {
            Self::Unplaced => UNPLACED_TOKEN.to_string(),
            Self::OnDay { day } => format!("D|{}", day.format(DATE_FORMAT)),
            Self::InWindow { kind, start } => {
                format!("P|{}|{}", kind.as_token(), start.format(DATE_FORMAT))
            }
        }
    }

    /// Decodes a canonical placement string.
    ///
    /// # Errors
    /// Returns [`PlacementParseError`] for any string that is not an
    /// exact canonical encoding.
    pub fn decode(value: &str) -> Result<Self, PlacementParseError> {
        if value == UNPLACED_TOKEN {
            return Ok(Self::Unplaced);
        }

        let mut parts = value.split('|');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some("D"), Some(day), None, None) => Ok(Self::OnDay {
                day: parse_date(value, day)?,
            }),
            (Some("P"), Some(kind), Some(start), None) => {
                let kind = WindowKind::from_token(kind)
                    .ok_or_else(|| PlacementParseError::UnknownWindowKind {
                        value: value.to_string(),
                        kind: kind.to_string(),
                    })?;
                Ok(Self::InWindow {
                    kind,
                    start: parse_date(value, start)?,
                })
            }
            _ => Err(PlacementParseError::Malformed {
                value: value.to_string(),
            }),
        }
    }
}

fn parse_date(full: &str, date: &str) -> Result<NaiveDate, PlacementParseError> {
    NaiveDate::parse_from_str(date, DATE_FORMAT).map_err(|_| PlacementParseError::InvalidDate {
        value: full.to_string(),
        date: date.to_string(),
    })
}

/// Error for malformed canonical placement strings.
///
/// Encodings are produced only by this module, so hitting this error
/// means persisted or wire data was corrupted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementParseError {
    Malformed { value: String },
    UnknownWindowKind { value: String, kind: String },
    InvalidDate { value: String, date: String },
}

impl Display for PlacementParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed { value } => write!(f, "malformed placement string `{value}`"),
            Self::UnknownWindowKind { value, kind } => {
                write!(f, "unknown window kind `{kind}` in placement `{value}`")
            }
            Self::InvalidDate { value, date } => {
                write!(f, "invalid date `{date}` in placement `{value}`")
            }
        }
    }
}

impl Error for PlacementParseError {}
