//! Day-schedule block model and time-of-day codec.
//!
//! # Responsibility
//! - Define the `{title, starts_at, ends_at}` block scoped to one
//!   calendar day.
//! - Convert between wire times (zero-padded 24-hour `HH:MM:00`) and
//!   free-form user input (`h:mm am/pm`, or 24-hour `H:MM`).
//!
//! # Invariants
//! - `starts_at < ends_at` always.
//! - Wire times are exchanged as exactly `HH:MM:00`.

use chrono::{NaiveDate, NaiveTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a day-schedule block.
pub type BlockId = Uuid;

static FREE_FORM_TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(\d{1,2})(?::([0-5]\d))?\s*(am|pm)?\s*$").expect("valid time regex")
});

const WIRE_TIME_FORMAT: &str = "%H:%M:%S";

/// One scheduled time-of-day block within a single calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "ScheduleBlockWire", try_from = "ScheduleBlockWire")]
pub struct ScheduleBlock {
    pub uuid: BlockId,
    /// Owning calendar day.
    pub day: NaiveDate,
    pub title: String,
    pub starts_at: NaiveTime,
    pub ends_at: NaiveTime,
}

impl ScheduleBlock {
    /// Creates a block with a generated stable ID.
    pub fn new(
        day: NaiveDate,
        title: impl Into<String>,
        starts_at: NaiveTime,
        ends_at: NaiveTime,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            day,
            title: title.into(),
            starts_at,
            ends_at,
        }
    }

    /// Checks the block's construction invariants.
    ///
    /// Repository write paths call this before any SQL mutation.
    pub fn validate(&self) -> Result<(), BlockValidationError> {
        if self.uuid.is_nil() {
            return Err(BlockValidationError::NilUuid);
        }
        if self.title.trim().is_empty() {
            return Err(BlockValidationError::BlankTitle);
        }
        if self.starts_at >= self.ends_at {
            return Err(BlockValidationError::InvalidTimeRange {
                starts_at: format_wire_time(self.starts_at),
                ends_at: format_wire_time(self.ends_at),
            });
        }
        Ok(())
    }
}

/// Validation failures for [`ScheduleBlock`] construction and input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockValidationError {
    NilUuid,
    BlankTitle,
    /// `starts_at` must be strictly before `ends_at`.
    InvalidTimeRange { starts_at: String, ends_at: String },
    /// User input did not parse as a time of day.
    UnparsableTime(String),
}

impl Display for BlockValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilUuid => write!(f, "block uuid must not be nil"),
            Self::BlankTitle => write!(f, "block title must not be blank"),
            Self::InvalidTimeRange { starts_at, ends_at } => {
                write!(f, "ends_at ({ends_at}) must be after starts_at ({starts_at})")
            }
            Self::UnparsableTime(value) => write!(f, "unparsable time of day `{value}`"),
        }
    }
}

impl Error for BlockValidationError {}

/// Formats a time of day into the wire shape `HH:MM:00`.
///
/// Seconds are always zeroed; blocks snap to minute granularity.
pub fn format_wire_time(value: NaiveTime) -> String {
    let floored = value.with_second(0).unwrap_or(value);
    floored.format(WIRE_TIME_FORMAT).to_string()
}

/// Parses a wire time (`HH:MM:00`).
pub fn parse_wire_time(value: &str) -> Result<NaiveTime, BlockValidationError> {
    NaiveTime::parse_from_str(value, WIRE_TIME_FORMAT)
        .map_err(|_| BlockValidationError::UnparsableTime(value.to_string()))
}

/// Parses free-form user input into a time of day.
///
/// Accepted shapes: `9am`, `9:30 pm`, `12:15am` (12-hour with
/// meridiem) and `14:05`, `7` (24-hour). Minutes default to `:00`.
pub fn parse_free_form_time(value: &str) -> Result<NaiveTime, BlockValidationError> {
    let captures = FREE_FORM_TIME_RE
        .captures(value)
        .ok_or_else(|| BlockValidationError::UnparsableTime(value.to_string()))?;

    let hour: u32 = captures[1]
        .parse()
        .map_err(|_| BlockValidationError::UnparsableTime(value.to_string()))?;
    let minute: u32 = captures
        .get(2)
        .map(|m| m.as_str().parse())
        .transpose()
        .map_err(|_| BlockValidationError::UnparsableTime(value.to_string()))?
        .unwrap_or(0);

    let hour = match captures.get(3).map(|m| m.as_str().to_ascii_lowercase()) {
        Some(meridiem) => {
            if hour == 0 || hour > 12 {
                return Err(BlockValidationError::UnparsableTime(value.to_string()));
            }
            match (meridiem.as_str(), hour) {
                ("am", 12) => 0,
                ("am", h) => h,
                ("pm", 12) => 12,
                ("pm", h) => h + 12,
                _ => return Err(BlockValidationError::UnparsableTime(value.to_string())),
            }
        }
        None => {
            if hour > 23 {
                return Err(BlockValidationError::UnparsableTime(value.to_string()));
            }
            hour
        }
    };

    NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or_else(|| BlockValidationError::UnparsableTime(value.to_string()))
}

/// Wire shape: day as `YYYY-MM-DD`, times as `HH:MM:00`.
#[derive(Debug, Serialize, Deserialize)]
struct ScheduleBlockWire {
    uuid: BlockId,
    day: NaiveDate,
    title: String,
    starts_at: String,
    ends_at: String,
}

impl From<ScheduleBlock> for ScheduleBlockWire {
    fn from(value: ScheduleBlock) -> Self {
        Self {
            uuid: value.uuid,
            day: value.day,
            title: value.title,
            starts_at: format_wire_time(value.starts_at),
            ends_at: format_wire_time(value.ends_at),
        }
    }
}

impl TryFrom<ScheduleBlockWire> for ScheduleBlock {
    type Error = BlockValidationError;

    fn try_from(value: ScheduleBlockWire) -> Result<Self, Self::Error> {
        let block = ScheduleBlock {
            uuid: value.uuid,
            day: value.day,
            title: value.title,
            starts_at: parse_wire_time(&value.starts_at)?,
            ends_at: parse_wire_time(&value.ends_at)?,
        };
        block.validate()?;
        Ok(block)
    }
}
