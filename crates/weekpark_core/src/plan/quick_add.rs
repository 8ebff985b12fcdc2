//! Quick-add hashtag shorthand parser.
//!
//! # Responsibility
//! - Split free quick-add text into a stored title plus recognized
//!   `#tag` directives (item kind, absolute day, window shortcut,
//!   placement clear).
//!
//! # Invariants
//! - Unrecognized tags remain in the title verbatim.
//! - Later tags of the same category override earlier ones; day,
//!   window and no-date tags share the placement category.
//! - Weekday tags resolve to the NEXT occurrence strictly after today.
//! - A blank resulting title is a validation failure, never a silently
//!   created item.

use crate::model::item::ItemKind;
use crate::model::placement::{Placement, WindowKind};
use crate::plan::windows::planning_windows;
use chrono::{Datelike, Days, NaiveDate, Weekday};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Parsed quick-add input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickAddParse {
    /// Non-tag tokens rejoined with single spaces and trimmed.
    pub title: String,
    /// Item kind directive, when one was given.
    pub kind: Option<ItemKind>,
    /// Placement directive; `Some(Unplaced)` means an explicit clear.
    pub placement: Option<Placement>,
}

/// Validation failures for quick-add input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuickAddError {
    /// Nothing remained for the title after removing recognized tags.
    EmptyTitle,
}

impl Display for QuickAddError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "quick-add title must not be blank"),
        }
    }
}

impl Error for QuickAddError {}

/// Parses quick-add text against an explicit local `today`.
pub fn parse_quick_add(text: &str, today: NaiveDate) -> Result<QuickAddParse, QuickAddError> {
    let windows = planning_windows(today);
    let mut title_tokens: Vec<&str> = Vec::new();
    let mut kind = None;
    let mut placement = None;

    for token in text.split_whitespace() {
        let Some(tag) = token.strip_prefix('#').filter(|rest| !rest.is_empty()) else {
            title_tokens.push(token);
            continue;
        };

        let lower = tag.to_ascii_lowercase();
        if let Some(parsed_kind) = parse_kind_tag(&lower) {
            kind = Some(parsed_kind);
        } else if let Some(parsed_placement) = parse_placement_tag(&lower, today, &windows) {
            placement = Some(parsed_placement);
        } else {
            title_tokens.push(token);
        }
    }

    let title = title_tokens.join(" ");
    if title.is_empty() {
        return Err(QuickAddError::EmptyTitle);
    }

    Ok(QuickAddParse {
        title,
        kind,
        placement,
    })
}

fn parse_kind_tag(tag: &str) -> Option<ItemKind> {
    match tag {
        "task" => Some(ItemKind::Task),
        "plan" => Some(ItemKind::Plan),
        "intention" => Some(ItemKind::Intention),
        _ => None,
    }
}

fn parse_placement_tag(
    tag: &str,
    today: NaiveDate,
    windows: &crate::plan::windows::PlanningWindows,
) -> Option<Placement> {
    match tag {
        "none" | "no-date" => Some(Placement::Unplaced),
        "today" => Some(Placement::on_day(today)),
        "tomorrow" => Some(Placement::on_day(plus_days(today, 1))),
        "this-week" => Some(Placement::in_window(
            WindowKind::Workweek,
            windows.this_week_start,
        )),
        "next-week" => Some(Placement::in_window(
            WindowKind::Workweek,
            windows.next_week_start,
        )),
        "this-weekend" => Some(Placement::in_window(
            WindowKind::Weekend,
            windows.this_weekend_start,
        )),
        "next-weekend" => Some(Placement::in_window(
            WindowKind::Weekend,
            windows.next_weekend_start,
        )),
        _ => parse_weekday_tag(tag).map(|weekday| {
            Placement::on_day(next_occurrence_after(today, weekday))
        }),
    }
}

fn parse_weekday_tag(tag: &str) -> Option<Weekday> {
    match tag {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        "sunday" | "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Next calendar day with the given weekday, strictly after `today`.
fn next_occurrence_after(today: NaiveDate, weekday: Weekday) -> NaiveDate {
    let delta = (weekday.num_days_from_monday() + 7 - today.weekday().num_days_from_monday()) % 7;
    let delta = if delta == 0 { 7 } else { delta };
    plus_days(today, delta as u64)
}

fn plus_days(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_add_days(Days::new(days)).unwrap_or(date)
}
