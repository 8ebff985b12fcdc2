//! Placement selector option builder.
//!
//! # Responsibility
//! - Produce the grouped options a placement picker shows: the next
//!   seven calendar days and the four rolling parking windows plus an
//!   explicit unplaced choice.
//!
//! # Invariants
//! - Option values are canonical placement strings.
//! - Day labels are Today, Tomorrow, then plain weekday names.

use crate::model::placement::{Placement, WindowKind};
use crate::plan::windows::planning_windows;
use chrono::{Datelike, Days, NaiveDate, Weekday};

/// One selectable placement choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementOption {
    /// Canonical placement string (`none`, `D|...`, `P|...`).
    pub value: String,
    /// Human-facing label.
    pub label: String,
}

/// The grouped placement picker contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementOptions {
    /// Next seven calendar days, starting with today.
    pub days: Vec<PlacementOption>,
    /// The four rolling windows plus the unplaced choice.
    pub parking: Vec<PlacementOption>,
}

/// Builds selector options for an explicit local `today`.
pub fn placement_options(today: NaiveDate) -> PlacementOptions {
    let days = (0..7)
        .map(|offset| {
            let day = today
                .checked_add_days(Days::new(offset))
                .unwrap_or(today);
            PlacementOption {
                value: Placement::on_day(day).encode(),
                label: day_label(offset, day),
            }
        })
        .collect();

    let windows = planning_windows(today);
    let parking = vec![
        PlacementOption {
            value: Placement::in_window(WindowKind::Workweek, windows.this_week_start).encode(),
            label: "This week".to_string(),
        },
        PlacementOption {
            value: Placement::in_window(WindowKind::Weekend, windows.this_weekend_start).encode(),
            label: "This weekend".to_string(),
        },
        PlacementOption {
            value: Placement::in_window(WindowKind::Workweek, windows.next_week_start).encode(),
            label: "Next week".to_string(),
        },
        PlacementOption {
            value: Placement::in_window(WindowKind::Weekend, windows.next_weekend_start).encode(),
            label: "Next weekend".to_string(),
        },
        PlacementOption {
            value: Placement::Unplaced.encode(),
            label: "Unplaced".to_string(),
        },
    ];

    PlacementOptions { days, parking }
}

fn day_label(offset: u64, day: NaiveDate) -> String {
    match offset {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        _ => weekday_name(day.weekday()).to_string(),
    }
}

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
