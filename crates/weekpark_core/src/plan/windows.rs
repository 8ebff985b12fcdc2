//! Rolling planning window calculator.
//!
//! # Responsibility
//! - Derive the four parking window anchors from an explicit "today".
//!
//! # Invariants
//! - Workweek windows anchor on Monday, weekend windows on Saturday.
//! - During Saturday/Sunday, "this week" means the upcoming work week,
//!   never the one just ending.
//! - Pure and idempotent for a fixed `today`; callers re-derive at
//!   least once per calendar day boundary.

use chrono::{Datelike, Days, NaiveDate, Weekday};

/// The four rolling parking window anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanningWindows {
    pub this_week_start: NaiveDate,
    pub next_week_start: NaiveDate,
    pub this_weekend_start: NaiveDate,
    pub next_weekend_start: NaiveDate,
}

/// Computes the planning windows for an explicit local `today`.
pub fn planning_windows(today: NaiveDate) -> PlanningWindows {
    let this_week_start = this_week_start(today);
    let this_weekend_start = this_weekend_start(today);
    PlanningWindows {
        this_week_start,
        next_week_start: plus_days(this_week_start, 7),
        this_weekend_start,
        next_weekend_start: plus_days(this_weekend_start, 7),
    }
}

/// Monday of the current week, rolling forward to the following Monday
/// when today falls on the weekend.
fn this_week_start(today: NaiveDate) -> NaiveDate {
    let days_from_monday = today.weekday().num_days_from_monday() as u64;
    let monday = today
        .checked_sub_days(Days::new(days_from_monday))
        .unwrap_or(today);
    match today.weekday() {
        Weekday::Sat | Weekday::Sun => plus_days(monday, 7),
        _ => monday,
    }
}

/// Saturday anchoring the current-or-upcoming weekend.
///
/// Saturday maps to itself, Sunday to yesterday; weekdays map to the
/// next Saturday strictly after today.
fn this_weekend_start(today: NaiveDate) -> NaiveDate {
    match today.weekday() {
        Weekday::Sat => today,
        Weekday::Sun => today.pred_opt().unwrap_or(today),
        _ => {
            let days_until_saturday =
                (Weekday::Sat.num_days_from_monday() + 7 - today.weekday().num_days_from_monday())
                    % 7;
            plus_days(today, days_until_saturday as u64)
        }
    }
}

fn plus_days(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_add_days(Days::new(days)).unwrap_or(date)
}
