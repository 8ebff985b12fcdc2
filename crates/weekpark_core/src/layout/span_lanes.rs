//! Multi-day span lane packing for week rows.
//!
//! # Responsibility
//! - Clip multi-day entries to one displayed week row and assign each
//!   a vertical lane so overlapping spans never collide.
//!
//! # Invariants
//! - Output order is deterministic: `(start_col, end_col, title)`.
//! - A lane is reused only when its last span ends strictly before the
//!   next span's start column.

use crate::model::item::{Item, ItemId};
use chrono::{Days, NaiveDate};

/// Days rendered per week row.
pub const WEEK_COLUMNS: usize = 7;

/// One multi-day entry before clipping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanEntry {
    pub item_id: ItemId,
    pub title: String,
    /// First covered day.
    pub start: NaiveDate,
    /// Last covered day, inclusive.
    pub end: NaiveDate,
}

/// One span clipped to a week row with its assigned lane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedSpan {
    pub item_id: ItemId,
    pub title: String,
    /// First covered column in this row, `0..=6`.
    pub start_col: usize,
    /// Last covered column in this row, inclusive.
    pub end_col: usize,
    /// Whether the span extends past the row's left edge.
    pub continues_left: bool,
    /// Whether the span extends past the row's right edge.
    pub continues_right: bool,
    /// Vertical rendering slot.
    pub lane: usize,
}

/// Derives span entries from day-placed plans that run past their
/// placement day.
pub fn plan_spans(items: &[Item]) -> Vec<SpanEntry> {
    items
        .iter()
        .filter_map(|item| {
            let start = item.placement.day()?;
            let end = item.end_day?;
            if end <= start {
                return None;
            }
            Some(SpanEntry {
                item_id: item.uuid,
                title: item.title.clone(),
                start,
                end,
            })
        })
        .collect()
}

/// Packs the spans overlapping one week row into lanes.
///
/// The row covers `week_start ..= week_start + 6`. Spans are clipped
/// to the row, sorted by `(start_col, end_col, title)`, then greedily
/// assigned to the first lane whose current end column is strictly
/// less than the span's start column.
pub fn pack_week_row(week_start: NaiveDate, entries: &[SpanEntry]) -> Vec<PackedSpan> {
    let week_end = week_start
        .checked_add_days(Days::new((WEEK_COLUMNS - 1) as u64))
        .unwrap_or(week_start);

    let mut clipped: Vec<PackedSpan> = entries
        .iter()
        .filter(|entry| entry.start <= week_end && entry.end >= week_start)
        .map(|entry| {
            let visible_start = entry.start.max(week_start);
            let visible_end = entry.end.min(week_end);
            PackedSpan {
                item_id: entry.item_id,
                title: entry.title.clone(),
                start_col: days_between(week_start, visible_start),
                end_col: days_between(week_start, visible_end),
                continues_left: entry.start < week_start,
                continues_right: entry.end > week_end,
                lane: 0,
            }
        })
        .collect();

    clipped.sort_by(|a, b| {
        a.start_col
            .cmp(&b.start_col)
            .then(a.end_col.cmp(&b.end_col))
            .then_with(|| a.title.cmp(&b.title))
    });

    // Greedy first-fit: each slot remembers the end column of the last
    // span placed in it.
    let mut lane_ends: Vec<usize> = Vec::new();
    for span in &mut clipped {
        let lane = lane_ends
            .iter()
            .position(|&end| end < span.start_col)
            .unwrap_or_else(|| {
                lane_ends.push(0);
                lane_ends.len() - 1
            });
        lane_ends[lane] = span.end_col;
        span.lane = lane;
    }

    clipped
}

fn days_between(start: NaiveDate, end: NaiveDate) -> usize {
    (end - start).num_days().max(0) as usize
}
