//! Pure visual-layout algorithms.
//!
//! # Responsibility
//! - Assign lanes to multi-day spans per week row.
//! - Map time-of-day to pixels and drive day-grid block gestures.
//!
//! # Invariants
//! - Nothing here touches persistence; outputs feed the view layer and
//!   the schedule service.

pub mod day_grid;
pub mod span_lanes;
