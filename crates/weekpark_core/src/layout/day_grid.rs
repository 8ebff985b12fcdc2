//! Day-schedule pixel grid and block gesture handling.
//!
//! # Responsibility
//! - Map time-of-day to vertical pixels inside one of the day's two
//!   fixed-length half-day columns.
//! - Drive the provisional-create and bottom-edge-resize gestures with
//!   15-minute snapping and collision-aware clamping.
//!
//! # Invariants
//! - `pixels_per_hour = column_px / column_hours`; every committed
//!   block height is an exact multiple of `pixels_per_hour / 4`.
//! - Within one column every minute is covered by at most one block;
//!   extension is clamped to the gap before the next sibling or the
//!   column end.
//! - Intermediate gesture moves touch only the working span; nothing
//!   persists before release.
//! - One unresolved gesture per grid; new presses are rejected until
//!   it resolves.

use crate::model::block::{BlockId, ScheduleBlock};
use chrono::Timelike;

/// Snap granularity for block starts and ends.
pub const GRID_MINUTES: u32 = 15;

/// Which of the day's two columns a pixel position belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnHalf {
    First,
    Second,
}

/// Fixed geometry of the two half-day columns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayGridSpec {
    /// Hour of day at which the first column begins.
    pub first_start_hour: u32,
    /// Length of each column in hours; the second column starts where
    /// the first ends.
    pub column_hours: u32,
    /// Rendered column height in pixels.
    pub column_px: f32,
}

impl Default for DayGridSpec {
    fn default() -> Self {
        Self {
            first_start_hour: 6,
            column_hours: 8,
            column_px: 480.0,
        }
    }
}

impl DayGridSpec {
    pub fn pixels_per_hour(&self) -> f32 {
        self.column_px / self.column_hours as f32
    }

    /// Pixel height of one snap step.
    pub fn snap_step_px(&self) -> f32 {
        self.pixels_per_hour() / 4.0
    }

    /// Minute of day at which a column begins.
    pub fn column_start_minute(&self, column: ColumnHalf) -> u32 {
        match column {
            ColumnHalf::First => self.first_start_hour * 60,
            ColumnHalf::Second => (self.first_start_hour + self.column_hours) * 60,
        }
    }

    /// Minute of day at which a column ends.
    pub fn column_end_minute(&self, column: ColumnHalf) -> u32 {
        self.column_start_minute(column) + self.column_hours * 60
    }

    /// Vertical pixel offset of a minute of day within its column.
    pub fn minute_to_y(&self, column: ColumnHalf, minute_of_day: u32) -> f32 {
        let since_start = minute_of_day.saturating_sub(self.column_start_minute(column));
        (since_start as f32 / 60.0) * self.pixels_per_hour()
    }

    /// Minute of day for a vertical pixel offset, floored to the slot
    /// containing the pointer.
    pub fn minute_at_y(&self, column: ColumnHalf, y: f32) -> u32 {
        let clamped = y.clamp(0.0, self.column_px);
        let raw = (clamped / self.pixels_per_hour()) * 60.0;
        let snapped = (raw / GRID_MINUTES as f32).floor() as u32 * GRID_MINUTES;
        let snapped = snapped.min(self.column_hours * 60 - GRID_MINUTES);
        self.column_start_minute(column) + snapped
    }

    /// Minute of day for a drag-extend pixel offset, rounded to the
    /// nearest grid line.
    pub fn edge_minute_at_y(&self, column: ColumnHalf, y: f32) -> u32 {
        let clamped = y.clamp(0.0, self.column_px);
        let raw = (clamped / self.pixels_per_hour()) * 60.0;
        let snapped = (raw / GRID_MINUTES as f32).round() as u32 * GRID_MINUTES;
        self.column_start_minute(column) + snapped.min(self.column_hours * 60)
    }

    /// Pixel rect (`top`, `height`) of a minute span within its column.
    pub fn span_geometry(&self, column: ColumnHalf, span: MinuteSpan) -> (f32, f32) {
        let top = self.minute_to_y(column, span.start);
        let height = ((span.end - span.start) as f32 / 60.0) * self.pixels_per_hour();
        (top, height)
    }
}

/// Closed-open minute-of-day range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinuteSpan {
    pub start: u32,
    pub end: u32,
}

impl MinuteSpan {
    /// Converts a stored block into its minute span.
    pub fn from_block(block: &ScheduleBlock) -> Self {
        Self {
            start: block.starts_at.hour() * 60 + block.starts_at.minute(),
            end: block.ends_at.hour() * 60 + block.ends_at.minute(),
        }
    }

    pub fn covers(&self, minute: u32) -> bool {
        minute >= self.start && minute < self.end
    }
}

/// Gesture timing and tolerance knobs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridConfig {
    /// Press-and-hold duration before a provisional block appears.
    pub hold_ms: u64,
    /// Movement beyond this while holding means a scroll, not a
    /// create.
    pub move_tolerance_px: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            hold_ms: 350,
            move_tolerance_px: 6.0,
        }
    }
}

/// Result of feeding one input event into the grid editor.
#[derive(Debug, Clone, PartialEq)]
pub enum GridUpdate {
    None,
    /// A provisional block appeared at the snapped press time.
    CreateStarted { span: MinuteSpan },
    /// The provisional block's working end moved.
    CreateResized { span: MinuteSpan },
    /// The create gesture was released; the block awaits a title.
    CreatePending { column: ColumnHalf, span: MinuteSpan },
    /// A resize working end moved (nothing persisted yet).
    ResizeMoved { span: MinuteSpan },
    /// A resize was released; the new end time may now persist.
    ResizeCommitted { block_id: BlockId, new_end_minute: u32 },
    /// The press landed on a covered minute, there was no room for one
    /// grid unit, or another gesture is still unresolved.
    Rejected,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum GridPhase {
    /// Press received, hold threshold not yet reached.
    PendingPress {
        column: ColumnHalf,
        origin_y: f32,
        pressed_at_ms: u64,
    },
    Creating {
        column: ColumnHalf,
        anchor_minute: u32,
        working_end: u32,
    },
    Resizing {
        block_id: BlockId,
        column: ColumnHalf,
        start_minute: u32,
        working_end: u32,
    },
}

/// Create/resize gesture state for one day grid.
///
/// Sibling spans are passed per call; callers must exclude the block
/// being resized from `occupied` during a resize.
#[derive(Debug)]
pub struct DayGridEditor {
    spec: DayGridSpec,
    config: GridConfig,
    phase: Option<GridPhase>,
}

impl DayGridEditor {
    pub fn new(spec: DayGridSpec, config: GridConfig) -> Self {
        Self {
            spec,
            config,
            phase: None,
        }
    }

    pub fn spec(&self) -> &DayGridSpec {
        &self.spec
    }

    /// Whether a gesture is currently unresolved.
    pub fn is_active(&self) -> bool {
        self.phase.is_some()
    }

    /// Registers a press on empty column space.
    pub fn press(&mut self, column: ColumnHalf, y: f32, at_ms: u64) -> GridUpdate {
        if self.phase.is_some() {
            return GridUpdate::Rejected;
        }
        self.phase = Some(GridPhase::PendingPress {
            column,
            origin_y: y,
            pressed_at_ms: at_ms,
        });
        GridUpdate::None
    }

    /// Registers a press on a block's bottom edge; resizing starts
    /// immediately, no hold required.
    pub fn begin_resize(&mut self, block_id: BlockId, column: ColumnHalf, span: MinuteSpan) -> GridUpdate {
        if self.phase.is_some() {
            return GridUpdate::Rejected;
        }
        self.phase = Some(GridPhase::Resizing {
            block_id,
            column,
            start_minute: span.start,
            working_end: span.end,
        });
        GridUpdate::None
    }

    /// Timer tick; promotes a still press into a provisional block
    /// once the hold threshold elapses.
    pub fn poll(&mut self, now_ms: u64, occupied: &[MinuteSpan]) -> GridUpdate {
        let Some(GridPhase::PendingPress {
            column,
            origin_y,
            pressed_at_ms,
        }) = self.phase
        else {
            return GridUpdate::None;
        };
        if now_ms.saturating_sub(pressed_at_ms) < self.config.hold_ms {
            return GridUpdate::None;
        }
        self.start_create(column, origin_y, occupied)
    }

    /// Pointer movement for the active gesture.
    pub fn pointer_move(&mut self, y: f32, at_ms: u64, occupied: &[MinuteSpan]) -> GridUpdate {
        match self.phase {
            None => GridUpdate::None,
            Some(GridPhase::PendingPress {
                column,
                origin_y,
                pressed_at_ms,
            }) => {
                if (y - origin_y).abs() > self.config.move_tolerance_px {
                    // Movement before the hold threshold is a scroll.
                    self.phase = None;
                    return GridUpdate::Cancelled;
                }
                if at_ms.saturating_sub(pressed_at_ms) >= self.config.hold_ms {
                    return self.start_create(column, origin_y, occupied);
                }
                GridUpdate::None
            }
            Some(GridPhase::Creating {
                column,
                anchor_minute,
                ..
            }) => {
                let working_end =
                    self.clamp_end(column, anchor_minute, self.spec.edge_minute_at_y(column, y), occupied);
                self.phase = Some(GridPhase::Creating {
                    column,
                    anchor_minute,
                    working_end,
                });
                GridUpdate::CreateResized {
                    span: MinuteSpan {
                        start: anchor_minute,
                        end: working_end,
                    },
                }
            }
            Some(GridPhase::Resizing {
                block_id,
                column,
                start_minute,
                ..
            }) => {
                let working_end =
                    self.clamp_end(column, start_minute, self.spec.edge_minute_at_y(column, y), occupied);
                self.phase = Some(GridPhase::Resizing {
                    block_id,
                    column,
                    start_minute,
                    working_end,
                });
                GridUpdate::ResizeMoved {
                    span: MinuteSpan {
                        start: start_minute,
                        end: working_end,
                    },
                }
            }
        }
    }

    /// Pointer release; resolves the gesture.
    pub fn release(&mut self) -> GridUpdate {
        match self.phase.take() {
            None => GridUpdate::None,
            // Released before the hold threshold: a plain tap.
            Some(GridPhase::PendingPress { .. }) => GridUpdate::Cancelled,
            Some(GridPhase::Creating {
                column,
                anchor_minute,
                working_end,
            }) => GridUpdate::CreatePending {
                column,
                span: MinuteSpan {
                    start: anchor_minute,
                    end: working_end,
                },
            },
            Some(GridPhase::Resizing {
                block_id,
                working_end,
                ..
            }) => GridUpdate::ResizeCommitted {
                block_id,
                new_end_minute: working_end,
            },
        }
    }

    /// Explicit cancel; clears all transient state.
    pub fn cancel(&mut self) -> GridUpdate {
        if self.phase.take().is_some() {
            GridUpdate::Cancelled
        } else {
            GridUpdate::None
        }
    }

    fn start_create(&mut self, column: ColumnHalf, y: f32, occupied: &[MinuteSpan]) -> GridUpdate {
        let anchor = self.spec.minute_at_y(column, y);
        if occupied.iter().any(|span| span.covers(anchor)) {
            self.phase = None;
            return GridUpdate::Rejected;
        }

        let max_end = self.max_end(column, anchor, occupied);
        if max_end < anchor + GRID_MINUTES {
            // No room for even one grid unit before the next sibling.
            self.phase = None;
            return GridUpdate::Rejected;
        }

        let working_end = anchor + GRID_MINUTES;
        self.phase = Some(GridPhase::Creating {
            column,
            anchor_minute: anchor,
            working_end,
        });
        GridUpdate::CreateStarted {
            span: MinuteSpan {
                start: anchor,
                end: working_end,
            },
        }
    }

    /// Clamps a desired end minute to `[start + one grid unit, gap to
    /// the next sibling's start or the column end]`.
    fn clamp_end(
        &self,
        column: ColumnHalf,
        start: u32,
        desired_end: u32,
        occupied: &[MinuteSpan],
    ) -> u32 {
        let min_end = start + GRID_MINUTES;
        let max_end = self.max_end(column, start, occupied);
        desired_end.clamp(min_end, max_end.max(min_end))
    }

    fn max_end(&self, column: ColumnHalf, start: u32, occupied: &[MinuteSpan]) -> u32 {
        let column_end = self.spec.column_end_minute(column);
        occupied
            .iter()
            .filter(|span| span.start > start)
            .map(|span| span.start)
            .min()
            .unwrap_or(column_end)
            .min(column_end)
    }
}
