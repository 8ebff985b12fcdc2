//! Row drag controller with touch emulation.
//!
//! # Responsibility
//! - Turn timestamped press/move/release samples into reorder or
//!   placement-change commands, uniformly for pointer and touch input.
//! - Arbitrate between scroll, drag, and long-press edit on the same
//!   press gesture.
//!
//! # Invariants
//! - One mutable session per controller; a new press while a gesture
//!   is unresolved is ignored.
//! - Phases move `Pressed -> PendingDrag -> Dragging`; movement beyond
//!   tolerance while merely pressed is a scroll and clears the session.
//! - The long-press edit fires only while displacement has stayed
//!   within tolerance; movement beyond tolerance cancels the edit path
//!   without cancelling the drag path.
//! - Release commits the last recorded target/position; releasing with
//!   no recorded target, leaving the container, or an explicit cancel
//!   clears all transient state with no persistence.
//! - The controller never reads a clock; every input carries its own
//!   timestamp, and callers drive held-still transitions via `poll`.

use crate::model::item::{ItemId, PartitionRef};
use crate::model::placement::Placement;
use crate::service::ordering_service::DropPosition;
use chrono::NaiveDate;

/// Timing and tolerance knobs for gesture arbitration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragConfig {
    /// Press-and-hold duration before a drag arms.
    pub hold_to_drag_ms: u64,
    /// Longer hold that opens the row editor instead.
    pub hold_to_edit_ms: u64,
    /// Displacement beyond this breaks hold-based transitions.
    pub move_tolerance_px: f32,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            hold_to_drag_ms: 180,
            hold_to_edit_ms: 550,
            move_tolerance_px: 8.0,
        }
    }
}

/// One timestamped pointer position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub x: f32,
    pub y: f32,
    pub at_ms: u64,
}

/// The common shape the controller knows about a draggable row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemHandle {
    pub id: ItemId,
    pub partition: PartitionRef,
}

/// Topmost element found under the pointer during a move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DropTarget {
    /// A sibling or foreign row; `top`/`bottom` bound its vertical
    /// extent so the midpoint decides above/below.
    Row {
        item: ItemHandle,
        top: f32,
        bottom: f32,
    },
    /// Empty space of a placement bucket.
    Bucket { placement: Placement },
}

/// Command a committed gesture resolves to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragCommand {
    /// Same-partition drop: reorder relative to the target row.
    Reorder {
        partition: PartitionRef,
        dragged: ItemId,
        target: ItemId,
        position: DropPosition,
    },
    /// Drop between two content rows sharing one day: reorder within
    /// the day's mixed list even though the kinds differ.
    ReorderDayContent {
        day: NaiveDate,
        dragged: ItemId,
        target: ItemId,
        position: DropPosition,
    },
    /// Cross-partition drop: placement change, appended at the
    /// destination's end.
    Move {
        dragged: ItemId,
        destination: Placement,
    },
}

/// Result of feeding one input event into the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragUpdate {
    None,
    /// Hold threshold reached; the row may show its drag affordance.
    DragArmed,
    /// Movement promoted the armed hold into an active drag.
    DragStarted,
    /// The longer hold won; open the row editor, gesture finished.
    OpenEditor { item: ItemHandle },
    /// Release resolved to a persistable command.
    Commit(DragCommand),
    /// Gesture ended with no persistence.
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DragPhase {
    Pressed,
    PendingDrag,
    Dragging,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum StoredTarget {
    Row {
        item: ItemHandle,
        position: DropPosition,
    },
    Bucket {
        placement: Placement,
    },
}

/// Transient state of one in-flight gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
struct DragSession {
    item: ItemHandle,
    origin: PointerSample,
    phase: DragPhase,
    target: Option<StoredTarget>,
}

/// Gesture state machine shared by pointer and emulated-touch input.
#[derive(Debug)]
pub struct DragController {
    config: DragConfig,
    session: Option<DragSession>,
}

impl DragController {
    pub fn new(config: DragConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    /// Whether a gesture is currently unresolved.
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Whether the session has reached the dragging phase.
    pub fn is_dragging(&self) -> bool {
        matches!(
            self.session,
            Some(DragSession {
                phase: DragPhase::Dragging,
                ..
            })
        )
    }

    /// The row currently being dragged, if any.
    pub fn dragged_item(&self) -> Option<ItemHandle> {
        self.session.map(|session| session.item)
    }

    /// Registers a press on a draggable row.
    pub fn press(&mut self, item: ItemHandle, sample: PointerSample) -> DragUpdate {
        if self.session.is_some() {
            return DragUpdate::None;
        }
        self.session = Some(DragSession {
            item,
            origin: sample,
            phase: DragPhase::Pressed,
            target: None,
        });
        DragUpdate::None
    }

    /// Timer tick driving held-still transitions (drag arming and the
    /// long-press edit).
    pub fn poll(&mut self, now_ms: u64) -> DragUpdate {
        let Some(mut session) = self.session else {
            return DragUpdate::None;
        };
        let elapsed = now_ms.saturating_sub(session.origin.at_ms);

        match session.phase {
            DragPhase::Pressed | DragPhase::PendingDrag
                if elapsed >= self.config.hold_to_edit_ms =>
            {
                self.session = None;
                DragUpdate::OpenEditor { item: session.item }
            }
            DragPhase::Pressed if elapsed >= self.config.hold_to_drag_ms => {
                session.phase = DragPhase::PendingDrag;
                self.session = Some(session);
                DragUpdate::DragArmed
            }
            _ => DragUpdate::None,
        }
    }

    /// Pointer movement with the hit-test result for the topmost
    /// element under the pointer. `None` between rows keeps the last
    /// recorded target.
    pub fn pointer_move(
        &mut self,
        sample: PointerSample,
        hover: Option<DropTarget>,
    ) -> DragUpdate {
        // Held-still thresholds may be crossed by the time this sample
        // arrives; settle those first so the movement below promotes
        // the right phase.
        let timed = self.poll(sample.at_ms);
        if !matches!(timed, DragUpdate::None) {
            return timed;
        }

        let Some(mut session) = self.session else {
            return DragUpdate::None;
        };

        let dx = sample.x - session.origin.x;
        let dy = sample.y - session.origin.y;
        let displaced = (dx * dx + dy * dy).sqrt() > self.config.move_tolerance_px;

        match session.phase {
            DragPhase::Pressed => {
                if displaced {
                    // Early movement means a scroll; both the drag and
                    // the edit die together.
                    self.session = None;
                    return DragUpdate::Cancelled;
                }
                DragUpdate::None
            }
            DragPhase::PendingDrag => {
                if displaced {
                    session.phase = DragPhase::Dragging;
                    session.target = resolve_target(sample, hover).or(session.target);
                    self.session = Some(session);
                    return DragUpdate::DragStarted;
                }
                DragUpdate::None
            }
            DragPhase::Dragging => {
                if let Some(resolved) = resolve_target(sample, hover) {
                    session.target = Some(resolved);
                    self.session = Some(session);
                }
                DragUpdate::None
            }
        }
    }

    /// Pointer release; commits the last recorded target, if any.
    pub fn release(&mut self, sample: PointerSample) -> DragUpdate {
        let Some(session) = self.session.take() else {
            return DragUpdate::None;
        };

        match session.phase {
            // A short press is a plain tap; click handling is not ours.
            DragPhase::Pressed => DragUpdate::None,
            DragPhase::PendingDrag => {
                let elapsed = sample.at_ms.saturating_sub(session.origin.at_ms);
                if elapsed >= self.config.hold_to_edit_ms {
                    DragUpdate::OpenEditor { item: session.item }
                } else {
                    DragUpdate::None
                }
            }
            DragPhase::Dragging => match session.target {
                Some(StoredTarget::Row { item, position }) => {
                    if item.partition == session.item.partition {
                        DragUpdate::Commit(DragCommand::Reorder {
                            partition: session.item.partition,
                            dragged: session.item.id,
                            target: item.id,
                            position,
                        })
                    } else if let Some(day) =
                        shared_content_day(session.item.partition, item.partition)
                    {
                        DragUpdate::Commit(DragCommand::ReorderDayContent {
                            day,
                            dragged: session.item.id,
                            target: item.id,
                            position,
                        })
                    } else {
                        DragUpdate::Commit(DragCommand::Move {
                            dragged: session.item.id,
                            destination: item.partition.placement,
                        })
                    }
                }
                Some(StoredTarget::Bucket { placement }) => {
                    DragUpdate::Commit(DragCommand::Move {
                        dragged: session.item.id,
                        destination: placement,
                    })
                }
                None => DragUpdate::Cancelled,
            },
        }
    }

    /// The pointer left the draggable container.
    pub fn leave_container(&mut self) -> DragUpdate {
        self.cancel()
    }

    /// Explicit cancel; clears all transient state.
    pub fn cancel(&mut self) -> DragUpdate {
        if self.session.take().is_some() {
            DragUpdate::Cancelled
        } else {
            DragUpdate::None
        }
    }
}

/// Two content rows placed on the same day order within that day's
/// mixed list; their differing kinds put them in different partitions.
fn shared_content_day(dragged: PartitionRef, target: PartitionRef) -> Option<NaiveDate> {
    if !dragged.kind.is_content() || !target.kind.is_content() {
        return None;
    }
    let day = dragged.placement.day()?;
    (target.placement.day()? == day).then_some(day)
}

/// Reads the drop position from the pointer's vertical position
/// relative to the hovered row's midpoint.
fn resolve_target(sample: PointerSample, hover: Option<DropTarget>) -> Option<StoredTarget> {
    match hover? {
        DropTarget::Row { item, top, bottom } => {
            let midpoint = (top + bottom) / 2.0;
            let position = if sample.y < midpoint {
                DropPosition::Above
            } else {
                DropPosition::Below
            };
            Some(StoredTarget::Row { item, position })
        }
        DropTarget::Bucket { placement } => Some(StoredTarget::Bucket { placement }),
    }
}
