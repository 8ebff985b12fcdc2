//! Core scheduling logic for weekpark.
//! This crate is the single source of truth for placement, ordering
//! and layout invariants.

pub mod db;
pub mod drag;
pub mod layout;
pub mod logging;
pub mod model;
pub mod plan;
pub mod repo;
pub mod service;

pub use drag::{
    DragCommand, DragConfig, DragController, DragUpdate, DropTarget, ItemHandle, PointerSample,
};
pub use layout::day_grid::{
    ColumnHalf, DayGridEditor, DayGridSpec, GridConfig, GridUpdate, MinuteSpan, GRID_MINUTES,
};
pub use layout::span_lanes::{pack_week_row, plan_spans, PackedSpan, SpanEntry, WEEK_COLUMNS};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::block::{
    format_wire_time, parse_free_form_time, parse_wire_time, BlockId, BlockValidationError,
    ScheduleBlock,
};
pub use model::item::{Item, ItemId, ItemKind, ItemValidationError, PartitionRef};
pub use model::placement::{Placement, PlacementParseError, WindowKind};
pub use plan::quick_add::{parse_quick_add, QuickAddError, QuickAddParse};
pub use plan::selector::{placement_options, PlacementOption, PlacementOptions};
pub use plan::windows::{planning_windows, PlanningWindows};
pub use repo::block_repo::{BlockRepository, SqliteBlockRepository};
pub use repo::item_repo::{ItemRepository, RepoError, RepoResult, SqliteItemRepository};
pub use service::item_service::{ItemService, ItemServiceError};
pub use service::ordering_service::{DropPosition, OrderingError, OrderingService};
pub use service::schedule_service::{ScheduleService, ScheduleServiceError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
