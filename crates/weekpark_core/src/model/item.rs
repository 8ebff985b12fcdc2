//! Item domain model.
//!
//! # Responsibility
//! - Define the canonical record shared by task/plan/intention/content
//!   projections.
//! - Enforce construction and wire-level invariants.
//!
//! # Invariants
//! - `uuid` is stable and never reused for another item.
//! - `title` is never blank after trimming.
//! - `order_key` totally orders the item's partition (one placement,
//!   one kind) with no duplicates; the ordering service owns rewrites.
//! - `day_sort_key` is meaningful only for content kinds that also sit
//!   in a day-scoped mixed list.

use crate::model::placement::{Placement, PlacementParseError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for every scheduled item.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type ItemId = Uuid;

/// Unified category for all item projections.
///
/// Each kind is its own logical collection; ordering never crosses
/// kinds except through the day-scoped mixed content list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// Actionable task.
    Task,
    /// Time-bound plan, possibly spanning several days.
    Plan,
    /// Short intention kept near the current day.
    Intention,
    /// Backlog entry in the media/content queue.
    ContentItem,
    /// A concrete sitting scheduled against a content item.
    ContentSession,
}

impl ItemKind {
    /// Content kinds share the day-scoped mixed list and its
    /// `day_sort_key` ordering.
    pub fn is_content(self) -> bool {
        matches!(self, Self::ContentItem | Self::ContentSession)
    }
}

/// Identity of one ordering partition: the set of items sharing one
/// placement inside one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartitionRef {
    pub kind: ItemKind,
    pub placement: Placement,
}

/// Canonical domain record for all five item kinds.
///
/// One storage shape supports every projection; kind-specific fields
/// stay optional so reordering and placement logic can operate on the
/// common subset only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "ItemWire", try_from = "ItemWire")]
pub struct Item {
    /// Stable global ID used for ordering, drag identity and auditing.
    pub uuid: ItemId,
    pub kind: ItemKind,
    pub title: String,
    /// Where in time this item currently lives.
    pub placement: Placement,
    /// Dense zero-based position within the item's partition.
    pub order_key: i64,
    /// Secondary position within one day's mixed content list.
    pub day_sort_key: Option<i64>,
    pub completed: bool,
    /// Link payload for content backlog entries.
    pub url: Option<String>,
    /// Last day of a multi-day plan; the span runs from the placement
    /// day through this day inclusive.
    pub end_day: Option<NaiveDate>,
}

impl Item {
    /// Creates a new unplaced item with a generated stable ID.
    pub fn new(kind: ItemKind, title: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            kind,
            title: title.into(),
            placement: Placement::Unplaced,
            order_key: 0,
            day_sort_key: None,
            completed: false,
            url: None,
            end_day: None,
        }
    }

    /// Creates a new item with a caller-provided stable ID.
    ///
    /// Used by import paths where identity already exists externally.
    pub fn with_id(
        uuid: ItemId,
        kind: ItemKind,
        title: impl Into<String>,
    ) -> Result<Self, ItemValidationError> {
        if uuid.is_nil() {
            return Err(ItemValidationError::NilUuid);
        }
        Ok(Self {
            uuid,
            ..Self::new(kind, title)
        })
    }

    /// Identity of the ordering partition this item belongs to.
    pub fn partition(&self) -> PartitionRef {
        PartitionRef {
            kind: self.kind,
            placement: self.placement,
        }
    }

    /// Checks the item's construction invariants.
    ///
    /// Repository write paths call this before any SQL mutation.
    pub fn validate(&self) -> Result<(), ItemValidationError> {
        if self.uuid.is_nil() {
            return Err(ItemValidationError::NilUuid);
        }
        if self.title.trim().is_empty() {
            return Err(ItemValidationError::BlankTitle);
        }
        if let (Some(end_day), Some(day)) = (self.end_day, self.placement.day()) {
            if end_day < day {
                return Err(ItemValidationError::InvalidSpan { day, end_day });
            }
        }
        Ok(())
    }
}

/// Construction/wire invariant violations for [`Item`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemValidationError {
    NilUuid,
    BlankTitle,
    /// `end_day` must not precede the placement day.
    InvalidSpan { day: NaiveDate, end_day: NaiveDate },
    InvalidPlacement(PlacementParseError),
}

impl Display for ItemValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilUuid => write!(f, "item uuid must not be nil"),
            Self::BlankTitle => write!(f, "item title must not be blank"),
            Self::InvalidSpan { day, end_day } => {
                write!(f, "end_day ({end_day}) must be >= placement day ({day})")
            }
            Self::InvalidPlacement(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ItemValidationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidPlacement(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PlacementParseError> for ItemValidationError {
    fn from(value: PlacementParseError) -> Self {
        Self::InvalidPlacement(value)
    }
}

/// Wire shape: placements travel as canonical strings to match the
/// storage and selector contracts.
#[derive(Debug, Serialize, Deserialize)]
struct ItemWire {
    uuid: ItemId,
    #[serde(rename = "type")]
    kind: ItemKind,
    title: String,
    placement: String,
    order_key: i64,
    day_sort_key: Option<i64>,
    completed: bool,
    url: Option<String>,
    end_day: Option<NaiveDate>,
}

impl From<Item> for ItemWire {
    fn from(value: Item) -> Self {
        Self {
            uuid: value.uuid,
            kind: value.kind,
            title: value.title,
            placement: value.placement.encode(),
            order_key: value.order_key,
            day_sort_key: value.day_sort_key,
            completed: value.completed,
            url: value.url,
            end_day: value.end_day,
        }
    }
}

impl TryFrom<ItemWire> for Item {
    type Error = ItemValidationError;

    fn try_from(value: ItemWire) -> Result<Self, Self::Error> {
        let item = Item {
            uuid: value.uuid,
            kind: value.kind,
            title: value.title,
            placement: Placement::decode(&value.placement)?,
            order_key: value.order_key,
            day_sort_key: value.day_sort_key,
            completed: value.completed,
            url: value.url,
            end_day: value.end_day,
        };
        item.validate()?;
        Ok(item)
    }
}
