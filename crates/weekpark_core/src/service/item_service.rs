//! Item use-case service.
//!
//! # Responsibility
//! - Provide stable create/read/update entry points for core callers.
//! - Turn quick-add text into stored items.
//!
//! # Invariants
//! - Service APIs never bypass repository validation contracts.
//! - Quick-add defaults to `ItemKind::Task` when no kind tag is given.

use crate::model::item::{Item, ItemId, ItemKind, PartitionRef};
use crate::model::placement::Placement;
use crate::plan::quick_add::{parse_quick_add, QuickAddError};
use crate::repo::item_repo::{ItemRepository, RepoError, RepoResult};
use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from item use-cases.
#[derive(Debug)]
pub enum ItemServiceError {
    /// Quick-add input failure, surfaced next to the input field.
    QuickAdd(QuickAddError),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for ItemServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::QuickAdd(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ItemServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::QuickAdd(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<QuickAddError> for ItemServiceError {
    fn from(value: QuickAddError) -> Self {
        Self::QuickAdd(value)
    }
}

impl From<RepoError> for ItemServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Use-case service wrapper for item CRUD operations.
pub struct ItemService<R: ItemRepository> {
    repo: R,
}

impl<R: ItemRepository> ItemService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates an item from quick-add text against an explicit local
    /// `today`.
    ///
    /// # Contract
    /// - Kind defaults to `Task` when no `#task`/`#plan`/`#intention`
    ///   tag is present.
    /// - A missing placement tag leaves the item unplaced.
    pub fn create_from_quick_add(
        &self,
        text: &str,
        today: NaiveDate,
    ) -> Result<Item, ItemServiceError> {
        let parsed = parse_quick_add(text, today)?;
        let mut item = Item::new(parsed.kind.unwrap_or(ItemKind::Task), parsed.title);
        item.placement = parsed.placement.unwrap_or(Placement::Unplaced);
        Ok(self.repo.create_item(&item)?)
    }

    /// Creates an explicit item through repository persistence.
    pub fn create_item(&self, item: &Item) -> RepoResult<Item> {
        self.repo.create_item(item)
    }

    /// Gets one item by stable ID.
    pub fn get_item(&self, id: ItemId) -> RepoResult<Option<Item>> {
        self.repo.get_item(id)
    }

    /// Lists one ordering partition.
    pub fn list_partition(&self, partition: &PartitionRef) -> RepoResult<Vec<Item>> {
        self.repo.list_partition(partition)
    }

    /// Lists day-placed items of one kind within an inclusive range.
    pub fn list_day_range(
        &self,
        kind: ItemKind,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepoResult<Vec<Item>> {
        self.repo.list_day_range(kind, start, end)
    }

    /// Lists one day's mixed content list.
    pub fn list_day_content(&self, day: NaiveDate) -> RepoResult<Vec<Item>> {
        self.repo.list_day_content(day)
    }

    /// Rewrites one item's completion flag.
    pub fn set_completed(&self, id: ItemId, completed: bool) -> RepoResult<()> {
        self.repo.set_completed(id, completed)
    }

    /// Replaces one item's full row.
    pub fn update_item(&self, item: &Item) -> RepoResult<()> {
        self.repo.update_item(item)
    }

    /// Hard-deletes one item.
    pub fn delete_item(&self, id: ItemId) -> RepoResult<()> {
        self.repo.delete_item(id)
    }
}
