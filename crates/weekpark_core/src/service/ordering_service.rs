//! Partition ordering engine.
//!
//! # Responsibility
//! - Rewrite per-partition order keys when an item is dragged above or
//!   below a sibling.
//! - Keep the day-scoped mixed content list ordered the same way via
//!   day sort keys.
//! - Move items across partitions by placement change, appending at
//!   the destination's end.
//!
//! # Invariants
//! - Order keys within one partition are dense and zero-based after
//!   every committed reorder; a reorder rewrites the whole partition,
//!   never a local patch.
//! - Order-key writes are issued per item, sequentially; a mid-batch
//!   failure always ends in a reconciling refetch of the authoritative
//!   order, never a partially trusted optimistic state.
//! - A reorder referencing an id no longer in the partition is a
//!   silent no-op.

use crate::model::item::{Item, ItemId, PartitionRef};
use crate::model::placement::Placement;
use crate::repo::item_repo::{ItemRepository, RepoError};
use chrono::NaiveDate;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Whether a dragged item lands above or below its drop target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropPosition {
    Above,
    Below,
}

/// Errors from ordering operations.
#[derive(Debug)]
pub enum OrderingError {
    /// Persistence-layer failure outside a batch order rewrite.
    Repo(RepoError),
    /// A batch order rewrite failed mid-way. The optimistic order was
    /// discarded; `reconciled` holds the refetched authoritative
    /// partition state.
    WriteFailed {
        source: RepoError,
        reconciled: Vec<Item>,
    },
}

impl Display for OrderingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::WriteFailed { source, .. } => {
                write!(f, "order rewrite failed and was reconciled: {source}")
            }
        }
    }
}

impl Error for OrderingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::WriteFailed { source, .. } => Some(source),
        }
    }
}

impl From<RepoError> for OrderingError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Ordering engine over an item repository.
pub struct OrderingService<R: ItemRepository> {
    repo: R,
}

impl<R: ItemRepository> OrderingService<R> {
    /// Creates the engine from a repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Moves `dragged_id` immediately above or below `target_id`
    /// within one partition and rewrites every order key to its new
    /// index.
    ///
    /// Returns the partition in its committed order. A dragged or
    /// target id that is no longer a member, or a self-drop, leaves
    /// the partition untouched. A drop that reproduces the current
    /// order issues no writes.
    ///
    /// # Errors
    /// [`OrderingError::WriteFailed`] carries the refetched
    /// authoritative order after a mid-batch write failure; nothing is
    /// retried automatically.
    pub fn reorder(
        &self,
        partition: &PartitionRef,
        dragged_id: ItemId,
        target_id: ItemId,
        position: DropPosition,
    ) -> Result<Vec<Item>, OrderingError> {
        let items = self.repo.list_partition(partition)?;

        let Some(mut reordered) = reinsert_relative(&items, dragged_id, target_id, position)
        else {
            return Ok(items);
        };

        // Optimistic order first; the store catches up one row at a time.
        for (index, item) in reordered.iter_mut().enumerate() {
            item.order_key = index as i64;
        }

        for item in &reordered {
            if let Err(source) = self.repo.set_order_key(item.uuid, item.order_key) {
                return Err(self.reconcile(source, self.repo.list_partition(partition)));
            }
        }

        info!(
            "event=reorder module=ordering status=ok partition_size={} dragged={dragged_id}",
            reordered.len()
        );
        Ok(reordered)
    }

    /// Moves `dragged_id` immediately above or below `target_id`
    /// within one day's mixed content list (content items and sessions
    /// interleaved) and rewrites every entry's day sort key to its new
    /// index.
    ///
    /// Same contract as [`Self::reorder`]: stale ids no-op, a drop
    /// reproducing the current order issues no writes, and a mid-batch
    /// write failure reconciles against the store.
    pub fn reorder_day_content(
        &self,
        day: NaiveDate,
        dragged_id: ItemId,
        target_id: ItemId,
        position: DropPosition,
    ) -> Result<Vec<Item>, OrderingError> {
        let items = self.repo.list_day_content(day)?;

        let Some(mut reordered) = reinsert_relative(&items, dragged_id, target_id, position)
        else {
            return Ok(items);
        };

        for (index, item) in reordered.iter_mut().enumerate() {
            item.day_sort_key = Some(index as i64);
        }

        for item in &reordered {
            if let Err(source) = self
                .repo
                .set_day_sort_key(item.uuid, item.day_sort_key.unwrap_or(0))
            {
                return Err(self.reconcile(source, self.repo.list_day_content(day)));
            }
        }

        info!(
            "event=reorder module=ordering status=ok scope=day_content day={day} list_size={} dragged={dragged_id}",
            reordered.len()
        );
        Ok(reordered)
    }

    /// Moves one item to a different placement.
    ///
    /// Only the placement (and destination keys) change: the item is
    /// appended after the destination partition's current maximum, and
    /// day-placed content also lands after the day's current mixed
    /// list maximum. Sibling order keys in the source partition are
    /// left as they are.
    pub fn move_to_placement(
        &self,
        id: ItemId,
        destination: Placement,
    ) -> Result<Item, OrderingError> {
        let item = self
            .repo
            .get_item(id)?
            .ok_or(OrderingError::Repo(RepoError::NotFound(id)))?;

        if item.placement == destination {
            return Ok(item);
        }

        let destination_partition = PartitionRef {
            kind: item.kind,
            placement: destination,
        };
        let order_key = self
            .repo
            .partition_max_order(&destination_partition)?
            .map_or(0, |max| max + 1);
        let day_sort_key = match (item.kind.is_content(), destination.day()) {
            (true, Some(day)) => Some(self.repo.day_max_sort(day)?.map_or(0, |max| max + 1)),
            _ => None,
        };

        self.repo
            .set_placement(id, &destination, order_key, day_sort_key)?;
        info!(
            "event=placement_move module=ordering status=ok id={id} destination={}",
            destination.encode()
        );

        self.repo
            .get_item(id)?
            .ok_or(OrderingError::Repo(RepoError::NotFound(id)))
    }

    /// Borrow of the underlying repository for read paths.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    fn reconcile(
        &self,
        source: RepoError,
        refetched: Result<Vec<Item>, RepoError>,
    ) -> OrderingError {
        error!(
            "event=reorder module=ordering status=error error_code=order_write_failed error={source}"
        );
        match refetched {
            Ok(reconciled) => OrderingError::WriteFailed { source, reconciled },
            Err(refetch_err) => {
                error!(
                    "event=reorder module=ordering status=error error_code=reconcile_failed error={refetch_err}"
                );
                OrderingError::Repo(source)
            }
        }
    }
}

/// Removes the dragged entry and reinserts it immediately above or
/// below the target. Returns `None` when the drop is a no-op: a stale
/// dragged or target id, a self-drop, or a position the list already
/// has.
fn reinsert_relative(
    items: &[Item],
    dragged_id: ItemId,
    target_id: ItemId,
    position: DropPosition,
) -> Option<Vec<Item>> {
    if dragged_id == target_id {
        return None;
    }
    let Some(dragged_index) = items.iter().position(|item| item.uuid == dragged_id) else {
        warn!("event=reorder module=ordering status=noop reason=stale_dragged id={dragged_id}");
        return None;
    };
    if !items.iter().any(|item| item.uuid == target_id) {
        warn!("event=reorder module=ordering status=noop reason=stale_target id={target_id}");
        return None;
    }

    let mut reordered = items.to_vec();
    let dragged = reordered.remove(dragged_index);
    let target_index = reordered
        .iter()
        .position(|item| item.uuid == target_id)
        .unwrap_or(reordered.len());
    let insert_index = match position {
        DropPosition::Above => target_index,
        DropPosition::Below => target_index + 1,
    };
    reordered.insert(insert_index, dragged);

    let same_order = reordered
        .iter()
        .zip(items.iter())
        .all(|(new, old)| new.uuid == old.uuid);
    if same_order {
        return None;
    }
    Some(reordered)
}
