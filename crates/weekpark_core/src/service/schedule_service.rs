//! Day-schedule block use-case service.
//!
//! # Responsibility
//! - Validate and persist time-of-day blocks for one calendar day.
//! - Enforce the single-coverage collision rule on create and resize.
//! - Parse free-form time input (`h:mm am/pm`, 24-hour `H:MM`).
//!
//! # Invariants
//! - Within one day every minute is covered by at most one block.
//! - A resize changes only the end time and persists only on release;
//!   intermediate gesture state never reaches this service.

use crate::model::block::{
    parse_free_form_time, BlockId, BlockValidationError, ScheduleBlock,
};
use crate::repo::block_repo::BlockRepository;
use crate::repo::item_repo::{RepoError, RepoResult};
use chrono::{NaiveDate, NaiveTime};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from schedule block use-cases.
#[derive(Debug)]
pub enum ScheduleServiceError {
    /// Title/time validation failure; surfaced next to the offending
    /// field.
    Validation(BlockValidationError),
    /// The requested range would cover a minute an existing block
    /// already covers.
    Overlap { conflicting: BlockId },
    /// Target block does not exist.
    BlockNotFound(BlockId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for ScheduleServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Overlap { conflicting } => {
                write!(f, "time range overlaps existing block {conflicting}")
            }
            Self::BlockNotFound(id) => write!(f, "schedule block not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ScheduleServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BlockValidationError> for ScheduleServiceError {
    fn from(value: BlockValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ScheduleServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::BlockNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Schedule block service facade.
pub struct ScheduleService<R: BlockRepository> {
    repo: R,
}

impl<R: BlockRepository> ScheduleService<R> {
    /// Creates the service from a repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one block from free-form time input.
    pub fn create_block_from_input(
        &self,
        day: NaiveDate,
        title: impl Into<String>,
        starts_text: &str,
        ends_text: &str,
    ) -> Result<ScheduleBlock, ScheduleServiceError> {
        let starts_at = parse_free_form_time(starts_text)?;
        let ends_at = parse_free_form_time(ends_text)?;
        self.create_block(day, title, starts_at, ends_at)
    }

    /// Creates one block from already-resolved times (the grid create
    /// gesture lands here after its title prompt).
    pub fn create_block(
        &self,
        day: NaiveDate,
        title: impl Into<String>,
        starts_at: NaiveTime,
        ends_at: NaiveTime,
    ) -> Result<ScheduleBlock, ScheduleServiceError> {
        let block = ScheduleBlock::new(day, title, starts_at, ends_at);
        block.validate()?;

        let siblings = self.repo.list_day_blocks(day)?;
        ensure_no_overlap(&siblings, None, starts_at, ends_at)?;

        let stored = self.repo.create_block(&block)?;
        info!(
            "event=block_create module=schedule status=ok day={day} range={}..{}",
            stored.starts_at, stored.ends_at
        );
        Ok(stored)
    }

    /// Persists a completed bottom-edge resize: only the end time
    /// changes.
    pub fn resize_block(
        &self,
        id: BlockId,
        new_end: NaiveTime,
    ) -> Result<ScheduleBlock, ScheduleServiceError> {
        let block = self
            .repo
            .get_block(id)?
            .ok_or(ScheduleServiceError::BlockNotFound(id))?;

        if new_end <= block.starts_at {
            return Err(BlockValidationError::InvalidTimeRange {
                starts_at: crate::model::block::format_wire_time(block.starts_at),
                ends_at: crate::model::block::format_wire_time(new_end),
            }
            .into());
        }

        let siblings = self.repo.list_day_blocks(block.day)?;
        ensure_no_overlap(&siblings, Some(id), block.starts_at, new_end)?;

        self.repo.set_block_end(id, new_end)?;
        info!(
            "event=block_resize module=schedule status=ok id={id} new_end={new_end}"
        );
        self.repo
            .get_block(id)?
            .ok_or(ScheduleServiceError::BlockNotFound(id))
    }

    /// Lists one day's blocks in start order.
    pub fn list_day(&self, day: NaiveDate) -> RepoResult<Vec<ScheduleBlock>> {
        self.repo.list_day_blocks(day)
    }

    /// Deletes one block.
    pub fn delete_block(&self, id: BlockId) -> Result<(), ScheduleServiceError> {
        self.repo.delete_block(id)?;
        Ok(())
    }
}

/// Rejects a candidate range that would double-cover any minute of the
/// day. `skip` exempts the block being resized from the check.
fn ensure_no_overlap(
    siblings: &[ScheduleBlock],
    skip: Option<BlockId>,
    starts_at: NaiveTime,
    ends_at: NaiveTime,
) -> Result<(), ScheduleServiceError> {
    for sibling in siblings {
        if Some(sibling.uuid) == skip {
            continue;
        }
        if sibling.starts_at < ends_at && starts_at < sibling.ends_at {
            return Err(ScheduleServiceError::Overlap {
                conflicting: sibling.uuid,
            });
        }
    }
    Ok(())
}
