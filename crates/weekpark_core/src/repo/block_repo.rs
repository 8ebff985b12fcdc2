//! Day-schedule block repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist `{title, starts_at, ends_at}` blocks keyed by calendar
//!   day.
//! - Keep wire time formatting (`HH:MM:00`) inside the repository
//!   boundary.
//!
//! # Invariants
//! - Write paths must call `ScheduleBlock::validate()` before SQL
//!   mutations.
//! - Day listings are deterministic: `starts_at ASC, uuid ASC`.

use crate::db::migrations::latest_version;
use crate::model::block::{
    format_wire_time, parse_wire_time, BlockId, BlockValidationError, ScheduleBlock,
};
use crate::repo::item_repo::{table_exists, table_has_column, RepoError, RepoResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const BLOCK_SELECT_SQL: &str = "SELECT
    uuid,
    day,
    title,
    starts_at,
    ends_at
FROM schedule_blocks";

/// Repository interface for day-schedule blocks.
pub trait BlockRepository {
    /// Inserts one block and returns the stored row.
    fn create_block(&self, block: &ScheduleBlock) -> RepoResult<ScheduleBlock>;
    /// Loads one block by stable id.
    fn get_block(&self, id: BlockId) -> RepoResult<Option<ScheduleBlock>>;
    /// Lists one day's blocks ordered by `starts_at ASC, uuid ASC`.
    fn list_day_blocks(&self, day: NaiveDate) -> RepoResult<Vec<ScheduleBlock>>;
    /// Rewrites one block's end time.
    fn set_block_end(&self, id: BlockId, ends_at: chrono::NaiveTime) -> RepoResult<()>;
    /// Replaces one block's full row.
    fn update_block(&self, block: &ScheduleBlock) -> RepoResult<()>;
    /// Hard-deletes one block.
    fn delete_block(&self, id: BlockId) -> RepoResult<()>;
}

/// SQLite-backed block repository.
pub struct SqliteBlockRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBlockRepository<'conn> {
    /// Creates a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_block_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl BlockRepository for SqliteBlockRepository<'_> {
    fn create_block(&self, block: &ScheduleBlock) -> RepoResult<ScheduleBlock> {
        block
            .validate()
            .map_err(block_validation_to_repo_error)?;

        self.conn.execute(
            "INSERT INTO schedule_blocks (
                uuid,
                day,
                title,
                starts_at,
                ends_at
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                block.uuid.to_string(),
                block.day.to_string(),
                block.title.as_str(),
                format_wire_time(block.starts_at),
                format_wire_time(block.ends_at),
            ],
        )?;

        self.get_block(block.uuid)?
            .ok_or(RepoError::NotFound(block.uuid))
    }

    fn get_block(&self, id: BlockId) -> RepoResult<Option<ScheduleBlock>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{BLOCK_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_block_row(row)?));
        }
        Ok(None)
    }

    fn list_day_blocks(&self, day: NaiveDate) -> RepoResult<Vec<ScheduleBlock>> {
        let mut stmt = self.conn.prepare(&format!(
            "{BLOCK_SELECT_SQL}
             WHERE day = ?1
             ORDER BY starts_at ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([day.to_string()])?;

        let mut blocks = Vec::new();
        while let Some(row) = rows.next()? {
            blocks.push(parse_block_row(row)?);
        }
        Ok(blocks)
    }

    fn set_block_end(&self, id: BlockId, ends_at: chrono::NaiveTime) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE schedule_blocks
             SET ends_at = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![id.to_string(), format_wire_time(ends_at)],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn update_block(&self, block: &ScheduleBlock) -> RepoResult<()> {
        block
            .validate()
            .map_err(block_validation_to_repo_error)?;

        let changed = self.conn.execute(
            "UPDATE schedule_blocks
             SET day = ?1,
                 title = ?2,
                 starts_at = ?3,
                 ends_at = ?4,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?5;",
            params![
                block.day.to_string(),
                block.title.as_str(),
                format_wire_time(block.starts_at),
                format_wire_time(block.ends_at),
                block.uuid.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(block.uuid));
        }
        Ok(())
    }

    fn delete_block(&self, id: BlockId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM schedule_blocks WHERE uuid = ?1;",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

fn block_validation_to_repo_error(err: BlockValidationError) -> RepoError {
    RepoError::InvalidData(err.to_string())
}

fn parse_block_row(row: &Row<'_>) -> RepoResult<ScheduleBlock> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid uuid value `{uuid_text}` in schedule_blocks.uuid"
        ))
    })?;

    let day_text: String = row.get("day")?;
    let day = day_text.parse::<NaiveDate>().map_err(|_| {
        RepoError::InvalidData(format!("invalid date `{day_text}` in schedule_blocks.day"))
    })?;

    let starts_text: String = row.get("starts_at")?;
    let ends_text: String = row.get("ends_at")?;
    let starts_at = parse_wire_time(&starts_text).map_err(|err| {
        RepoError::InvalidData(format!("schedule_blocks.starts_at for `{uuid_text}`: {err}"))
    })?;
    let ends_at = parse_wire_time(&ends_text).map_err(|err| {
        RepoError::InvalidData(format!("schedule_blocks.ends_at for `{uuid_text}`: {err}"))
    })?;

    let block = ScheduleBlock {
        uuid,
        day,
        title: row.get("title")?,
        starts_at,
        ends_at,
    };
    block
        .validate()
        .map_err(block_validation_to_repo_error)?;
    Ok(block)
}

fn ensure_block_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "schedule_blocks")? {
        return Err(RepoError::MissingRequiredTable("schedule_blocks"));
    }

    for column in ["uuid", "day", "title", "starts_at", "ends_at"] {
        if !table_has_column(conn, "schedule_blocks", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "schedule_blocks",
                column,
            });
        }
    }

    Ok(())
}
