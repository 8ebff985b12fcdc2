//! Item repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide placement-aware reads and field-level writes over the
//!   canonical `items` storage.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths must call `Item::validate()` before SQL mutations.
//! - Inserts receive `order_key` = partition max + 1; content items
//!   landing on a day also receive `day_sort_key` = day max + 1.
//! - Partition listings are deterministic: `order_key ASC, uuid ASC`.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::item::{Item, ItemId, ItemKind, ItemValidationError, PartitionRef};
use crate::model::placement::Placement;
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const ITEM_SELECT_SQL: &str = "SELECT
    uuid,
    kind,
    title,
    placement,
    order_key,
    day_sort_key,
    completed,
    url,
    end_day
FROM items";

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for item persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ItemValidationError),
    Db(DbError),
    NotFound(ItemId),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "item not found: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "item repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "item repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "item repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted item data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ItemValidationError> for RepoError {
    fn from(value: ItemValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for item persistence.
///
/// The ordering service is generic over this trait so write-failure
/// recovery can be exercised without a real backend.
pub trait ItemRepository {
    /// Inserts one item; the stored `order_key` (and `day_sort_key`
    /// for day-placed content) is assigned by the store and returned
    /// on the loaded row.
    fn create_item(&self, item: &Item) -> RepoResult<Item>;
    /// Loads one item by stable id.
    fn get_item(&self, id: ItemId) -> RepoResult<Option<Item>>;
    /// Lists one partition ordered by `order_key ASC, uuid ASC`.
    fn list_partition(&self, partition: &PartitionRef) -> RepoResult<Vec<Item>>;
    /// Lists day-placed items of one kind within an inclusive day
    /// range, ordered by day then order key.
    fn list_day_range(
        &self,
        kind: ItemKind,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepoResult<Vec<Item>>;
    /// Lists the mixed content list for one day ordered by
    /// `day_sort_key ASC, uuid ASC`.
    fn list_day_content(&self, day: NaiveDate) -> RepoResult<Vec<Item>>;
    /// Rewrites one item's order key.
    fn set_order_key(&self, id: ItemId, order_key: i64) -> RepoResult<()>;
    /// Rewrites one item's day-scoped mixed-list sort key.
    fn set_day_sort_key(&self, id: ItemId, day_sort_key: i64) -> RepoResult<()>;
    /// Rewrites one item's placement and destination keys in one write.
    fn set_placement(
        &self,
        id: ItemId,
        placement: &Placement,
        order_key: i64,
        day_sort_key: Option<i64>,
    ) -> RepoResult<()>;
    /// Rewrites one item's completion flag.
    fn set_completed(&self, id: ItemId, completed: bool) -> RepoResult<()>;
    /// Replaces one item's full row.
    fn update_item(&self, item: &Item) -> RepoResult<()>;
    /// Hard-deletes one item.
    fn delete_item(&self, id: ItemId) -> RepoResult<()>;
    /// Highest order key currently used in one partition.
    fn partition_max_order(&self, partition: &PartitionRef) -> RepoResult<Option<i64>>;
    /// Highest day sort key currently used in one day's content list.
    fn day_max_sort(&self, day: NaiveDate) -> RepoResult<Option<i64>>;
}

/// SQLite-backed item repository.
pub struct SqliteItemRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteItemRepository<'conn> {
    /// Creates a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_item_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ItemRepository for SqliteItemRepository<'_> {
    fn create_item(&self, item: &Item) -> RepoResult<Item> {
        item.validate()?;

        let order_key = self
            .partition_max_order(&item.partition())?
            .map_or(0, |max| max + 1);
        let day_sort_key = match (item.kind.is_content(), item.placement.day()) {
            (true, Some(day)) => Some(self.day_max_sort(day)?.map_or(0, |max| max + 1)),
            _ => None,
        };

        self.conn.execute(
            "INSERT INTO items (
                uuid,
                kind,
                title,
                placement,
                order_key,
                day_sort_key,
                completed,
                url,
                end_day
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                item.uuid.to_string(),
                item_kind_to_db(item.kind),
                item.title.as_str(),
                item.placement.encode(),
                order_key,
                day_sort_key,
                bool_to_int(item.completed),
                item.url.as_deref(),
                item.end_day.map(|day| day.to_string()),
            ],
        )?;

        self.get_item(item.uuid)?
            .ok_or(RepoError::NotFound(item.uuid))
    }

    fn get_item(&self, id: ItemId) -> RepoResult<Option<Item>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ITEM_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_item_row(row)?));
        }
        Ok(None)
    }

    fn list_partition(&self, partition: &PartitionRef) -> RepoResult<Vec<Item>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ITEM_SELECT_SQL}
             WHERE kind = ?1
               AND placement = ?2
             ORDER BY order_key ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query(params![
            item_kind_to_db(partition.kind),
            partition.placement.encode(),
        ])?;
        collect_items(&mut rows)
    }

    fn list_day_range(
        &self,
        kind: ItemKind,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepoResult<Vec<Item>> {
        // Canonical day placements are `D|YYYY-MM-DD`, so lexicographic
        // range scans are chronological.
        let mut stmt = self.conn.prepare(&format!(
            "{ITEM_SELECT_SQL}
             WHERE kind = ?1
               AND placement >= ?2
               AND placement <= ?3
             ORDER BY placement ASC, order_key ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query(params![
            item_kind_to_db(kind),
            Placement::on_day(start).encode(),
            Placement::on_day(end).encode(),
        ])?;
        collect_items(&mut rows)
    }

    fn list_day_content(&self, day: NaiveDate) -> RepoResult<Vec<Item>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ITEM_SELECT_SQL}
             WHERE kind IN ('content_item', 'content_session')
               AND placement = ?1
             ORDER BY day_sort_key ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([Placement::on_day(day).encode()])?;
        collect_items(&mut rows)
    }

    fn set_order_key(&self, id: ItemId, order_key: i64) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE items
             SET order_key = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![id.to_string(), order_key],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn set_day_sort_key(&self, id: ItemId, day_sort_key: i64) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE items
             SET day_sort_key = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![id.to_string(), day_sort_key],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn set_placement(
        &self,
        id: ItemId,
        placement: &Placement,
        order_key: i64,
        day_sort_key: Option<i64>,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE items
             SET placement = ?2,
                 order_key = ?3,
                 day_sort_key = ?4,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![id.to_string(), placement.encode(), order_key, day_sort_key],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn set_completed(&self, id: ItemId, completed: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE items
             SET completed = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![id.to_string(), bool_to_int(completed)],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn update_item(&self, item: &Item) -> RepoResult<()> {
        item.validate()?;

        let changed = self.conn.execute(
            "UPDATE items
             SET kind = ?1,
                 title = ?2,
                 placement = ?3,
                 order_key = ?4,
                 day_sort_key = ?5,
                 completed = ?6,
                 url = ?7,
                 end_day = ?8,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?9;",
            params![
                item_kind_to_db(item.kind),
                item.title.as_str(),
                item.placement.encode(),
                item.order_key,
                item.day_sort_key,
                bool_to_int(item.completed),
                item.url.as_deref(),
                item.end_day.map(|day| day.to_string()),
                item.uuid.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(item.uuid));
        }
        Ok(())
    }

    fn delete_item(&self, id: ItemId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM items WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn partition_max_order(&self, partition: &PartitionRef) -> RepoResult<Option<i64>> {
        let max = self.conn.query_row(
            "SELECT MAX(order_key)
             FROM items
             WHERE kind = ?1
               AND placement = ?2;",
            params![
                item_kind_to_db(partition.kind),
                partition.placement.encode(),
            ],
            |row| row.get::<_, Option<i64>>(0),
        )?;
        Ok(max)
    }

    fn day_max_sort(&self, day: NaiveDate) -> RepoResult<Option<i64>> {
        let max = self.conn.query_row(
            "SELECT MAX(day_sort_key)
             FROM items
             WHERE kind IN ('content_item', 'content_session')
               AND placement = ?1;",
            [Placement::on_day(day).encode()],
            |row| row.get::<_, Option<i64>>(0),
        )?;
        Ok(max)
    }
}

fn collect_items(rows: &mut rusqlite::Rows<'_>) -> RepoResult<Vec<Item>> {
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(parse_item_row(row)?);
    }
    Ok(items)
}

fn parse_item_row(row: &Row<'_>) -> RepoResult<Item> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in items.uuid"))
    })?;

    let kind_text: String = row.get("kind")?;
    let kind = parse_item_kind(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid item kind `{kind_text}` in items.kind"))
    })?;

    let placement_text: String = row.get("placement")?;
    let placement = Placement::decode(&placement_text).map_err(|err| {
        RepoError::InvalidData(format!("items.placement for `{uuid_text}`: {err}"))
    })?;

    let completed = match row.get::<_, i64>("completed")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid completed value `{other}` in items.completed"
            )));
        }
    };

    let end_day = row
        .get::<_, Option<String>>("end_day")?
        .map(|value| {
            value.parse::<NaiveDate>().map_err(|_| {
                RepoError::InvalidData(format!("invalid date `{value}` in items.end_day"))
            })
        })
        .transpose()?;

    let item = Item {
        uuid,
        kind,
        title: row.get("title")?,
        placement,
        order_key: row.get("order_key")?,
        day_sort_key: row.get("day_sort_key")?,
        completed,
        url: row.get("url")?,
        end_day,
    };
    item.validate()?;
    Ok(item)
}

fn item_kind_to_db(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Task => "task",
        ItemKind::Plan => "plan",
        ItemKind::Intention => "intention",
        ItemKind::ContentItem => "content_item",
        ItemKind::ContentSession => "content_session",
    }
}

fn parse_item_kind(value: &str) -> Option<ItemKind> {
    match value {
        "task" => Some(ItemKind::Task),
        "plan" => Some(ItemKind::Plan),
        "intention" => Some(ItemKind::Intention),
        "content_item" => Some(ItemKind::ContentItem),
        "content_session" => Some(ItemKind::ContentSession),
        _ => None,
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn ensure_item_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "items")? {
        return Err(RepoError::MissingRequiredTable("items"));
    }

    for column in [
        "uuid",
        "kind",
        "title",
        "placement",
        "order_key",
        "day_sort_key",
        "completed",
        "url",
        "end_day",
    ] {
        if !table_has_column(conn, "items", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "items",
                column,
            });
        }
    }

    Ok(())
}

pub(crate) fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

pub(crate) fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
