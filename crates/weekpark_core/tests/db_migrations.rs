use weekpark_core::db::migrations::{apply_migrations, latest_version};
use weekpark_core::db::{open_db, open_db_in_memory, DbError};

#[test]
fn open_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    let version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, latest_version());
}

#[test]
fn migration_1_creates_items_table() {
    let conn = open_db_in_memory().unwrap();

    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'items'
            );",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1);

    let mut stmt = conn.prepare("PRAGMA table_info(items);").unwrap();
    let mut rows = stmt.query([]).unwrap();
    let mut columns = Vec::new();
    while let Some(row) = rows.next().unwrap() {
        let column_name: String = row.get(1).unwrap();
        columns.push(column_name);
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
        assert!(columns.contains(&column.to_string()), "missing {column}");
    }
}

#[test]
fn migration_2_creates_schedule_blocks_table() {
    let conn = open_db_in_memory().unwrap();

    let mut stmt = conn.prepare("PRAGMA table_info(schedule_blocks);").unwrap();
    let mut rows = stmt.query([]).unwrap();
    let mut columns = Vec::new();
    while let Some(row) = rows.next().unwrap() {
        let column_name: String = row.get(1).unwrap();
        columns.push(column_name);
    }
    for column in ["uuid", "day", "title", "starts_at", "ends_at"] {
        assert!(columns.contains(&column.to_string()), "missing {column}");
    }
}

#[test]
fn apply_migrations_is_idempotent() {
    let mut conn = open_db_in_memory().unwrap();
    apply_migrations(&mut conn).unwrap();

    let version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, latest_version());
}

#[test]
fn future_schema_version_is_rejected() {
    let mut conn = rusqlite::Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version() + 1))
        .unwrap();

    let err = apply_migrations(&mut conn).unwrap_err();
    assert!(matches!(
        err,
        DbError::UnsupportedSchemaVersion { db_version, .. } if db_version == latest_version() + 1
    ));
}

#[test]
fn file_backed_db_reopens_with_schema_intact() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("weekpark.db");

    {
        let conn = open_db(&path).unwrap();
        conn.execute_batch("INSERT INTO items (uuid, kind, title) VALUES ('00000000-0000-4000-8000-000000000001', 'task', 'persisted');")
            .unwrap();
    }

    let conn = open_db(&path).unwrap();
    let title: String = conn
        .query_row("SELECT title FROM items;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(title, "persisted");
}
