use chrono::NaiveDate;
use rusqlite::Connection;
use weekpark_core::db::open_db_in_memory;
use weekpark_core::{
    Item, ItemKind, ItemRepository, Placement, RepoError, SqliteItemRepository, WindowKind,
};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn placed(kind: ItemKind, title: &str, placement: Placement) -> Item {
    let mut item = Item::new(kind, title);
    item.placement = placement;
    item
}

#[test]
fn create_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteItemRepository::try_new(&conn).unwrap();

    let item = placed(ItemKind::Task, "first task", Placement::on_day(day(2024, 1, 10)));
    let stored = repo.create_item(&item).unwrap();

    assert_eq!(stored.uuid, item.uuid);
    assert_eq!(stored.order_key, 0);

    let loaded = repo.get_item(item.uuid).unwrap().unwrap();
    assert_eq!(loaded.kind, ItemKind::Task);
    assert_eq!(loaded.title, "first task");
    assert_eq!(loaded.placement, Placement::on_day(day(2024, 1, 10)));
}

#[test]
fn create_appends_after_partition_maximum() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteItemRepository::try_new(&conn).unwrap();
    let placement = Placement::in_window(WindowKind::Workweek, day(2024, 1, 8));

    let first = repo
        .create_item(&placed(ItemKind::Task, "a", placement))
        .unwrap();
    let second = repo
        .create_item(&placed(ItemKind::Task, "b", placement))
        .unwrap();
    let third = repo
        .create_item(&placed(ItemKind::Task, "c", placement))
        .unwrap();

    assert_eq!(
        (first.order_key, second.order_key, third.order_key),
        (0, 1, 2)
    );

    // Separate kinds are separate partitions.
    let plan = repo
        .create_item(&placed(ItemKind::Plan, "p", placement))
        .unwrap();
    assert_eq!(plan.order_key, 0);
}

#[test]
fn day_placed_content_gets_day_sort_key_across_kinds() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteItemRepository::try_new(&conn).unwrap();
    let placement = Placement::on_day(day(2024, 1, 10));

    let article = repo
        .create_item(&placed(ItemKind::ContentItem, "article", placement))
        .unwrap();
    let session = repo
        .create_item(&placed(ItemKind::ContentSession, "reading", placement))
        .unwrap();
    let task = repo
        .create_item(&placed(ItemKind::Task, "errand", placement))
        .unwrap();

    // The mixed day list interleaves content kinds on one counter.
    assert_eq!(article.day_sort_key, Some(0));
    assert_eq!(session.day_sort_key, Some(1));
    assert_eq!(task.day_sort_key, None);

    let mixed = repo.list_day_content(day(2024, 1, 10)).unwrap();
    let ids: Vec<_> = mixed.iter().map(|item| item.uuid).collect();
    assert_eq!(ids, vec![article.uuid, session.uuid]);
}

#[test]
fn list_partition_orders_by_order_key() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteItemRepository::try_new(&conn).unwrap();
    let placement = Placement::Unplaced;

    let a = repo
        .create_item(&placed(ItemKind::Intention, "a", placement))
        .unwrap();
    let b = repo
        .create_item(&placed(ItemKind::Intention, "b", placement))
        .unwrap();

    repo.set_order_key(a.uuid, 5).unwrap();

    let listed = repo.list_partition(&a.partition()).unwrap();
    let ids: Vec<_> = listed.iter().map(|item| item.uuid).collect();
    assert_eq!(ids, vec![b.uuid, a.uuid]);
}

#[test]
fn list_day_range_scans_day_placements_chronologically() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteItemRepository::try_new(&conn).unwrap();

    let monday = repo
        .create_item(&placed(ItemKind::Task, "mon", Placement::on_day(day(2024, 1, 8))))
        .unwrap();
    let wednesday = repo
        .create_item(&placed(ItemKind::Task, "wed", Placement::on_day(day(2024, 1, 10))))
        .unwrap();
    let _next_month = repo
        .create_item(&placed(ItemKind::Task, "feb", Placement::on_day(day(2024, 2, 1))))
        .unwrap();
    let _parked = repo
        .create_item(&placed(
            ItemKind::Task,
            "parked",
            Placement::in_window(WindowKind::Workweek, day(2024, 1, 8)),
        ))
        .unwrap();

    let week = repo
        .list_day_range(ItemKind::Task, day(2024, 1, 8), day(2024, 1, 14))
        .unwrap();
    let ids: Vec<_> = week.iter().map(|item| item.uuid).collect();
    assert_eq!(ids, vec![monday.uuid, wednesday.uuid]);
}

#[test]
fn set_placement_rewrites_destination_keys() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteItemRepository::try_new(&conn).unwrap();

    let item = repo
        .create_item(&placed(ItemKind::Task, "movable", Placement::Unplaced))
        .unwrap();
    let destination = Placement::on_day(day(2024, 1, 10));
    repo.set_placement(item.uuid, &destination, 7, None).unwrap();

    let loaded = repo.get_item(item.uuid).unwrap().unwrap();
    assert_eq!(loaded.placement, destination);
    assert_eq!(loaded.order_key, 7);
}

#[test]
fn set_completed_flips_only_the_flag() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteItemRepository::try_new(&conn).unwrap();

    let item = repo
        .create_item(&placed(ItemKind::Task, "toggle", Placement::Unplaced))
        .unwrap();
    repo.set_completed(item.uuid, true).unwrap();

    let loaded = repo.get_item(item.uuid).unwrap().unwrap();
    assert!(loaded.completed);
    assert_eq!(loaded.title, "toggle");
}

#[test]
fn update_and_delete_report_missing_rows() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteItemRepository::try_new(&conn).unwrap();

    let ghost = Item::new(ItemKind::Task, "ghost");
    let err = repo.update_item(&ghost).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == ghost.uuid));

    let err = repo.delete_item(ghost.uuid).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == ghost.uuid));
}

#[test]
fn delete_removes_the_row() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteItemRepository::try_new(&conn).unwrap();

    let item = repo
        .create_item(&placed(ItemKind::Task, "gone", Placement::Unplaced))
        .unwrap();
    repo.delete_item(item.uuid).unwrap();
    assert!(repo.get_item(item.uuid).unwrap().is_none());
}

#[test]
fn validation_failure_blocks_create_and_update() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteItemRepository::try_new(&conn).unwrap();

    let mut invalid = Item::new(ItemKind::Plan, "trip");
    invalid.placement = Placement::on_day(day(2024, 3, 14));
    invalid.end_day = Some(day(2024, 3, 12));

    let create_err = repo.create_item(&invalid).unwrap_err();
    assert!(matches!(create_err, RepoError::Validation(_)));

    invalid.end_day = Some(day(2024, 3, 16));
    let stored = repo.create_item(&invalid).unwrap();

    let mut reversed = stored.clone();
    reversed.end_day = Some(day(2024, 3, 12));
    let update_err = repo.update_item(&reversed).unwrap_err();
    assert!(matches!(update_err, RepoError::Validation(_)));
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteItemRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert!(expected_version > 0),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_required_items_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!(
        "PRAGMA user_version = {};",
        weekpark_core::db::migrations::latest_version()
    ))
    .unwrap();

    let result = SqliteItemRepository::try_new(&conn);
    assert!(matches!(result, Err(RepoError::MissingRequiredTable("items"))));
}

#[test]
fn repository_rejects_connection_missing_required_items_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE items (
            uuid TEXT PRIMARY KEY NOT NULL,
            kind TEXT NOT NULL,
            title TEXT NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!(
        "PRAGMA user_version = {};",
        weekpark_core::db::migrations::latest_version()
    ))
    .unwrap();

    let result = SqliteItemRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "items",
            column: "placement"
        })
    ));
}
