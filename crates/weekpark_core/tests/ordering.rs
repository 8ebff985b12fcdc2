use chrono::NaiveDate;
use std::cell::Cell;
use uuid::Uuid;
use weekpark_core::db::open_db_in_memory;
use weekpark_core::{
    DropPosition, Item, ItemId, ItemKind, ItemRepository, OrderingError, OrderingService,
    PartitionRef, Placement, RepoError, RepoResult, SqliteItemRepository, WindowKind,
};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn window_placement() -> Placement {
    Placement::in_window(WindowKind::Workweek, day(2024, 1, 8))
}

/// Repository wrapper counting order-key and day-sort-key writes and
/// optionally failing the Nth one, for exercising the reconcile path.
struct InstrumentedRepo<'conn> {
    inner: SqliteItemRepository<'conn>,
    order_writes: Cell<usize>,
    fail_on_write: Option<usize>,
}

impl<'conn> InstrumentedRepo<'conn> {
    fn new(conn: &'conn rusqlite::Connection, fail_on_write: Option<usize>) -> Self {
        Self {
            inner: SqliteItemRepository::try_new(conn).unwrap(),
            order_writes: Cell::new(0),
            fail_on_write,
        }
    }

    fn record_write(&self) -> RepoResult<()> {
        let write_index = self.order_writes.get();
        self.order_writes.set(write_index + 1);
        if self.fail_on_write == Some(write_index) {
            return Err(RepoError::InvalidData("injected write failure".to_string()));
        }
        Ok(())
    }
}

impl ItemRepository for InstrumentedRepo<'_> {
    fn create_item(&self, item: &Item) -> RepoResult<Item> {
        self.inner.create_item(item)
    }

    fn get_item(&self, id: ItemId) -> RepoResult<Option<Item>> {
        self.inner.get_item(id)
    }

    fn list_partition(&self, partition: &PartitionRef) -> RepoResult<Vec<Item>> {
        self.inner.list_partition(partition)
    }

    fn list_day_range(
        &self,
        kind: ItemKind,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepoResult<Vec<Item>> {
        self.inner.list_day_range(kind, start, end)
    }

    fn list_day_content(&self, day: NaiveDate) -> RepoResult<Vec<Item>> {
        self.inner.list_day_content(day)
    }

    fn set_order_key(&self, id: ItemId, order_key: i64) -> RepoResult<()> {
        self.record_write()?;
        self.inner.set_order_key(id, order_key)
    }

    fn set_day_sort_key(&self, id: ItemId, day_sort_key: i64) -> RepoResult<()> {
        self.record_write()?;
        self.inner.set_day_sort_key(id, day_sort_key)
    }

    fn set_placement(
        &self,
        id: ItemId,
        placement: &Placement,
        order_key: i64,
        day_sort_key: Option<i64>,
    ) -> RepoResult<()> {
        self.inner.set_placement(id, placement, order_key, day_sort_key)
    }

    fn set_completed(&self, id: ItemId, completed: bool) -> RepoResult<()> {
        self.inner.set_completed(id, completed)
    }

    fn update_item(&self, item: &Item) -> RepoResult<()> {
        self.inner.update_item(item)
    }

    fn delete_item(&self, id: ItemId) -> RepoResult<()> {
        self.inner.delete_item(id)
    }

    fn partition_max_order(&self, partition: &PartitionRef) -> RepoResult<Option<i64>> {
        self.inner.partition_max_order(partition)
    }

    fn day_max_sort(&self, day: NaiveDate) -> RepoResult<Option<i64>> {
        self.inner.day_max_sort(day)
    }
}

fn seed_partition(repo: &impl ItemRepository, titles: &[&str]) -> Vec<Item> {
    titles
        .iter()
        .map(|title| {
            let mut item = Item::new(ItemKind::Task, *title);
            item.placement = window_placement();
            repo.create_item(&item).unwrap()
        })
        .collect()
}

fn partition() -> PartitionRef {
    PartitionRef {
        kind: ItemKind::Task,
        placement: window_placement(),
    }
}

#[test]
fn dragging_last_above_first_rotates_and_renumbers() {
    let conn = open_db_in_memory().unwrap();
    let repo = InstrumentedRepo::new(&conn, None);
    let seeded = seed_partition(&repo, &["A", "B", "C", "D"]);
    let service = OrderingService::new(repo);

    let committed = service
        .reorder(
            &partition(),
            seeded[3].uuid,
            seeded[0].uuid,
            DropPosition::Above,
        )
        .unwrap();

    let titles: Vec<_> = committed.iter().map(|item| item.title.as_str()).collect();
    assert_eq!(titles, vec!["D", "A", "B", "C"]);
    let keys: Vec<_> = committed.iter().map(|item| item.order_key).collect();
    assert_eq!(keys, vec![0, 1, 2, 3]);

    let stored = service.repo().list_partition(&partition()).unwrap();
    assert_eq!(stored, committed);
}

#[test]
fn dropping_below_a_later_target_shifts_the_gap_left() {
    let conn = open_db_in_memory().unwrap();
    let repo = InstrumentedRepo::new(&conn, None);
    let seeded = seed_partition(&repo, &["A", "B", "C", "D"]);
    let service = OrderingService::new(repo);

    let committed = service
        .reorder(
            &partition(),
            seeded[0].uuid,
            seeded[2].uuid,
            DropPosition::Below,
        )
        .unwrap();

    let titles: Vec<_> = committed.iter().map(|item| item.title.as_str()).collect();
    assert_eq!(titles, vec!["B", "C", "A", "D"]);
}

#[test]
fn reorder_to_current_position_issues_no_writes() {
    let conn = open_db_in_memory().unwrap();
    let repo = InstrumentedRepo::new(&conn, None);
    let seeded = seed_partition(&repo, &["A", "B", "C"]);
    let service = OrderingService::new(repo);

    // B dropped below A is exactly where B already sits.
    let committed = service
        .reorder(
            &partition(),
            seeded[1].uuid,
            seeded[0].uuid,
            DropPosition::Below,
        )
        .unwrap();

    let keys: Vec<_> = committed.iter().map(|item| item.order_key).collect();
    assert_eq!(keys, vec![0, 1, 2]);
    assert_eq!(service.repo().order_writes.get(), 0);
}

#[test]
fn stale_ids_are_silent_noops() {
    let conn = open_db_in_memory().unwrap();
    let repo = InstrumentedRepo::new(&conn, None);
    let seeded = seed_partition(&repo, &["A", "B"]);
    let service = OrderingService::new(repo);

    let ghost = Uuid::new_v4();
    let after_stale_dragged = service
        .reorder(&partition(), ghost, seeded[0].uuid, DropPosition::Above)
        .unwrap();
    let after_stale_target = service
        .reorder(&partition(), seeded[1].uuid, ghost, DropPosition::Above)
        .unwrap();

    let titles: Vec<_> = after_stale_dragged
        .iter()
        .map(|item| item.title.as_str())
        .collect();
    assert_eq!(titles, vec!["A", "B"]);
    assert_eq!(after_stale_target, after_stale_dragged);
    assert_eq!(service.repo().order_writes.get(), 0);
}

#[test]
fn mid_batch_failure_reconciles_to_store_order() {
    let conn = open_db_in_memory().unwrap();
    // Writes are sequential; fail the third (index 2).
    let repo = InstrumentedRepo::new(&conn, Some(2));
    let seeded = seed_partition(&repo, &["A", "B", "C", "D"]);
    let service = OrderingService::new(repo);

    let err = service
        .reorder(
            &partition(),
            seeded[3].uuid,
            seeded[0].uuid,
            DropPosition::Above,
        )
        .unwrap_err();

    let OrderingError::WriteFailed { reconciled, .. } = err else {
        panic!("expected WriteFailed");
    };

    // The reconciled view is exactly what the store now says, partial
    // writes included.
    let stored = service.repo().list_partition(&partition()).unwrap();
    assert_eq!(reconciled, stored);

    // The first two sequential writes (D->0, A->1) landed before the
    // failure; the rest kept their old keys.
    let by_title = |title: &str| {
        stored
            .iter()
            .find(|item| item.title == title)
            .unwrap()
            .order_key
    };
    assert_eq!(by_title("D"), 0);
    assert_eq!(by_title("A"), 1);
    assert_eq!(by_title("B"), 1);
    assert_eq!(by_title("C"), 2);
}

#[test]
fn dropping_an_item_onto_itself_is_a_noop() {
    let conn = open_db_in_memory().unwrap();
    let repo = InstrumentedRepo::new(&conn, None);
    let seeded = seed_partition(&repo, &["A", "B", "C"]);
    let service = OrderingService::new(repo);

    let committed = service
        .reorder(
            &partition(),
            seeded[1].uuid,
            seeded[1].uuid,
            DropPosition::Below,
        )
        .unwrap();

    let titles: Vec<_> = committed.iter().map(|item| item.title.as_str()).collect();
    assert_eq!(titles, vec!["A", "B", "C"]);
    assert_eq!(service.repo().order_writes.get(), 0);
}

#[test]
fn day_content_reorder_interleaves_kinds_and_renumbers() {
    let conn = open_db_in_memory().unwrap();
    let repo = InstrumentedRepo::new(&conn, None);
    let service = OrderingService::new(repo);
    let wednesday = day(2024, 1, 10);
    let placement = Placement::on_day(wednesday);

    let mut article = Item::new(ItemKind::ContentItem, "article");
    article.placement = placement;
    let article = service.repo().create_item(&article).unwrap();
    let mut session = Item::new(ItemKind::ContentSession, "reading");
    session.placement = placement;
    service.repo().create_item(&session).unwrap();
    let mut video = Item::new(ItemKind::ContentItem, "video");
    video.placement = placement;
    let video = service.repo().create_item(&video).unwrap();

    let committed = service
        .reorder_day_content(wednesday, video.uuid, article.uuid, DropPosition::Above)
        .unwrap();

    let titles: Vec<_> = committed.iter().map(|item| item.title.as_str()).collect();
    assert_eq!(titles, vec!["video", "article", "reading"]);
    let keys: Vec<_> = committed.iter().map(|item| item.day_sort_key).collect();
    assert_eq!(keys, vec![Some(0), Some(1), Some(2)]);

    let stored = service.repo().list_day_content(wednesday).unwrap();
    assert_eq!(stored, committed);
}

#[test]
fn day_content_reorder_with_stale_id_is_a_noop() {
    let conn = open_db_in_memory().unwrap();
    let repo = InstrumentedRepo::new(&conn, None);
    let service = OrderingService::new(repo);
    let wednesday = day(2024, 1, 10);

    let mut article = Item::new(ItemKind::ContentItem, "article");
    article.placement = Placement::on_day(wednesday);
    let article = service.repo().create_item(&article).unwrap();

    let unchanged = service
        .reorder_day_content(wednesday, Uuid::new_v4(), article.uuid, DropPosition::Above)
        .unwrap();
    assert_eq!(unchanged, vec![article]);
    assert_eq!(service.repo().order_writes.get(), 0);
}

#[test]
fn day_content_write_failure_reconciles_to_store_order() {
    let conn = open_db_in_memory().unwrap();
    // Fail the second sequential day-sort write.
    let repo = InstrumentedRepo::new(&conn, Some(1));
    let service = OrderingService::new(repo);
    let wednesday = day(2024, 1, 10);
    let placement = Placement::on_day(wednesday);

    let mut article = Item::new(ItemKind::ContentItem, "article");
    article.placement = placement;
    let article = service.repo().create_item(&article).unwrap();
    let mut session = Item::new(ItemKind::ContentSession, "reading");
    session.placement = placement;
    let session = service.repo().create_item(&session).unwrap();

    let err = service
        .reorder_day_content(wednesday, session.uuid, article.uuid, DropPosition::Above)
        .unwrap_err();

    let OrderingError::WriteFailed { reconciled, .. } = err else {
        panic!("expected WriteFailed");
    };
    let stored = service.repo().list_day_content(wednesday).unwrap();
    assert_eq!(reconciled, stored);
}

#[test]
fn move_to_placement_appends_at_destination_end() {
    let conn = open_db_in_memory().unwrap();
    let repo = InstrumentedRepo::new(&conn, None);
    let seeded = seed_partition(&repo, &["A", "B"]);
    let service = OrderingService::new(repo);

    let destination = Placement::on_day(day(2024, 1, 10));
    let mut resident = Item::new(ItemKind::Task, "resident");
    resident.placement = destination;
    service.repo().create_item(&resident).unwrap();

    let moved = service
        .move_to_placement(seeded[0].uuid, destination)
        .unwrap();

    assert_eq!(moved.placement, destination);
    assert_eq!(moved.order_key, 1);

    // The source partition keeps its remaining member untouched.
    let source = service.repo().list_partition(&partition()).unwrap();
    assert_eq!(source.len(), 1);
    assert_eq!(source[0].title, "B");
    assert_eq!(source[0].order_key, 1);
}

#[test]
fn moving_content_onto_a_day_lands_after_the_day_maximum() {
    let conn = open_db_in_memory().unwrap();
    let repo = InstrumentedRepo::new(&conn, None);
    let service = OrderingService::new(repo);
    let destination = Placement::on_day(day(2024, 1, 10));

    let mut article = Item::new(ItemKind::ContentItem, "article");
    article.placement = destination;
    service.repo().create_item(&article).unwrap();

    let backlog = service
        .repo()
        .create_item(&Item::new(ItemKind::ContentSession, "evening read"))
        .unwrap();
    let moved = service
        .move_to_placement(backlog.uuid, destination)
        .unwrap();

    assert_eq!(moved.day_sort_key, Some(1));
}

#[test]
fn move_to_current_placement_is_a_noop() {
    let conn = open_db_in_memory().unwrap();
    let repo = InstrumentedRepo::new(&conn, None);
    let seeded = seed_partition(&repo, &["A"]);
    let service = OrderingService::new(repo);

    let unchanged = service
        .move_to_placement(seeded[0].uuid, window_placement())
        .unwrap();
    assert_eq!(unchanged, seeded[0]);
}

#[test]
fn move_of_unknown_id_reports_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = InstrumentedRepo::new(&conn, None);
    let service = OrderingService::new(repo);

    let err = service
        .move_to_placement(Uuid::new_v4(), Placement::Unplaced)
        .unwrap_err();
    assert!(matches!(
        err,
        OrderingError::Repo(RepoError::NotFound(_))
    ));
}
