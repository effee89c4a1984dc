use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use todolist_core::{ItemListQuery, RecordStore, SqliteRecordStore, StoreError, ValidationError};
use uuid::Uuid;

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64
}

fn names(store: &SqliteRecordStore) -> Vec<String> {
    store
        .list_items()
        .unwrap()
        .into_iter()
        .map(|item| item.name)
        .collect()
}

#[test]
fn empty_store_lists_nothing() {
    let store = SqliteRecordStore::open_in_memory().unwrap();
    assert!(store.list_items().unwrap().is_empty());
}

#[test]
fn insert_assigns_id_timestamp_and_no_category() {
    let mut store = SqliteRecordStore::open_in_memory().unwrap();

    let item = store.insert_item("Homework").unwrap();
    assert!(!item.id.is_nil());
    assert_eq!(item.name, "Homework");
    assert!(item.created_at > 0);
    assert_eq!(item.category, None);

    let loaded = store.get_item(item.id).unwrap().unwrap();
    assert_eq!(loaded, item);
}

#[test]
fn insert_stamps_created_at_with_current_millis() {
    let mut store = SqliteRecordStore::open_in_memory().unwrap();

    let before = now_ms();
    let item = store.insert_item("Homework").unwrap();
    let after = now_ms();

    assert!(
        (before..=after).contains(&item.created_at),
        "created_at {} outside [{before}, {after}]",
        item.created_at
    );
}

#[test]
fn insert_keeps_name_exactly_as_given() {
    let mut store = SqliteRecordStore::open_in_memory().unwrap();
    let padded = store.insert_item(" Apple").unwrap();
    let spaces = store.insert_item(" ").unwrap();

    assert_eq!(padded.name, " Apple");
    assert_eq!(spaces.name, " ");
    assert_eq!(names(&store), vec![" ", " Apple"]);
}

#[test]
fn list_is_sorted_by_name() {
    let mut store = SqliteRecordStore::open_in_memory().unwrap();
    store.insert_item("Banana").unwrap();
    store.insert_item("Apple").unwrap();
    store.insert_item("Cherry").unwrap();

    assert_eq!(names(&store), vec!["Apple", "Banana", "Cherry"]);
}

#[test]
fn list_ordering_is_case_sensitive_ordinal() {
    let mut store = SqliteRecordStore::open_in_memory().unwrap();
    for name in ["banana", "cherry", "Banana", "Apple"] {
        store.insert_item(name).unwrap();
    }

    assert_eq!(names(&store), vec!["Apple", "Banana", "banana", "cherry"]);
}

#[test]
fn duplicate_names_are_kept_as_separate_items() {
    let mut store = SqliteRecordStore::open_in_memory().unwrap();
    let first = store.insert_item("Laundry").unwrap();
    let second = store.insert_item("Laundry").unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(store.list_items().unwrap().len(), 2);
}

#[test]
fn insert_empty_name_is_rejected_and_store_unchanged() {
    let mut store = SqliteRecordStore::open_in_memory().unwrap();
    store.insert_item("Existing").unwrap();

    let err = store.insert_item("").unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::EmptyName)
    ));

    assert_eq!(store.list_items().unwrap().len(), 1);
}

#[test]
fn update_renames_and_keeps_identity() {
    let mut store = SqliteRecordStore::open_in_memory().unwrap();
    let item = store.insert_item("Homework").unwrap();

    let renamed = store.update_item(item.id, "Reading").unwrap();
    assert_eq!(renamed.id, item.id);
    assert_eq!(renamed.created_at, item.created_at);
    assert_eq!(renamed.name, "Reading");
    assert_eq!(names(&store), vec!["Reading"]);
}

#[test]
fn update_keeps_created_at_across_rename() {
    let mut store = SqliteRecordStore::open_in_memory().unwrap();
    let item = store.insert_item("Homework").unwrap();

    thread::sleep(Duration::from_millis(5));
    let renamed = store.update_item(item.id, " Reading ").unwrap();

    assert_eq!(renamed.name, " Reading ");
    assert_eq!(renamed.created_at, item.created_at);
    assert!(now_ms() > item.created_at);
}

#[test]
fn update_with_empty_name_keeps_original() {
    let mut store = SqliteRecordStore::open_in_memory().unwrap();
    let item = store.insert_item("Homework").unwrap();

    let err = store.update_item(item.id, "").unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
    assert_eq!(store.get_item(item.id).unwrap().unwrap().name, "Homework");
}

#[test]
fn update_missing_item_returns_not_found() {
    let mut store = SqliteRecordStore::open_in_memory().unwrap();
    let missing = Uuid::new_v4();

    let err = store.update_item(missing, "X").unwrap_err();
    assert!(matches!(err, StoreError::ItemNotFound(id) if id == missing));
    assert!(err.is_not_found());
}

#[test]
fn delete_twice_fails_the_second_time() {
    let mut store = SqliteRecordStore::open_in_memory().unwrap();
    let item = store.insert_item("Trash").unwrap();

    store.delete_item(item.id).unwrap();
    assert!(store.get_item(item.id).unwrap().is_none());

    let err = store.delete_item(item.id).unwrap_err();
    assert!(matches!(err, StoreError::ItemNotFound(id) if id == item.id));
}

#[test]
fn delete_removes_only_the_target() {
    let mut store = SqliteRecordStore::open_in_memory().unwrap();
    let a = store.insert_item("A").unwrap();
    store.insert_item("B").unwrap();

    store.delete_item(a.id).unwrap();
    assert_eq!(names(&store), vec!["B"]);
}

#[test]
fn filter_by_substring_is_case_sensitive() {
    let mut store = SqliteRecordStore::open_in_memory().unwrap();
    for name in ["Mercedes service", "buy mercedes polish", "Bike repair"] {
        store.insert_item(name).unwrap();
    }

    let query = ItemListQuery {
        name_contains: Some("Mercedes".to_string()),
        ..ItemListQuery::default()
    };
    let hits = store.list_items_filtered(&query).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "Mercedes service");

    let everything = ItemListQuery {
        name_contains: Some(String::new()),
        ..ItemListQuery::default()
    };
    assert_eq!(store.list_items_filtered(&everything).unwrap().len(), 3);
}

#[test]
fn save_succeeds_on_memory_store() {
    let mut store = SqliteRecordStore::open_in_memory().unwrap();
    store.insert_item("Persist me").unwrap();
    store.save().unwrap();
    assert_eq!(names(&store), vec!["Persist me"]);
}

#[test]
fn file_store_survives_close_and_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("todolist.sqlite3");

    let created = {
        let mut store = SqliteRecordStore::open(&path).unwrap();
        let item = store.insert_item("Durable").unwrap();
        store.close().unwrap();
        item
    };

    let store = SqliteRecordStore::open(&path).unwrap();
    let items = store.list_items().unwrap();
    assert_eq!(items, vec![created]);
}
