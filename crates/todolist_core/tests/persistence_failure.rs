//! Storage failures are simulated with triggers that abort the statement.

use todolist_core::{ListService, RecordStore, SqliteRecordStore, StoreError};

fn install_failing_trigger(store: &SqliteRecordStore, name: &str, timing: &str) {
    store
        .connection()
        .execute_batch(&format!(
            "CREATE TRIGGER {name} {timing}
             BEGIN
                 SELECT RAISE(ABORT, 'simulated storage failure');
             END;"
        ))
        .unwrap();
}

fn drop_trigger(store: &SqliteRecordStore, name: &str) {
    store
        .connection()
        .execute_batch(&format!("DROP TRIGGER {name};"))
        .unwrap();
}

#[test]
fn failed_insert_leaves_store_unchanged() {
    let mut store = SqliteRecordStore::open_in_memory().unwrap();
    store.insert_item("Before").unwrap();
    install_failing_trigger(&store, "fail_insert", "BEFORE INSERT ON items");

    let err = store.insert_item("After").unwrap_err();
    assert!(matches!(err, StoreError::Persistence(_)));
    assert!(store.connection().is_autocommit());

    let names: Vec<_> = store
        .list_items()
        .unwrap()
        .into_iter()
        .map(|item| item.name)
        .collect();
    assert_eq!(names, vec!["Before"]);

    drop_trigger(&store, "fail_insert");
    store.insert_item("After").unwrap();
    assert_eq!(store.list_items().unwrap().len(), 2);
}

#[test]
fn failed_update_keeps_last_committed_name() {
    let mut store = SqliteRecordStore::open_in_memory().unwrap();
    let item = store.insert_item("Original").unwrap();
    install_failing_trigger(&store, "fail_rename", "BEFORE UPDATE OF name ON items");

    let err = store.update_item(item.id, "Changed").unwrap_err();
    assert!(matches!(err, StoreError::Persistence(_)));
    assert_eq!(store.get_item(item.id).unwrap().unwrap().name, "Original");
}

#[test]
fn failed_delete_keeps_item() {
    let mut store = SqliteRecordStore::open_in_memory().unwrap();
    let item = store.insert_item("Sticky").unwrap();
    install_failing_trigger(&store, "fail_delete", "BEFORE DELETE ON items");

    let err = store.delete_item(item.id).unwrap_err();
    assert!(matches!(err, StoreError::Persistence(_)));
    assert!(store.get_item(item.id).unwrap().is_some());
}

#[test]
fn failed_link_leaves_both_views_unlinked() {
    let mut store = SqliteRecordStore::open_in_memory().unwrap();
    let category = store.insert_category("ABC Category").unwrap();
    let item = store.insert_item("Homework").unwrap();
    install_failing_trigger(
        &store,
        "fail_link",
        "BEFORE UPDATE OF category_uuid ON items",
    );

    let err = store
        .link_item_to_category(item.id, category.id)
        .unwrap_err();
    assert!(matches!(err, StoreError::Persistence(_)));

    assert_eq!(store.get_item(item.id).unwrap().unwrap().category, None);
    assert!(store
        .get_category(category.id)
        .unwrap()
        .unwrap()
        .items
        .is_empty());
}

#[test]
fn service_surfaces_persistence_failure() {
    let store = SqliteRecordStore::open_in_memory().unwrap();
    install_failing_trigger(&store, "fail_insert", "BEFORE INSERT ON items");
    let mut service = ListService::new(store);

    let err = service.add_item("Lost").unwrap_err();
    assert!(matches!(err, StoreError::Persistence(_)));
    assert!(service.refresh().unwrap().is_empty());
}
