//! To-do list use-case service.
//!
//! # Responsibility
//! - Translate presentation intents (add, rename, remove) into store calls.
//! - Return the refreshed, name-sorted item list after every mutation.
//!
//! # Invariants
//! - Every mutating call is read-after-write: the returned list already
//!   reflects the change.
//! - Empty names are a no-op that returns the current list; the store still
//!   rejects them if called directly.
//! - Store errors are returned unchanged, never swallowed.

use crate::model::category::{Category, CategoryId};
use crate::model::item::{Item, ItemId};
use crate::repo::record_store::{ItemListQuery, RecordStore, StoreError, StoreResult};
use log::debug;

const DEMO_CATEGORY_NAME: &str = "ABC Category";
const DEMO_ITEM_NAME: &str = "Homework";

/// Facade over a record store for list-style callers.
pub struct ListService<S: RecordStore> {
    store: S,
}

/// Records created by [`ListService::seed_relationship_demo`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipDemo {
    pub category: Category,
    pub item: Item,
}

impl<S: RecordStore> ListService<S> {
    /// Creates a service that owns the given store handle.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Borrows the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Hands the store back, e.g. to close it at shutdown.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Returns every item sorted by name.
    pub fn refresh(&self) -> StoreResult<Vec<Item>> {
        self.store.list_items()
    }

    /// Adds an item and returns the refreshed list.
    pub fn add_item(&mut self, name: &str) -> StoreResult<Vec<Item>> {
        if name.is_empty() {
            debug!("event=list_add module=service status=skipped reason=empty_name");
            return self.refresh();
        }
        self.store.insert_item(name)?;
        self.refresh()
    }

    /// Renames an item and returns the refreshed list.
    pub fn rename_item(&mut self, id: ItemId, new_name: &str) -> StoreResult<Vec<Item>> {
        if new_name.is_empty() {
            debug!("event=list_rename module=service status=skipped reason=empty_name");
            return self.refresh();
        }
        self.store.update_item(id, new_name)?;
        self.refresh()
    }

    /// Removes an item and returns the refreshed list.
    pub fn remove_item(&mut self, id: ItemId) -> StoreResult<Vec<Item>> {
        self.store.delete_item(id)?;
        self.refresh()
    }

    /// Lists items whose name contains `text` (case-sensitive).
    ///
    /// Empty text behaves like [`ListService::refresh`].
    pub fn search(&self, text: &str) -> StoreResult<Vec<Item>> {
        if text.is_empty() {
            return self.refresh();
        }
        self.store.list_items_filtered(&ItemListQuery {
            name_contains: Some(text.to_string()),
            category: None,
        })
    }

    /// Lists items filed under one category.
    pub fn items_in_category(&self, category_id: CategoryId) -> StoreResult<Vec<Item>> {
        self.store.list_items_filtered(&ItemListQuery {
            name_contains: None,
            category: Some(category_id),
        })
    }

    /// Creates a category.
    pub fn add_category(&mut self, name: &str) -> StoreResult<Category> {
        self.store.insert_category(name)
    }

    /// Lists categories sorted by name, each with its derived item set.
    pub fn categories(&self) -> StoreResult<Vec<Category>> {
        self.store.list_categories()
    }

    /// Files an item under a category and returns the refreshed list.
    pub fn assign_category(
        &mut self,
        item_id: ItemId,
        category_id: CategoryId,
    ) -> StoreResult<Vec<Item>> {
        self.store.link_item_to_category(item_id, category_id)?;
        self.refresh()
    }

    /// Creates the "ABC Category" / "Homework" pair and links them.
    pub fn seed_relationship_demo(&mut self) -> StoreResult<RelationshipDemo> {
        let category = self.store.insert_category(DEMO_CATEGORY_NAME)?;
        let item = self.store.insert_item(DEMO_ITEM_NAME)?;
        let category = self.store.link_item_to_category(item.id, category.id)?;
        let item = self
            .store
            .get_item(item.id)?
            .ok_or(StoreError::ItemNotFound(item.id))?;
        Ok(RelationshipDemo { category, item })
    }
}
