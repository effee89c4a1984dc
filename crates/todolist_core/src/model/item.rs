//! To-do item record.
//!
//! # Invariants
//! - `id` and `created_at` never change after insert.
//! - `name` is non-empty and stored exactly as given.
//! - `category`, when set, points at a category that exists in the store.

use crate::model::category::CategoryId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a to-do item.
pub type ItemId = Uuid;

/// One row of the to-do list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    /// Unix epoch milliseconds, assigned by storage on insert.
    pub created_at: i64,
    /// Owning category, if the item has been filed under one.
    pub category: Option<CategoryId>,
}

impl Item {
    /// Returns whether this item is filed under `category_id`.
    pub fn belongs_to(&self, category_id: CategoryId) -> bool {
        self.category == Some(category_id)
    }
}
