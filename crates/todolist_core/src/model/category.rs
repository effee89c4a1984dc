//! Category record and its derived item set.
//!
//! # Invariants
//! - `items` is read back from `items.category_uuid`; it is never written
//!   on its own, so it always agrees with each item's `category` field.

use crate::model::item::ItemId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a category.
pub type CategoryId = Uuid;

/// Grouping record for to-do items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    /// Unix epoch milliseconds, assigned by storage on insert.
    pub created_at: i64,
    /// Items referencing this category, ordered like the item list.
    pub items: Vec<ItemId>,
}

impl Category {
    /// Returns whether `item_id` is in the derived item set.
    pub fn contains(&self, item_id: ItemId) -> bool {
        self.items.contains(&item_id)
    }
}
