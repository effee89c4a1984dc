//! Record store contract and SQLite implementation.
//!
//! # Responsibility
//! - Own durable storage of `Item` and `Category` records.
//! - Keep the item -> category reference and the category -> items view
//!   consistent by deriving the latter from the former.
//!
//! # Invariants
//! - Every mutation runs in one immediate transaction and commits before
//!   returning; any error drops the transaction and leaves the last committed
//!   state visible.
//! - Names are validated before any SQL runs.
//! - Item listings are ordered by `name ASC, uuid ASC` (binary collation).

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::{configure_connection, open_db, open_db_in_memory, DbError};
use crate::model::category::{Category, CategoryId};
use crate::model::item::{Item, ItemId};
use crate::model::validation::{validate_name, ValidationError};
use log::{error, info, warn};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

const ITEM_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    created_at,
    category_uuid
FROM items";

const CATEGORY_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    created_at
FROM categories";

const REQUIRED_COLUMNS: &[(&str, &[&str])] = &[
    ("items", &["uuid", "name", "created_at", "category_uuid"]),
    ("categories", &["uuid", "name", "created_at"]),
];

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by record store operations.
#[derive(Debug)]
pub enum StoreError {
    /// Input rejected before reaching storage.
    Validation(ValidationError),
    /// No item with this id.
    ItemNotFound(ItemId),
    /// No category with this id.
    CategoryNotFound(CategoryId),
    /// Underlying storage failed; the transaction was rolled back.
    Persistence(DbError),
    /// Connection schema is not at the version this binary expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted row cannot be converted to a valid record.
    InvalidData(String),
}

impl StoreError {
    /// Returns whether this error targets a nonexistent record.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ItemNotFound(_) | Self::CategoryNotFound(_))
    }

    /// Stable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_failed",
            Self::ItemNotFound(_) => "item_not_found",
            Self::CategoryNotFound(_) => "category_not_found",
            Self::Persistence(_) => "persistence_failed",
            Self::UninitializedConnection { .. } => "uninitialized_connection",
            Self::MissingRequiredTable(_) => "missing_table",
            Self::MissingRequiredColumn { .. } => "missing_column",
            Self::InvalidData(_) => "invalid_data",
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::ItemNotFound(id) => write!(f, "item not found: {id}"),
            Self::CategoryNotFound(id) => write!(f, "category not found: {id}"),
            Self::Persistence(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "record store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "record store requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "record store requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted record: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Persistence(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Persistence(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Persistence(DbError::Sqlite(value))
    }
}

/// Filter options for item listings.
///
/// The default query returns every item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemListQuery {
    /// Case-sensitive substring match on `name`. Empty text matches all.
    pub name_contains: Option<String>,
    /// Restrict to items filed under this category.
    pub category: Option<CategoryId>,
}

/// Storage contract for to-do items and categories.
///
/// Mutating methods take `&mut self`: one store handle serves one writer at a
/// time, and callers that share a handle must serialize access themselves.
pub trait RecordStore {
    /// Lists every item sorted by name.
    fn list_items(&self) -> StoreResult<Vec<Item>> {
        self.list_items_filtered(&ItemListQuery::default())
    }
    fn list_items_filtered(&self, query: &ItemListQuery) -> StoreResult<Vec<Item>>;
    fn get_item(&self, id: ItemId) -> StoreResult<Option<Item>>;
    /// Creates an item with a fresh id and the current timestamp.
    fn insert_item(&mut self, name: &str) -> StoreResult<Item>;
    /// Renames an item. Empty names are rejected before the lookup.
    fn update_item(&mut self, id: ItemId, new_name: &str) -> StoreResult<Item>;
    /// Removes an item. Deleting an absent id fails with `ItemNotFound`.
    fn delete_item(&mut self, id: ItemId) -> StoreResult<()>;
    fn insert_category(&mut self, name: &str) -> StoreResult<Category>;
    fn get_category(&self, id: CategoryId) -> StoreResult<Option<Category>>;
    fn list_categories(&self) -> StoreResult<Vec<Category>>;
    /// Files an item under a category and returns the refreshed category.
    fn link_item_to_category(
        &mut self,
        item_id: ItemId,
        category_id: CategoryId,
    ) -> StoreResult<Category>;
    /// Flushes committed state to durable storage.
    fn save(&mut self) -> StoreResult<()>;
}

/// SQLite-backed record store owning its connection.
#[derive(Debug)]
pub struct SqliteRecordStore {
    conn: Connection,
}

impl SqliteRecordStore {
    /// Opens (or creates) a database file and prepares the schema.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = open_db(path)?;
        Ok(Self { conn })
    }

    /// Opens a throwaway in-memory store.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = open_db_in_memory()?;
        Ok(Self { conn })
    }

    /// Wraps an already-migrated connection.
    ///
    /// Applies the same `foreign_keys` and busy-timeout settings as `open`.
    ///
    /// # Errors
    /// - `UninitializedConnection` when `user_version` is not the latest.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` when the schema
    ///   does not have the expected shape.
    pub fn try_from_connection(conn: Connection) -> StoreResult<Self> {
        ensure_store_connection_ready(&conn)?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    /// Borrows the underlying connection for diagnostics.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Saves and closes the store, surfacing close failures.
    pub fn close(mut self) -> StoreResult<()> {
        self.save()?;
        self.conn.close().map_err(|(_, err)| {
            error!(
                "event=store_close module=store status=error error_code=close_failed error={}",
                err
            );
            StoreError::from(err)
        })?;
        info!("event=store_close module=store status=ok");
        Ok(())
    }

    fn insert_item_tx(&mut self, name: &str) -> StoreResult<Item> {
        validate_name(name)?;
        let id = Uuid::new_v4();

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO items (uuid, name, created_at, category_uuid)
             VALUES (?1, ?2, ?3, NULL);",
            params![id.to_string(), name, now_epoch_ms()],
        )?;
        let item = load_required_item(&tx, id)?;
        tx.commit()?;
        Ok(item)
    }

    fn update_item_tx(&mut self, id: ItemId, new_name: &str) -> StoreResult<Item> {
        validate_name(new_name)?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE items SET name = ?2 WHERE uuid = ?1;",
            params![id.to_string(), new_name],
        )?;
        if changed == 0 {
            return Err(StoreError::ItemNotFound(id));
        }
        let item = load_required_item(&tx, id)?;
        tx.commit()?;
        Ok(item)
    }

    fn delete_item_tx(&mut self, id: ItemId) -> StoreResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute("DELETE FROM items WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(StoreError::ItemNotFound(id));
        }
        tx.commit()?;
        Ok(())
    }

    fn insert_category_tx(&mut self, name: &str) -> StoreResult<Category> {
        validate_name(name)?;
        let id = Uuid::new_v4();

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO categories (uuid, name, created_at) VALUES (?1, ?2, ?3);",
            params![id.to_string(), name, now_epoch_ms()],
        )?;
        let category = load_required_category(&tx, id)?;
        tx.commit()?;
        Ok(category)
    }

    fn link_item_to_category_tx(
        &mut self,
        item_id: ItemId,
        category_id: CategoryId,
    ) -> StoreResult<Category> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !row_exists(&tx, "items", item_id)? {
            return Err(StoreError::ItemNotFound(item_id));
        }
        if !row_exists(&tx, "categories", category_id)? {
            return Err(StoreError::CategoryNotFound(category_id));
        }

        // The category's item set is derived from this column, so this single
        // write updates both sides of the relationship.
        tx.execute(
            "UPDATE items SET category_uuid = ?2 WHERE uuid = ?1;",
            params![item_id.to_string(), category_id.to_string()],
        )?;

        let category = load_required_category(&tx, category_id)?;
        if !category.contains(item_id) {
            return Err(StoreError::InvalidData(format!(
                "item {item_id} missing from category {category_id} after link"
            )));
        }
        tx.commit()?;
        Ok(category)
    }
}

impl RecordStore for SqliteRecordStore {
    fn list_items_filtered(&self, query: &ItemListQuery) -> StoreResult<Vec<Item>> {
        let mut sql = format!("{ITEM_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(text) = query.name_contains.as_deref().filter(|text| !text.is_empty()) {
            sql.push_str(" AND instr(name, ?) > 0");
            bind_values.push(Value::Text(text.to_string()));
        }

        if let Some(category_id) = query.category {
            sql.push_str(" AND category_uuid = ?");
            bind_values.push(Value::Text(category_id.to_string()));
        }

        sql.push_str(" ORDER BY name ASC, uuid ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_item_row(row)?);
        }
        Ok(items)
    }

    fn get_item(&self, id: ItemId) -> StoreResult<Option<Item>> {
        load_item(&self.conn, id)
    }

    fn insert_item(&mut self, name: &str) -> StoreResult<Item> {
        let started_at = Instant::now();
        let result = self.insert_item_tx(name);
        log_outcome("item_insert", started_at, &result);
        result
    }

    fn update_item(&mut self, id: ItemId, new_name: &str) -> StoreResult<Item> {
        let started_at = Instant::now();
        let result = self.update_item_tx(id, new_name);
        log_outcome("item_update", started_at, &result);
        result
    }

    fn delete_item(&mut self, id: ItemId) -> StoreResult<()> {
        let started_at = Instant::now();
        let result = self.delete_item_tx(id);
        log_outcome("item_delete", started_at, &result);
        result
    }

    fn insert_category(&mut self, name: &str) -> StoreResult<Category> {
        let started_at = Instant::now();
        let result = self.insert_category_tx(name);
        log_outcome("category_insert", started_at, &result);
        result
    }

    fn get_category(&self, id: CategoryId) -> StoreResult<Option<Category>> {
        load_category(&self.conn, id)
    }

    fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CATEGORY_SELECT_SQL} ORDER BY name ASC, uuid ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut categories = Vec::new();
        while let Some(row) = rows.next()? {
            categories.push(parse_category_row(&self.conn, row)?);
        }
        Ok(categories)
    }

    fn link_item_to_category(
        &mut self,
        item_id: ItemId,
        category_id: CategoryId,
    ) -> StoreResult<Category> {
        let started_at = Instant::now();
        let result = self.link_item_to_category_tx(item_id, category_id);
        log_outcome("item_link", started_at, &result);
        result
    }

    fn save(&mut self) -> StoreResult<()> {
        let started_at = Instant::now();
        // Non-WAL databases report `busy = 0` and nothing to copy.
        let result = self
            .conn
            .query_row("PRAGMA wal_checkpoint(TRUNCATE);", [], |row| {
                row.get::<_, i64>(0)
            })
            .map_err(StoreError::from)
            .and_then(|busy| {
                if busy == 0 {
                    Ok(())
                } else {
                    Err(StoreError::Persistence(DbError::CheckpointBusy))
                }
            });
        log_outcome("store_save", started_at, &result);
        result
    }
}

fn log_outcome<T>(event: &str, started_at: Instant, result: &StoreResult<T>) {
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(_) => info!("event={event} module=store status=ok duration_ms={duration_ms}"),
        Err(err @ StoreError::Validation(_)) => warn!(
            "event={event} module=store status=rejected duration_ms={duration_ms} error_code={}",
            err.code()
        ),
        Err(err) => error!(
            "event={event} module=store status=error duration_ms={duration_ms} error_code={} error={}",
            err.code(),
            err
        ),
    }
}

fn now_epoch_ms() -> i64 {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
}

fn load_item(conn: &Connection, id: ItemId) -> StoreResult<Option<Item>> {
    let mut stmt = conn.prepare(&format!("{ITEM_SELECT_SQL} WHERE uuid = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_item_row(row)?));
    }
    Ok(None)
}

fn load_required_item(conn: &Connection, id: ItemId) -> StoreResult<Item> {
    load_item(conn, id)?.ok_or(StoreError::ItemNotFound(id))
}

fn load_category(conn: &Connection, id: CategoryId) -> StoreResult<Option<Category>> {
    let mut stmt = conn.prepare(&format!("{CATEGORY_SELECT_SQL} WHERE uuid = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_category_row(conn, row)?));
    }
    Ok(None)
}

fn load_required_category(conn: &Connection, id: CategoryId) -> StoreResult<Category> {
    load_category(conn, id)?.ok_or(StoreError::CategoryNotFound(id))
}

fn load_category_item_ids(conn: &Connection, category_uuid: &str) -> StoreResult<Vec<ItemId>> {
    let mut stmt = conn.prepare(
        "SELECT uuid
         FROM items
         WHERE category_uuid = ?1
         ORDER BY name ASC, uuid ASC;",
    )?;
    let mut rows = stmt.query([category_uuid])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        ids.push(parse_uuid(&value, "items.uuid")?);
    }
    Ok(ids)
}

fn parse_item_row(row: &Row<'_>) -> StoreResult<Item> {
    let uuid_text: String = row.get("uuid")?;
    let category = match row.get::<_, Option<String>>("category_uuid")? {
        Some(value) => Some(parse_uuid(&value, "items.category_uuid")?),
        None => None,
    };

    let name: String = row.get("name")?;
    if name.is_empty() {
        return Err(StoreError::InvalidData(format!(
            "empty name for item `{uuid_text}`"
        )));
    }

    Ok(Item {
        id: parse_uuid(&uuid_text, "items.uuid")?,
        name,
        created_at: row.get("created_at")?,
        category,
    })
}

fn parse_category_row(conn: &Connection, row: &Row<'_>) -> StoreResult<Category> {
    let uuid_text: String = row.get("uuid")?;
    let items = load_category_item_ids(conn, &uuid_text)?;
    Ok(Category {
        id: parse_uuid(&uuid_text, "categories.uuid")?,
        name: row.get("name")?,
        created_at: row.get("created_at")?,
        items,
    })
}

fn parse_uuid(value: &str, column: &str) -> StoreResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| StoreError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

fn row_exists(conn: &Connection, table: &'static str, id: Uuid) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE uuid = ?1);"),
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn ensure_store_connection_ready(conn: &Connection) -> StoreResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &(table, columns) in REQUIRED_COLUMNS {
        if !table_exists(conn, table)? {
            return Err(StoreError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(StoreError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> StoreResult<bool> {
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

fn table_has_column(conn: &Connection, table: &str, column: &str) -> StoreResult<bool> {
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
