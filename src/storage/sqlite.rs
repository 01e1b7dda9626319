//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.
//! Every statement runs in autocommit mode, so a crash loses at most the
//! row being written.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{Category, ListingVariant, NewCategory, ProductRecord};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const CATEGORY_COLUMNS: &str = "id, name, url, parent_id, created_at";

const PRODUCT_COLUMNS: &str = "category_id, category_label, sku, title, regular_price, \
     final_price, discount_label, url, image_url, review_count, variant_flag";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn query_categories(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> StorageResult<Vec<Category>> {
        let mut stmt = self.conn.prepare(sql)?;
        let categories = stmt
            .query_map(params, category_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    fn category_exists(&self, id: i64) -> StorageResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row("SELECT id FROM categories WHERE id = ?1", params![id], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(found.is_some())
    }
}

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        url: row.get(2)?,
        parent_id: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Raw product row; the variant flag is validated after the query
struct ProductRow {
    record: ProductRecord,
    flag: i64,
}

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<ProductRow> {
    let discount_label: String = row.get(6)?;
    Ok(ProductRow {
        record: ProductRecord {
            category_id: row.get(0)?,
            category_label: row.get(1)?,
            sku: row.get(2)?,
            title: row.get(3)?,
            regular_price: row.get(4)?,
            final_price: row.get(5)?,
            discount_label: Some(discount_label).filter(|label| !label.is_empty()),
            url: row.get(7)?,
            image_url: row.get(8)?,
            review_count: row.get(9)?,
            variant: ListingVariant::Standard,
        },
        flag: row.get(10)?,
    })
}

impl Storage for SqliteStorage {
    // ===== Categories =====

    fn insert_category(&mut self, category: &NewCategory) -> StorageResult<i64> {
        if let Some(parent_id) = category.parent_id {
            if !self.category_exists(parent_id)? {
                return Err(StorageError::UnknownParent {
                    name: category.name.clone(),
                    parent_id,
                });
            }
        }

        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO categories (name, url, parent_id, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![category.name, category.url, category.parent_id, now],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn get_category(&self, id: i64) -> StorageResult<Category> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM categories WHERE id = ?1", CATEGORY_COLUMNS),
                params![id],
                category_from_row,
            )
            .optional()?
            .ok_or(StorageError::CategoryNotFound(id))
    }

    fn list_categories(&self) -> StorageResult<Vec<Category>> {
        self.query_categories(
            &format!("SELECT {} FROM categories ORDER BY id", CATEGORY_COLUMNS),
            [],
        )
    }

    fn leaf_categories(&self) -> StorageResult<Vec<Category>> {
        self.query_categories(
            &format!(
                "SELECT {} FROM categories
                 WHERE id NOT IN (SELECT parent_id FROM categories WHERE parent_id IS NOT NULL)
                 ORDER BY id",
                CATEGORY_COLUMNS
            ),
            [],
        )
    }

    fn child_categories(&self, parent_id: i64) -> StorageResult<Vec<Category>> {
        self.query_categories(
            &format!(
                "SELECT {} FROM categories WHERE parent_id = ?1 ORDER BY id",
                CATEGORY_COLUMNS
            ),
            params![parent_id],
        )
    }

    fn count_categories(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_root_categories(&self) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM categories WHERE parent_id IS NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // ===== Products =====

    fn insert_product(&mut self, product: &ProductRecord) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            &format!(
                "INSERT INTO {} ({}, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                product.variant.table_name(),
                PRODUCT_COLUMNS
            ),
            params![
                product.category_id,
                product.category_label,
                product.sku,
                product.title,
                product.regular_price,
                product.final_price,
                product.discount_label.as_deref().unwrap_or(""),
                product.url,
                product.image_url,
                product.review_count,
                product.variant.to_db_flag(),
                now
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn list_products(&self, variant: ListingVariant) -> StorageResult<Vec<ProductRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM {} ORDER BY id",
            PRODUCT_COLUMNS,
            variant.table_name()
        ))?;

        let rows = stmt
            .query_map([], product_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|row| {
                let variant = ListingVariant::from_db_flag(row.flag).ok_or_else(|| {
                    StorageError::CorruptRow {
                        table: variant.table_name(),
                        message: format!("unknown variant_flag {}", row.flag),
                    }
                })?;
                Ok(ProductRecord {
                    variant,
                    ..row.record
                })
            })
            .collect()
    }

    fn count_products(&self, variant: ListingVariant) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", variant.table_name()),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn clear_products(&mut self, variant: ListingVariant) -> StorageResult<()> {
        self.conn
            .execute(&format!("DELETE FROM {}", variant.table_name()), [])?;
        Ok(())
    }
}
