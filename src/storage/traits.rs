//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{Category, ListingVariant, NewCategory, ProductRecord};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Category not found: {0}")]
    CategoryNotFound(i64),

    #[error("Unknown parent category {parent_id} for '{name}'")]
    UnknownParent { name: String, parent_id: i64 },

    #[error("Corrupt row in {table}: {message}")]
    CorruptRow { table: &'static str, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// The harvester owns its backend and is generic over this trait, so tests
/// can substitute their own sink.
pub trait Storage {
    // ===== Categories =====

    /// Persists a category and returns the id assigned to it
    ///
    /// Fails with `UnknownParent` when `parent_id` does not reference a
    /// category that was persisted before.
    fn insert_category(&mut self, category: &NewCategory) -> StorageResult<i64>;

    /// Gets a category by ID
    fn get_category(&self, id: i64) -> StorageResult<Category>;

    /// Gets all categories in insertion order
    fn list_categories(&self) -> StorageResult<Vec<Category>>;

    /// Gets the categories no other category references as its parent
    fn leaf_categories(&self) -> StorageResult<Vec<Category>>;

    /// Gets the direct children of a category
    fn child_categories(&self, parent_id: i64) -> StorageResult<Vec<Category>>;

    /// Counts all categories
    fn count_categories(&self) -> StorageResult<u64>;

    /// Counts categories with no parent
    fn count_root_categories(&self) -> StorageResult<u64>;

    // ===== Products =====

    /// Persists a product record into its variant's table, returning the row id
    fn insert_product(&mut self, product: &ProductRecord) -> StorageResult<i64>;

    /// Gets all product records of a variant in insertion order
    fn list_products(&self, variant: ListingVariant) -> StorageResult<Vec<ProductRecord>>;

    /// Counts product records of a variant
    fn count_products(&self, variant: ListingVariant) -> StorageResult<u64>;

    /// Deletes every product record of a variant
    fn clear_products(&mut self, variant: ListingVariant) -> StorageResult<()>;
}
