//! Storage module for persisting harvested data
//!
//! This module handles all database operations for the harvester, including:
//! - SQLite database initialization and schema management
//! - Category tree persistence and the leaf-category query
//! - Product records for the standard and express listings

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::HarvestError;
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(HarvestError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, HarvestError> {
    Ok(SqliteStorage::new(path)?)
}

/// A category that has not been persisted yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    pub url: String,
    /// `None` for top-menu categories
    pub parent_id: Option<i64>,
}

impl NewCategory {
    pub fn root(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            parent_id: None,
        }
    }

    pub fn child(name: impl Into<String>, url: impl Into<String>, parent_id: i64) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            parent_id: Some(parent_id),
        }
    }
}

/// Represents a category row in the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub parent_id: Option<i64>,
    pub created_at: String,
}

/// Which listing of a category produced a product record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingVariant {
    /// The default listing
    Standard,
    /// The fast-delivery listing
    Express,
}

impl ListingVariant {
    pub const ALL: [ListingVariant; 2] = [ListingVariant::Standard, ListingVariant::Express];

    /// Value stored in the `variant_flag` column
    pub fn to_db_flag(self) -> i64 {
        match self {
            Self::Standard => 0,
            Self::Express => 1,
        }
    }

    pub fn from_db_flag(flag: i64) -> Option<Self> {
        match flag {
            0 => Some(Self::Standard),
            1 => Some(Self::Express),
            _ => None,
        }
    }

    /// Table the variant's product records are stored in
    pub fn table_name(self) -> &'static str {
        match self {
            Self::Standard => "items",
            Self::Express => "items_express",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Express => "express",
        }
    }
}

impl fmt::Display for ListingVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One product tile harvested from a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRecord {
    pub category_id: i64,
    /// Category slug reported by the site, may differ from the crawled name
    pub category_label: String,
    pub sku: String,
    pub title: String,
    pub url: String,
    pub image_url: String,
    /// Only set when the tile shows a crossed-out regular price
    pub regular_price: Option<i64>,
    pub final_price: i64,
    pub discount_label: Option<String>,
    pub review_count: i64,
    pub variant: ListingVariant,
}
