//! Statistics generation from the harvest database
//!
//! This module provides functionality for extracting and displaying
//! statistics from the storage layer.

use crate::crawler::HarvestSummary;
use crate::storage::{ListingVariant, Storage};
use crate::HarvestError;
use std::collections::HashMap;

/// Catalog statistics summary
#[derive(Debug, Clone)]
pub struct CatalogStatistics {
    /// Total number of categories stored
    pub total_categories: u64,

    /// Categories with no parent
    pub root_categories: u64,

    /// Categories no other category references as parent
    pub leaf_categories: u64,

    /// Count of products by listing variant
    pub products_by_variant: HashMap<ListingVariant, u64>,
}

impl CatalogStatistics {
    pub fn total_products(&self) -> u64 {
        self.products_by_variant.values().sum()
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(CatalogStatistics)` - Successfully loaded statistics
/// * `Err(HarvestError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> Result<CatalogStatistics, HarvestError> {
    let total_categories = storage.count_categories()?;
    let root_categories = storage.count_root_categories()?;
    let leaf_categories = storage.leaf_categories()?.len() as u64;

    let mut products_by_variant = HashMap::new();
    for variant in ListingVariant::ALL {
        products_by_variant.insert(variant, storage.count_products(variant)?);
    }

    Ok(CatalogStatistics {
        total_categories,
        root_categories,
        leaf_categories,
        products_by_variant,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CatalogStatistics) {
    println!("=== Catalog Statistics ===\n");

    println!("Categories:");
    println!("  Total: {}", stats.total_categories);
    println!("  Top-level: {}", stats.root_categories);
    println!("  Leaves: {}", stats.leaf_categories);
    println!();

    println!("Products:");
    for variant in ListingVariant::ALL {
        let count = stats.products_by_variant.get(&variant).unwrap_or(&0);
        println!("  {} ({}): {}", variant, variant.table_name(), count);
    }
    println!("  Total: {}", stats.total_products());
}

/// Prints the counters of a finished run
pub fn print_summary(summary: &HarvestSummary) {
    println!("=== Harvest Summary ===\n");
    println!("Categories saved: {}", summary.categories_saved);
    println!("Category pages failed: {}", summary.category_pages_failed);
    if summary.depth_limited > 0 {
        println!("Categories at depth limit: {}", summary.depth_limited);
    }
    println!("Leaf categories: {}", summary.leaf_categories);
    println!(
        "Listing pages: {} ({} failed, {} empty)",
        summary.listing_pages, summary.listing_pages_failed, summary.empty_listing_pages
    );
    println!("Products saved: {}", summary.products_saved);
    println!("Products rejected: {}", summary.products_rejected);
    println!("Persistence failures: {}", summary.persistence_failures);
}
