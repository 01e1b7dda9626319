//! Crawler module for fetching and extracting catalog pages
//!
//! This module contains the core harvesting logic, including:
//! - HTTP fetching
//! - Category and product extraction from HTML
//! - Fixed-delay request pacing
//! - Overall harvest orchestration

mod categories;
mod fetcher;
mod harvester;
mod pacer;
mod products;
mod rules;

pub use categories::{
    child_categories, fetch_child_categories, normalize_name, root_categories, CategoryLink,
};
pub use fetcher::{build_http_client, fetch_document, fetch_page, user_agent_string, FetchError};
pub use harvester::{listing_targets, HarvestSummary, Harvester, ListingTarget, RunOptions};
pub use pacer::RequestPacer;
pub use products::{
    extract_products, parse_price, parse_review_count, ExtractError, ScrapedProduct,
    NO_REVIEWS_TEXT,
};
pub use rules::ExtractRules;

use crate::config::Config;
use crate::storage::open_storage;
use crate::HarvestError;
use std::path::Path;

/// Runs a complete harvest against the configured SQLite database
///
/// This is the main entry point for the binary. It will:
/// 1. Open (or create) the database
/// 2. Build the HTTP client and selectors
/// 3. Walk the category tree and harvest the leaf listings
///
/// # Returns
///
/// * `Ok(HarvestSummary)` - Harvest finished; per-page failures are counted
/// * `Err(HarvestError)` - Startup failed or storage became unusable
pub async fn harvest(config: &Config, options: &RunOptions) -> Result<HarvestSummary, HarvestError> {
    let storage = open_storage(Path::new(&config.output.database_path))?;
    let mut harvester = Harvester::new(config, storage)?;
    harvester.run(options).await
}
