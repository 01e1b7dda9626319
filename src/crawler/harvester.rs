//! Harvest orchestration
//!
//! This module drives a complete harvest run:
//! - Walking the category tree from the site's top menu and persisting every
//!   category before its children
//! - Querying the leaf categories back from storage
//! - Generating the paginated listing URLs of every leaf and variant
//! - Fetching each listing page in turn and persisting its products
//!
//! A failure on one page, tile or insert is logged and counted, and the run
//! moves on to the next one.

use crate::config::{Config, CrawlerConfig};
use crate::crawler::categories::{fetch_child_categories, root_categories, CategoryLink};
use crate::crawler::fetcher::{build_http_client, fetch_document};
use crate::crawler::pacer::RequestPacer;
use crate::crawler::products::extract_products;
use crate::crawler::rules::ExtractRules;
use crate::storage::{Category, ListingVariant, NewCategory, Storage};
use crate::url::{listing_page_url, parse_base_url};
use crate::HarvestError;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Options chosen on the command line for a single run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Reuse the category tree already stored instead of walking the site
    pub skip_tree: bool,
    /// Delete the stored products of the harvested variants first
    pub fresh: bool,
    /// Variants to harvest; empty means the configured ones
    pub variants: Vec<ListingVariant>,
}

/// Counters describing what a run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestSummary {
    pub categories_saved: usize,
    pub category_pages_failed: usize,
    /// Categories left unexpanded because they sit at the depth bound
    pub depth_limited: usize,
    pub leaf_categories: usize,
    pub listing_pages: usize,
    pub listing_pages_failed: usize,
    pub empty_listing_pages: usize,
    pub products_saved: usize,
    pub products_rejected: usize,
    pub persistence_failures: usize,
}

/// One page of one leaf category's listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingTarget {
    pub category_id: i64,
    pub category_name: String,
    pub page: u32,
    pub variant: ListingVariant,
    pub url: String,
}

/// A persisted category waiting to have its children fetched
struct PendingCategory {
    id: i64,
    name: String,
    url: String,
    depth: u32,
}

/// Builds the listing pages to harvest, ordered by leaf, then variant, then page
pub fn listing_targets(
    leaves: &[Category],
    pages_per_category: u32,
    variants: &[ListingVariant],
    express_marker: &str,
) -> Vec<ListingTarget> {
    let mut targets = Vec::new();
    for leaf in leaves {
        for &variant in variants {
            for page in 1..=pages_per_category {
                targets.push(ListingTarget {
                    category_id: leaf.id,
                    category_name: leaf.name.clone(),
                    page,
                    variant,
                    url: listing_page_url(&leaf.url, page, variant, express_marker),
                });
            }
        }
    }
    targets
}

/// Main harvest orchestrator
///
/// Owns the storage handle it writes to, so tests can hand in their own
/// `Storage` implementation.
pub struct Harvester<S: Storage> {
    storage: S,
    client: Client,
    rules: ExtractRules,
    base_url: Url,
    crawler: CrawlerConfig,
    pacer: RequestPacer,
}

impl<S: Storage> Harvester<S> {
    /// Creates a new harvester
    ///
    /// # Returns
    ///
    /// * `Ok(Harvester)` - Ready to run
    /// * `Err(HarvestError)` - Invalid base URL or selectors, or the HTTP
    ///   client could not be built
    pub fn new(config: &Config, storage: S) -> Result<Self, HarvestError> {
        let client = build_http_client(
            &config.user_agent,
            Duration::from_secs(config.crawler.request_timeout_secs),
        )?;

        Ok(Self {
            storage,
            client,
            rules: ExtractRules::from_config(&config.selectors)?,
            base_url: parse_base_url(&config.site.base_url)?,
            crawler: config.crawler.clone(),
            pacer: RequestPacer::new(Duration::from_millis(config.crawler.request_delay_ms)),
        })
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Runs a complete harvest
    ///
    /// 1. Optionally clear the products of the harvested variants
    /// 2. Walk and persist the category tree (unless skipped)
    /// 3. Query the leaf categories
    /// 4. Harvest every listing page of every leaf and variant
    ///
    /// # Errors
    ///
    /// Only storage failures outside the crawl loops (clearing products,
    /// the leaf query) end the run early.
    pub async fn run(&mut self, options: &RunOptions) -> Result<HarvestSummary, HarvestError> {
        let variants = if options.variants.is_empty() {
            self.crawler.variants.clone()
        } else {
            options.variants.clone()
        };

        if options.fresh {
            for &variant in &variants {
                self.storage.clear_products(variant)?;
                tracing::info!("Cleared stored {} products", variant);
            }
        }

        let mut summary = HarvestSummary::default();

        if options.skip_tree {
            tracing::info!("Skipping category walk, reusing stored tree");
        } else {
            self.crawl_category_tree(&mut summary).await;
        }

        let leaves = self.storage.leaf_categories()?;
        summary.leaf_categories = leaves.len();
        tracing::info!("Found {} leaf categories", leaves.len());

        let targets = listing_targets(
            &leaves,
            self.crawler.pages_per_category,
            &variants,
            &self.crawler.express_marker,
        );
        self.harvest_listings(&targets, &mut summary).await;

        tracing::info!(
            "Harvest completed: {} categories, {} products saved, {} rejected, {} failed pages",
            summary.categories_saved,
            summary.products_saved,
            summary.products_rejected,
            summary.category_pages_failed + summary.listing_pages_failed
        );

        Ok(summary)
    }

    /// Walks the category tree depth-first and persists every category
    ///
    /// Categories are persisted before any of their children, and the
    /// children of one page are persisted together before the first of them
    /// is expanded.
    pub async fn crawl_category_tree(&mut self, summary: &mut HarvestSummary) {
        let roots = match fetch_document(&self.client, self.base_url.as_str()).await {
            Ok(document) => root_categories(&document, &self.rules, &self.base_url),
            Err(e) => {
                tracing::warn!("Failed to fetch site root: {}", e);
                summary.category_pages_failed += 1;
                return;
            }
        };

        if roots.is_empty() {
            tracing::warn!("No top-menu categories found on {}", self.base_url);
        }

        let mut pending = self.persist_links(roots, None, 1, summary);
        pending.reverse();

        while let Some(category) = pending.pop() {
            if category.depth >= self.crawler.max_depth {
                tracing::warn!(
                    "Not expanding '{}' (id {}): depth limit {} reached",
                    category.name,
                    category.id,
                    self.crawler.max_depth
                );
                summary.depth_limited += 1;
                continue;
            }

            let children = match fetch_child_categories(
                &self.client,
                &self.rules,
                &self.base_url,
                &category.url,
            )
            .await
            {
                Ok(children) => children,
                Err(e) => {
                    tracing::warn!("Failed to get children of '{}': {}", category.name, e);
                    summary.category_pages_failed += 1;
                    continue;
                }
            };

            tracing::debug!(
                "'{}' (id {}) has {} child categories",
                category.name,
                category.id,
                children.len()
            );

            let persisted =
                self.persist_links(children, Some(category.id), category.depth + 1, summary);
            pending.extend(persisted.into_iter().rev());
        }

        tracing::info!(
            "Category walk finished: {} categories saved",
            summary.categories_saved
        );
    }

    fn persist_links(
        &mut self,
        links: Vec<CategoryLink>,
        parent_id: Option<i64>,
        depth: u32,
        summary: &mut HarvestSummary,
    ) -> Vec<PendingCategory> {
        let mut persisted = Vec::with_capacity(links.len());

        for link in links {
            let category = NewCategory {
                name: link.name,
                url: link.url,
                parent_id,
            };

            match self.storage.insert_category(&category) {
                Ok(id) => {
                    summary.categories_saved += 1;
                    persisted.push(PendingCategory {
                        id,
                        name: category.name,
                        url: category.url,
                        depth,
                    });
                }
                Err(e) => {
                    tracing::error!("Failed to save category '{}': {}", category.name, e);
                    summary.persistence_failures += 1;
                }
            }
        }

        persisted
    }

    /// Fetches each listing page in order and persists its products
    pub async fn harvest_listings(
        &mut self,
        targets: &[ListingTarget],
        summary: &mut HarvestSummary,
    ) {
        tracing::info!(
            "Harvesting {} listing pages, pausing {:?} after each",
            targets.len(),
            self.pacer.delay()
        );

        for (index, target) in targets.iter().enumerate() {
            self.pacer.wait_turn().await;
            let saved = self.harvest_page(target, summary).await;
            self.pacer.finish();

            tracing::info!(
                "[{}/{}] {} page {} ({}): {} products",
                index + 1,
                targets.len(),
                target.category_name,
                target.page,
                target.variant,
                saved
            );
        }
    }

    /// Fetches one listing page and persists its products, returning how
    /// many were saved
    async fn harvest_page(
        &mut self,
        target: &ListingTarget,
        summary: &mut HarvestSummary,
    ) -> usize {
        summary.listing_pages += 1;

        let items = match fetch_document(&self.client, &target.url).await {
            Ok(document) => extract_products(&document, &self.rules, &self.base_url),
            Err(e) => {
                tracing::warn!("Failed to fetch listing page: {}", e);
                summary.listing_pages_failed += 1;
                return 0;
            }
        };

        if items.is_empty() {
            tracing::debug!("No products on {}", target.url);
            summary.empty_listing_pages += 1;
        }

        let mut saved = 0;
        for (position, item) in items.into_iter().enumerate() {
            let product = match item {
                Ok(product) => product,
                Err(e) => {
                    tracing::warn!(
                        "Skipping product {} on {}: {}",
                        position + 1,
                        target.url,
                        e
                    );
                    summary.products_rejected += 1;
                    continue;
                }
            };

            let record = product.into_record(target.category_id, target.variant);
            match self.storage.insert_product(&record) {
                Ok(_) => saved += 1,
                Err(e) => {
                    tracing::error!("Failed to save product {}: {}", record.sku, e);
                    summary.persistence_failures += 1;
                }
            }
        }
        summary.products_saved += saved;
        saved
    }
}
