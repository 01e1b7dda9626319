use crate::storage::ListingVariant;
use serde::Deserialize;

/// Main configuration structure for Tiki-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
}

/// Target site configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Site root; also the origin relative hrefs are qualified against
    #[serde(rename = "base-url")]
    pub base_url: String,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of listing pages fetched per leaf category and variant
    #[serde(rename = "pages-per-category", default = "default_pages_per_category")]
    pub pages_per_category: u32,

    /// Minimum time between listing requests (milliseconds)
    #[serde(rename = "request-delay-ms", default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Deepest category level that is persisted; top-menu categories are level 1
    #[serde(rename = "max-depth", default = "default_max_depth")]
    pub max_depth: u32,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Listing variants harvested for every leaf category
    #[serde(default = "default_variants")]
    pub variants: Vec<ListingVariant>,

    /// Key-only query parameter that selects the express listing
    #[serde(rename = "express-marker", default = "default_express_marker")]
    pub express_marker: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            pages_per_category: default_pages_per_category(),
            request_delay_ms: default_request_delay_ms(),
            max_depth: default_max_depth(),
            request_timeout_secs: default_request_timeout_secs(),
            variants: default_variants(),
            express_marker: default_express_marker(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// CSS selectors describing the site's markup
///
/// Every field defaults to the markup the site serves today, so the table
/// only needs to be present in the config file when the site changes.
#[derive(Debug, Clone, Deserialize)]
pub struct SelectorConfig {
    /// Top-menu anchors on the site root
    #[serde(rename = "menu-link", default = "default_menu_link")]
    pub menu_link: String,

    /// Label element inside a top-menu anchor
    #[serde(rename = "menu-label", default = "default_menu_label")]
    pub menu_label: String,

    /// Child category containers on a category page
    #[serde(rename = "child-item", default = "default_child_item")]
    pub child_item: String,

    /// Product tiles on a listing page
    #[serde(rename = "product-item", default = "default_product_item")]
    pub product_item: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            menu_link: default_menu_link(),
            menu_label: default_menu_label(),
            child_item: default_child_item(),
            product_item: default_product_item(),
        }
    }
}

fn default_pages_per_category() -> u32 {
    2
}

fn default_request_delay_ms() -> u64 {
    1000
}

fn default_max_depth() -> u32 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_variants() -> Vec<ListingVariant> {
    vec![ListingVariant::Standard, ListingVariant::Express]
}

fn default_express_marker() -> String {
    "support_p2h_delivery".to_string()
}

fn default_menu_link() -> String {
    "a.MenuItem__MenuLink-sc-181aa19-1.fKvTQu".to_string()
}

fn default_menu_label() -> String {
    "span.text".to_string()
}

fn default_child_item() -> String {
    "div.list-group-item.is-child".to_string()
}

fn default_product_item() -> String {
    ".product-item".to_string()
}
