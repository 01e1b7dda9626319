//! Compiled CSS selectors for the site's markup

use crate::config::SelectorConfig;
use crate::ConfigError;
use scraper::Selector;

/// Selectors used by the category and product extractors
///
/// The page-level selectors come from configuration; the selectors for
/// fields inside a product tile are fixed.
#[derive(Debug, Clone)]
pub struct ExtractRules {
    pub(crate) menu_link: Selector,
    pub(crate) menu_label: Selector,
    pub(crate) child_item: Selector,
    pub(crate) product_item: Selector,
    pub(crate) anchor: Selector,
    pub(crate) image: Selector,
    pub(crate) final_price: Selector,
    pub(crate) regular_price: Selector,
    pub(crate) review: Selector,
    pub(crate) sale_tag: Selector,
}

impl ExtractRules {
    /// Compiles the configured selectors
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidSelector` naming the first selector that
    /// fails to parse.
    pub fn from_config(config: &SelectorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            menu_link: compile("menu-link", &config.menu_link)?,
            menu_label: compile("menu-label", &config.menu_label)?,
            child_item: compile("child-item", &config.child_item)?,
            product_item: compile("product-item", &config.product_item)?,
            anchor: compile("anchor", "a")?,
            image: compile("image", "img")?,
            final_price: compile("final-price", ".final-price")?,
            regular_price: compile("price-regular", "span.price-regular")?,
            review: compile("review", "p.review")?,
            sale_tag: compile("sale-tag", "span.sale-tag")?,
        })
    }
}

fn compile(name: &'static str, selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|_| ConfigError::InvalidSelector {
        name,
        selector: selector.to_string(),
    })
}
