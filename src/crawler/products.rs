//! Product tile extraction from listing pages
//!
//! Every field is read by its own function. Title, SKU, URL, image, category
//! label and final price are required: a tile missing one of them is
//! rejected on its own without affecting the rest of the page. Regular
//! price, discount label and review count degrade to "unset" or zero,
//! whether absent or unreadable.

use crate::crawler::rules::ExtractRules;
use crate::storage::{ListingVariant, ProductRecord};
use crate::url::{last_path_segment, qualify_href};
use crate::UrlError;
use scraper::{ElementRef, Html};
use thiserror::Error;
use url::Url;

/// Review text the site shows on tiles without any review
pub const NO_REVIEWS_TEXT: &str = "Chưa có nhận xét";

/// Characters stripped from a price before parsing
const PRICE_NOISE: &[char] = &['.', 'đ', '₫'];

/// Characters of the localized "(N nhận xét)" wrapper around a review count
const REVIEW_NOISE: &[char] = &['(', ')', 'n', 'h', 'ậ', 'x', 'é', 't', '.', ','];

/// Reasons a single product tile was rejected
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("missing {0} element")]
    MissingElement(&'static str),

    #[error("missing '{attribute}' attribute for {field}")]
    MissingAttribute {
        field: &'static str,
        attribute: &'static str,
    },

    #[error("invalid {field} value '{raw}'")]
    InvalidNumber { field: &'static str, raw: String },

    #[error("invalid {field} url: {source}")]
    InvalidUrl {
        field: &'static str,
        source: UrlError,
    },
}

/// Fields scraped from one product tile, before it is tied to a category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapedProduct {
    pub category_label: String,
    pub sku: String,
    pub title: String,
    pub url: String,
    pub image_url: String,
    pub regular_price: Option<i64>,
    pub final_price: i64,
    pub discount_label: Option<String>,
    pub review_count: i64,
}

impl ScrapedProduct {
    /// Tags the scraped fields with the leaf category and listing variant
    pub fn into_record(self, category_id: i64, variant: ListingVariant) -> ProductRecord {
        ProductRecord {
            category_id,
            category_label: self.category_label,
            sku: self.sku,
            title: self.title,
            url: self.url,
            image_url: self.image_url,
            regular_price: self.regular_price,
            final_price: self.final_price,
            discount_label: self.discount_label,
            review_count: self.review_count,
            variant,
        }
    }
}

/// Extracts every product tile on a listing page
///
/// A page without tiles (e.g. a page number past the end of the listing)
/// yields an empty vector. Each tile is extracted independently.
pub fn extract_products(
    document: &Html,
    rules: &ExtractRules,
    base: &Url,
) -> Vec<Result<ScrapedProduct, ExtractError>> {
    document
        .select(&rules.product_item)
        .map(|item| extract_product(item, rules, base))
        .collect()
}

fn extract_product(
    item: ElementRef<'_>,
    rules: &ExtractRules,
    base: &Url,
) -> Result<ScrapedProduct, ExtractError> {
    let anchor = item
        .select(&rules.anchor)
        .next()
        .ok_or(ExtractError::MissingElement("product link"))?;

    Ok(ScrapedProduct {
        sku: required_attr(item, "sku", "product-sku")?.to_string(),
        title: required_attr(anchor, "title", "title")?.to_string(),
        category_label: category_label(item)?,
        url: product_url(anchor, base)?,
        image_url: image_url(anchor, rules, base)?,
        final_price: final_price(item, rules)?,
        regular_price: regular_price(item, rules),
        discount_label: discount_label(item, rules),
        review_count: review_count(item, rules),
    })
}

fn required_attr<'a>(
    element: ElementRef<'a>,
    field: &'static str,
    attribute: &'static str,
) -> Result<&'a str, ExtractError> {
    element
        .value()
        .attr(attribute)
        .ok_or(ExtractError::MissingAttribute { field, attribute })
}

fn category_label(item: ElementRef<'_>) -> Result<String, ExtractError> {
    let path = required_attr(item, "category label", "data-category")?;
    Ok(last_path_segment(path).to_string())
}

fn product_url(anchor: ElementRef<'_>, base: &Url) -> Result<String, ExtractError> {
    let href = required_attr(anchor, "url", "href")?;
    qualify_href(href, base)
        .map(|url| url.to_string())
        .map_err(|source| ExtractError::InvalidUrl {
            field: "url",
            source,
        })
}

fn image_url(
    anchor: ElementRef<'_>,
    rules: &ExtractRules,
    base: &Url,
) -> Result<String, ExtractError> {
    let image = anchor
        .select(&rules.image)
        .next()
        .ok_or(ExtractError::MissingElement("image"))?;
    let src = required_attr(image, "image", "src")?;
    qualify_href(src, base)
        .map(|url| url.to_string())
        .map_err(|source| ExtractError::InvalidUrl {
            field: "image",
            source,
        })
}

/// The final price is the first text node of its element; nested elements
/// such as an inline discount badge are ignored.
fn final_price(item: ElementRef<'_>, rules: &ExtractRules) -> Result<i64, ExtractError> {
    let element = item
        .select(&rules.final_price)
        .next()
        .ok_or(ExtractError::MissingElement("final-price"))?;

    let raw = element
        .children()
        .filter_map(|node| node.value().as_text())
        .map(|text| text.trim())
        .find(|text| !text.is_empty())
        .ok_or(ExtractError::MissingElement("final-price text"))?;

    parse_price("final price", raw)
}

fn regular_price(item: ElementRef<'_>, rules: &ExtractRules) -> Option<i64> {
    let element = item.select(&rules.regular_price).next()?;
    let raw: String = element.text().collect();

    match parse_price("regular price", &raw) {
        Ok(price) => Some(price),
        Err(e) => {
            tracing::debug!("Ignoring regular price: {}", e);
            None
        }
    }
}

fn discount_label(item: ElementRef<'_>, rules: &ExtractRules) -> Option<String> {
    item.select(&rules.sale_tag)
        .next()
        .map(|tag| tag.text().collect::<String>().trim().to_string())
}

/// A missing or unreadable review text counts as zero reviews.
fn review_count(item: ElementRef<'_>, rules: &ExtractRules) -> i64 {
    let Some(element) = item.select(&rules.review).next() else {
        return 0;
    };

    match parse_review_count(&element.text().collect::<String>()) {
        Ok(count) => count,
        Err(e) => {
            tracing::debug!("Ignoring review count: {}", e);
            0
        }
    }
}

/// Parses a price such as `1.234.567đ` into minor currency units
///
/// # Examples
///
/// ```
/// use tiki_harvest::crawler::parse_price;
///
/// assert_eq!(parse_price("final price", "1.234.567đ").unwrap(), 1_234_567);
/// ```
pub fn parse_price(field: &'static str, raw: &str) -> Result<i64, ExtractError> {
    let digits: String = raw
        .chars()
        .filter(|c| !PRICE_NOISE.contains(c) && !c.is_whitespace())
        .collect();

    let invalid = || ExtractError::InvalidNumber {
        field,
        raw: raw.trim().to_string(),
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    digits.parse().map_err(|_| invalid())
}

/// Parses the review text of a tile
///
/// [`NO_REVIEWS_TEXT`] means zero reviews; otherwise the count is whatever
/// digits remain once the localized wrapper is stripped, e.g.
/// `(12 nhận xét)` is 12.
pub fn parse_review_count(raw: &str) -> Result<i64, ExtractError> {
    let text = raw.trim();
    if text == NO_REVIEWS_TEXT {
        return Ok(0);
    }

    let digits: String = text
        .chars()
        .filter(|c| !REVIEW_NOISE.contains(c) && !c.is_whitespace())
        .collect();

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ExtractError::InvalidNumber {
            field: "review count",
            raw: text.to_string(),
        });
    }

    digits.parse().map_err(|_| ExtractError::InvalidNumber {
        field: "review count",
        raw: text.to_string(),
    })
}
