//! Category link extraction
//!
//! Top-level categories come from the site root's menu; child categories come
//! from the "child list item" containers of a category page. Pages without
//! the expected markup simply yield no categories.

use crate::crawler::fetcher::fetch_document;
use crate::crawler::rules::ExtractRules;
use crate::url::qualify_href;
use crate::HarvestError;
use reqwest::Client;
use scraper::{ElementRef, Html};
use url::Url;

/// A category name and absolute URL scraped from a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryLink {
    pub name: String,
    pub url: String,
}

/// Extracts the top-menu categories from the site root
///
/// The name is read from the anchor's label element, falling back to the
/// anchor's own text.
pub fn root_categories(document: &Html, rules: &ExtractRules, base: &Url) -> Vec<CategoryLink> {
    document
        .select(&rules.menu_link)
        .filter_map(|anchor| {
            let label = anchor
                .select(&rules.menu_label)
                .next()
                .unwrap_or(anchor);
            category_link(anchor, &element_text(label), base)
        })
        .collect()
}

/// Extracts the child categories listed on a category page
pub fn child_categories(document: &Html, rules: &ExtractRules, base: &Url) -> Vec<CategoryLink> {
    document
        .select(&rules.child_item)
        .filter_map(|item| {
            let anchor = item.select(&rules.anchor).next()?;
            category_link(anchor, &element_text(anchor), base)
        })
        .collect()
}

/// Fetches a category page and extracts its child categories
///
/// # Errors
///
/// Returns the fetch failure; callers treat it as "no children" for that
/// node and continue the walk.
pub async fn fetch_child_categories(
    client: &Client,
    rules: &ExtractRules,
    base: &Url,
    parent_url: &str,
) -> Result<Vec<CategoryLink>, HarvestError> {
    let document = fetch_document(client, parent_url).await?;
    Ok(child_categories(&document, rules, base))
}

/// Normalizes a scraped category name
///
/// Runs of two or more whitespace characters become one space, remaining
/// newlines are removed, and the ends are trimmed.
pub fn normalize_name(raw: &str) -> String {
    let mut normalized = String::with_capacity(raw.len());
    let mut run = String::new();

    for c in raw.chars() {
        if c.is_whitespace() {
            run.push(c);
            continue;
        }
        flush_whitespace(&mut normalized, &mut run);
        normalized.push(c);
    }
    flush_whitespace(&mut normalized, &mut run);

    normalized.replace('\n', "").trim().to_string()
}

fn flush_whitespace(out: &mut String, run: &mut String) {
    match run.chars().count() {
        0 => {}
        1 => out.push_str(run),
        _ => out.push(' '),
    }
    run.clear();
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

fn category_link(anchor: ElementRef<'_>, raw_name: &str, base: &Url) -> Option<CategoryLink> {
    let href = anchor.value().attr("href")?;
    let url = match qualify_href(href, base) {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!("Skipping category link '{}': {}", href, e);
            return None;
        }
    };

    Some(CategoryLink {
        name: normalize_name(raw_name),
        url: url.to_string(),
    })
}
