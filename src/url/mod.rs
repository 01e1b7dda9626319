//! URL handling module for Tiki-Harvest
//!
//! This module qualifies hrefs scraped from the site against its base origin
//! and builds the paginated listing URLs harvested for each leaf category.

mod listing;
mod resolve;

pub use listing::listing_page_url;
pub use resolve::{last_path_segment, parse_base_url, qualify_href};
