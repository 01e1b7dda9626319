use crate::storage::ListingVariant;

/// Builds the URL of one page of a category's product listing
///
/// The page number is appended as a `page` query parameter. The express
/// variant additionally carries `express_marker` as a key-only parameter.
///
/// # Examples
///
/// ```
/// use tiki_harvest::storage::ListingVariant;
/// use tiki_harvest::url::listing_page_url;
///
/// let url = listing_page_url(
///     "https://tiki.vn/dien-thoai/c1789?src=c.1789.hamburger",
///     2,
///     ListingVariant::Express,
///     "support_p2h_delivery",
/// );
/// assert_eq!(
///     url,
///     "https://tiki.vn/dien-thoai/c1789?src=c.1789.hamburger&page=2&support_p2h_delivery"
/// );
/// ```
pub fn listing_page_url(
    category_url: &str,
    page: u32,
    variant: ListingVariant,
    express_marker: &str,
) -> String {
    let separator = if category_url.contains('?') { '&' } else { '?' };
    let mut url = format!("{}{}page={}", category_url, separator, page);

    if variant == ListingVariant::Express {
        url.push('&');
        url.push_str(express_marker);
    }

    url
}
