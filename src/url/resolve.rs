use crate::UrlError;
use url::Url;

/// Parses the configured site root
///
/// # Examples
///
/// ```
/// use tiki_harvest::url::parse_base_url;
///
/// let base = parse_base_url("https://tiki.vn").unwrap();
/// assert_eq!(base.as_str(), "https://tiki.vn/");
/// ```
pub fn parse_base_url(base_url: &str) -> Result<Url, UrlError> {
    let url = Url::parse(base_url).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    Ok(url)
}

/// Qualifies an href scraped from a page against the site's base URL
///
/// Absolute hrefs are kept as they are; relative hrefs are joined onto the
/// base. Non-navigational schemes (`javascript:`, `mailto:`, `tel:`,
/// `data:`) are rejected.
///
/// # Examples
///
/// ```
/// use tiki_harvest::url::{parse_base_url, qualify_href};
///
/// let base = parse_base_url("https://tiki.vn").unwrap();
/// let url = qualify_href("/dien-thoai-may-tinh-bang/c1789", &base).unwrap();
/// assert_eq!(url.as_str(), "https://tiki.vn/dien-thoai-may-tinh-bang/c1789");
/// ```
pub fn qualify_href(href: &str, base: &Url) -> Result<Url, UrlError> {
    let href = href.trim();

    if href.is_empty() {
        return Err(UrlError::EmptyHref);
    }

    let url = base
        .join(href)
        .map_err(|e| UrlError::Parse(format!("{}: {}", href, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    Ok(url)
}

/// Returns the text after the last `/`, or the whole input when there is none
pub fn last_path_segment(value: &str) -> &str {
    value.rsplit('/').next().unwrap_or(value).trim()
}
