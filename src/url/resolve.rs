use url::Url;

/// Resolves a link href against the page URL
///
/// Returns None if the link should not be followed:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only links
/// - invalid URLs
/// - non-HTTP(S) URLs after resolution
///
/// # Examples
///
/// ```
/// use catalog_crawler::url::resolve_link;
/// use url::Url;
///
/// let base = Url::parse("https://shop.example.com/women/shoes").unwrap();
/// let link = resolve_link("/p/123", &base).unwrap();
/// assert_eq!(link.as_str(), "https://shop.example.com/p/123");
/// ```
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    if href.starts_with('#') {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url)
            } else {
                None
            }
        }
        Err(_) => None,
    }
}
