use url::Url;

/// Computes the duplicate-filter key of a request URL
///
/// # Canonicalization Steps
///
/// 1. Lowercase the host (the `url` crate already does this on parse)
/// 2. Remove the fragment
/// 3. Sort query parameters by key, then value
/// 4. Remove an empty query string
///
/// Scheme, path and parameter values are kept as-is, so `page=1` and
/// `page=2` of the same listing stay distinct.
///
/// # Examples
///
/// ```
/// use catalog_crawler::url::request_fingerprint;
/// use url::Url;
///
/// let a = Url::parse("https://example.com/c?page=2&top=4#grid").unwrap();
/// let b = Url::parse("https://EXAMPLE.com/c?top=4&page=2").unwrap();
/// assert_eq!(request_fingerprint(&a), request_fingerprint(&b));
/// ```
pub fn request_fingerprint(url: &Url) -> String {
    let mut canonical = url.clone();
    canonical.set_fragment(None);

    if canonical.query().is_some() {
        let mut params: Vec<(String, String)> = canonical.query_pairs().into_owned().collect();
        params.sort();

        if params.is_empty() {
            canonical.set_query(None);
        } else {
            canonical.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    canonical.into()
}
