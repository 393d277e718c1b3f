use url::Url;

/// Removes the query string and fragment from a URL string
///
/// Works on the raw text so relative and protocol-relative image sources
/// are cleaned the same way as absolute ones.
///
/// # Examples
///
/// ```
/// use catalog_crawler::url::strip_query;
///
/// assert_eq!(
///     strip_query("https://img.example.com/a.jpg?h=60&w=40"),
///     "https://img.example.com/a.jpg"
/// );
/// ```
pub fn strip_query(url: &str) -> String {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    url[..end].to_string()
}

/// Returns a copy of `url` with the given query parameters set
///
/// Existing parameters keep their position and have their value replaced
/// (later duplicates of the same key are dropped); new parameters are
/// appended in the given order. All other parameters are preserved.
pub fn with_query_params<K, V>(url: &Url, params: &[(K, V)]) -> Url
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

    for (key, value) in params {
        let key = key.as_ref();
        let value = value.as_ref();

        match pairs.iter().position(|(k, _)| k == key) {
            Some(first) => {
                pairs[first].1 = value.to_string();
                let mut index = 0;
                pairs.retain(|(k, _)| {
                    let keep = index <= first || k != key;
                    index += 1;
                    keep
                });
            }
            None => pairs.push((key.to_string(), value.to_string())),
        }
    }

    let mut next = url.clone();
    if pairs.is_empty() {
        next.set_query(None);
    } else {
        next.query_pairs_mut().clear().extend_pairs(pairs);
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_query() {
        assert_eq!(
            strip_query("https://example.com/a.jpg?$S$&wid=40"),
            "https://example.com/a.jpg"
        );
        assert_eq!(strip_query("https://example.com/a.jpg"), "https://example.com/a.jpg");
        assert_eq!(strip_query("//cdn.example.com/a.jpg#zoom"), "//cdn.example.com/a.jpg");
    }

    #[test]
    fn test_with_query_params_appends() {
        let url = Url::parse("https://shop.example.com/c/women-boots").unwrap();
        let next = with_query_params(&url, &[("top", "4"), ("page", "1")]);
        assert_eq!(next.as_str(), "https://shop.example.com/c/women-boots?top=4&page=1");
    }

    #[test]
    fn test_with_query_params_replaces_in_place() {
        let url = Url::parse("https://shop.example.com/c?origin=nav&page=3&top=4").unwrap();
        let next = with_query_params(&url, &[("page", "4")]);
        assert_eq!(next.as_str(), "https://shop.example.com/c?origin=nav&page=4&top=4");
    }

    #[test]
    fn test_with_query_params_drops_duplicates() {
        let url = Url::parse("https://shop.example.com/c?page=1&page=7").unwrap();
        let next = with_query_params(&url, &[("page", "2")]);
        assert_eq!(next.as_str(), "https://shop.example.com/c?page=2");
    }

    #[test]
    fn test_with_query_params_leaves_source_untouched() {
        let url = Url::parse("https://shop.example.com/c?page=1").unwrap();
        let _ = with_query_params(&url, &[("page", "2")]);
        assert_eq!(url.query(), Some("page=1"));
    }
}
