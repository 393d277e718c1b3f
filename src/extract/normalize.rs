//! Field normalization rules
//!
//! Each record field maps to exactly one rule in [`Field::rule`]. The rules
//! are pure: they read the raw extraction buffer and return new values.

use crate::url::strip_query;

/// Fields of a product record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    ArticleType,
    ProductName,
    ProductUrl,
    BrandName,
    Price,
    Fit,
    Width,
    Colors,
    SizeInfo,
    DetailsAndCareInfo,
    DetailsAndCareList,
    ImageUrls,
    Images,
}

impl Field {
    /// Output key of the field
    pub fn name(&self) -> &'static str {
        match self {
            Self::ArticleType => "article_type",
            Self::ProductName => "product_name",
            Self::ProductUrl => "product_url",
            Self::BrandName => "brand_name",
            Self::Price => "price",
            Self::Fit => "fit",
            Self::Width => "width",
            Self::Colors => "colors",
            Self::SizeInfo => "size_info",
            Self::DetailsAndCareInfo => "details_and_care_info",
            Self::DetailsAndCareList => "details_and_care_list",
            Self::ImageUrls => "image_urls",
            Self::Images => "images",
        }
    }

    /// The normalization rule applied to this field's raw values
    pub fn rule(&self) -> FieldRule {
        match self {
            Self::ArticleType => FieldRule::CategoryCleanup,
            Self::ProductName | Self::ProductUrl | Self::BrandName => FieldRule::TakeFirst,
            Self::Price => FieldRule::MapCollect(strip_currency),
            Self::ImageUrls => FieldRule::MapCollect(strip_query),
            Self::Fit
            | Self::Width
            | Self::Colors
            | Self::SizeInfo
            | Self::DetailsAndCareInfo
            | Self::DetailsAndCareList
            | Self::Images => FieldRule::Passthrough,
        }
    }
}

/// Output rule for one field
#[derive(Debug, Clone, Copy)]
pub enum FieldRule {
    /// Keep the first non-blank value
    TakeFirst,
    /// Transform every value, keep all results in order
    MapCollect(fn(&str) -> String),
    /// Drop leading "sale"/"home" noise labels
    CategoryCleanup,
    /// Keep all values verbatim
    Passthrough,
}

/// Result of applying a rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Single(Option<String>),
    List(Vec<String>),
}

impl FieldValue {
    /// Collapses the value to a single string
    pub fn into_single(self) -> Option<String> {
        match self {
            Self::Single(value) => value,
            Self::List(values) => values.into_iter().next(),
        }
    }

    /// Expands the value to a list
    pub fn into_list(self) -> Vec<String> {
        match self {
            Self::Single(value) => value.into_iter().collect(),
            Self::List(values) => values,
        }
    }
}

impl FieldRule {
    pub fn apply(&self, values: &[String]) -> FieldValue {
        match self {
            Self::TakeFirst => FieldValue::Single(
                values
                    .iter()
                    .find(|value| !value.trim().is_empty())
                    .cloned(),
            ),
            Self::MapCollect(transform) => {
                FieldValue::List(values.iter().map(|value| transform(value)).collect())
            }
            Self::CategoryCleanup => FieldValue::List(remove_sale_home(values)),
            Self::Passthrough => FieldValue::List(values.to_vec()),
        }
    }
}

/// Removes "sale" and "home" noise labels from the head of a category list
///
/// Index 1 is checked for "sale" before index 0 is checked for "home":
/// dropping index 0 first would shift a "sale" label into position 0 where
/// only the "home" check applies. Matching is a case-insensitive substring
/// test. Positions past the second are never inspected.
///
/// # Examples
///
/// ```
/// use catalog_crawler::extract::remove_sale_home;
///
/// let labels = vec!["Home".to_string(), "Sale".to_string(), "Shoes".to_string()];
/// assert_eq!(remove_sale_home(&labels), vec!["Shoes".to_string()]);
/// ```
pub fn remove_sale_home(labels: &[String]) -> Vec<String> {
    let mut cleaned = labels.to_vec();

    if cleaned
        .get(1)
        .is_some_and(|label| label.to_lowercase().contains("sale"))
    {
        cleaned.remove(1);
    }

    if cleaned
        .first()
        .is_some_and(|label| label.to_lowercase().contains("home"))
    {
        cleaned.remove(0);
    }

    cleaned
}

/// Strips a leading currency symbol from a price string
///
/// Only a single leading non-digit character is removed, so `"$25.00"`
/// becomes `"25.00"` while an already bare `"25.00"` is kept.
pub fn strip_currency(price: &str) -> String {
    let price = price.trim();
    let mut chars = price.chars();

    match chars.next() {
        Some(first) if !first.is_ascii_digit() => chars.as_str().trim_start().to_string(),
        _ => price.to_string(),
    }
}
