use crate::model::CategoryPath;
use serde::Serialize;

/// Canonical product extracted from a single product page
///
/// Built by the record assembler and consumed exactly once by the export
/// router. Unset optional fields and empty lists are left out of the
/// serialized line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRecord {
    /// Cleaned category path, also used to pick the output partition
    pub article_type: CategoryPath,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,

    /// URL of the product page; always present
    pub product_url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_name: Option<String>,

    /// Price with the currency symbol stripped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,

    /// Available sizes
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fit: Vec<String>,

    /// Available widths (mostly shoes)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub width: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub colors: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub size_info: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details_and_care_info: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details_and_care_list: Vec<String>,

    /// Image URLs without query strings
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub image_urls: Vec<String>,

    /// Reserved for image post-processing
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

impl ProductRecord {
    /// Creates a record with only the required fields set
    pub fn new(article_type: CategoryPath, product_url: impl Into<String>) -> Self {
        Self {
            article_type,
            product_name: None,
            product_url: product_url.into(),
            brand_name: None,
            price: None,
            fit: Vec::new(),
            width: Vec::new(),
            colors: Vec::new(),
            size_info: Vec::new(),
            details_and_care_info: Vec::new(),
            details_and_care_list: Vec::new(),
            image_urls: Vec::new(),
            images: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_record_serialization() {
        let record = ProductRecord::new(
            CategoryPath::new(["Women", "Shoes"]).unwrap(),
            "https://example.com/p/1",
        );

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"article_type":["Women","Shoes"],"product_url":"https://example.com/p/1"}"#
        );
    }

    #[test]
    fn test_field_order_follows_declaration() {
        let mut record = ProductRecord::new(CategoryPath::new(["Men"]).unwrap(), "u");
        record.price = Some("25.00".to_string());
        record.product_name = Some("Boot".to_string());
        record.colors = vec!["Black".to_string()];

        let json = serde_json::to_string(&record).unwrap();
        let name_at = json.find("product_name").unwrap();
        let url_at = json.find("product_url").unwrap();
        let price_at = json.find("price").unwrap();
        let colors_at = json.find("colors").unwrap();
        assert!(name_at < url_at && url_at < price_at && price_at < colors_at);
    }
}
