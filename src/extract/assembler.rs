//! Record assembly from a product page
//!
//! The assembler runs every configured field locator against the page,
//! takes price, sizes and colours from the embedded blob on sites that have
//! one, applies the inherited category path, then applies each field's
//! normalization rule once.

use crate::config::ProductSelectors;
use crate::extract::{
    EmbeddedBlob, ExtractError, ExtractResult, Field, Locator, SelectorService,
};
use crate::model::{CategoryPath, CrawlContext, ProductRecord};
use crate::ConfigError;
use std::collections::HashMap;
use tracing::trace;
use url::Url;

/// Raw extraction buffer, keyed by field
///
/// Values are kept in the order they were added. Rules are applied only when
/// the record is built.
#[derive(Debug, Default, Clone)]
pub struct RawFields {
    values: HashMap<Field, Vec<String>>,
}

impl RawFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends values to a field's buffer
    pub fn extend<I>(&mut self, field: Field, values: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.values.entry(field).or_default().extend(values);
    }

    /// Replaces a field's buffer
    pub fn set(&mut self, field: Field, values: Vec<String>) {
        self.values.insert(field, values);
    }

    pub fn get(&self, field: Field) -> &[String] {
        self.values.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Applies every field rule and builds the record
    ///
    /// # Errors
    ///
    /// Returns `MissingField` when `product_url` is unset or when the
    /// cleaned category path is empty.
    pub fn into_record(self) -> ExtractResult<ProductRecord> {
        let single = |field: Field| field.rule().apply(self.get(field)).into_single();
        let list = |field: Field| field.rule().apply(self.get(field)).into_list();

        let product_url =
            single(Field::ProductUrl).ok_or(ExtractError::MissingField(Field::ProductUrl.name()))?;
        let article_type = CategoryPath::new(list(Field::ArticleType))
            .ok_or(ExtractError::MissingField(Field::ArticleType.name()))?;

        let mut record = ProductRecord::new(article_type, product_url);
        record.product_name = single(Field::ProductName);
        record.brand_name = single(Field::BrandName);
        record.price = single(Field::Price);
        record.fit = list(Field::Fit);
        record.width = list(Field::Width);
        record.colors = list(Field::Colors);
        record.size_info = list(Field::SizeInfo);
        record.details_and_care_info = list(Field::DetailsAndCareInfo);
        record.details_and_care_list = list(Field::DetailsAndCareList);
        record.image_urls = list(Field::ImageUrls);
        record.images = list(Field::Images);

        Ok(record)
    }
}

/// Builds product records for one site
#[derive(Debug, Clone)]
pub struct RecordAssembler {
    locators: Vec<(Field, Locator)>,
    embedded: Option<EmbeddedBlob>,
    scripts: Locator,
}

impl RecordAssembler {
    /// Compiles a site's product locators
    pub fn from_config(selectors: &ProductSelectors) -> Result<Self, ConfigError> {
        let configured = [
            (Field::ArticleType, &selectors.article_type),
            (Field::ProductName, &selectors.product_name),
            (Field::BrandName, &selectors.brand_name),
            (Field::Price, &selectors.price),
            (Field::Fit, &selectors.fit),
            (Field::Width, &selectors.width),
            (Field::Colors, &selectors.colors),
            (Field::SizeInfo, &selectors.size_info),
            (Field::DetailsAndCareInfo, &selectors.details_and_care_info),
            (Field::DetailsAndCareList, &selectors.details_and_care_list),
            (Field::ImageUrls, &selectors.image_urls),
        ];

        let mut locators = Vec::new();
        for (field, source) in configured {
            if let Some(source) = source {
                locators.push((field, Locator::parse(source)?));
            }
        }

        let embedded = selectors
            .embedded
            .as_ref()
            .map(EmbeddedBlob::from_config)
            .transpose()?;

        Ok(Self {
            locators,
            embedded,
            scripts: Locator::parse("script")?,
        })
    }

    /// Extracts a record from a product page
    ///
    /// # Arguments
    ///
    /// * `page` - Selector service over the product page
    /// * `page_url` - Final URL of the page, stored as `product_url`
    /// * `context` - Context inherited from the listing that linked here
    ///
    /// # Errors
    ///
    /// `MissingBlock` when the site expects an embedded blob and the page has
    /// none; this is a skip. `InvalidBlob` and `MissingField` are parse
    /// failures for this page.
    pub fn assemble(
        &self,
        page: &dyn SelectorService,
        page_url: &Url,
        context: &CrawlContext,
    ) -> ExtractResult<ProductRecord> {
        let mut raw = RawFields::new();

        for (field, locator) in &self.locators {
            raw.extend(*field, page.select(locator));
        }

        if let Some(embedded) = &self.embedded {
            let scripts = page.select(&self.scripts);
            let blob = embedded
                .locate(&scripts)
                .ok_or_else(|| ExtractError::MissingBlock(embedded.marker().to_string()))?;
            let data = embedded.parse(blob)?;

            trace!(
                url = %page_url,
                sizes = data.sizes.len(),
                colours = data.colours.len(),
                "Read embedded blob"
            );

            // The blob is the only source of these fields
            raw.set(Field::Price, data.price);
            raw.set(Field::Fit, data.sizes);
            raw.set(Field::Colors, data.colours);
        }

        if let Some(path) = context.category_path() {
            raw.set(Field::ArticleType, path.labels().to_vec());
        }

        raw.set(Field::ProductUrl, vec![page_url.to_string()]);

        raw.into_record()
    }
}
