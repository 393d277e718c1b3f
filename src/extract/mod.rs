//! Extraction of product records from page content
//!
//! This module turns page markup into canonical records:
//! - Locator parsing and the selector service over parsed HTML
//! - Per-field normalization rules
//! - Embedded JSON blob discovery and repair
//! - Record assembly from raw fields plus inherited crawl context

mod assembler;
mod embedded;
mod normalize;
mod selector;

pub use assembler::{RawFields, RecordAssembler};
pub use embedded::{repair_escapes, EmbeddedBlob, EmbeddedData};
pub use normalize::{remove_sale_home, strip_currency, Field, FieldRule, FieldValue};
pub use selector::{HtmlDocument, Locator, SelectorService, Target};

use thiserror::Error;

/// Errors raised while extracting data from a page
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The page lacks the data block this site's product pages carry
    #[error("Expected data block not found: {0}")]
    MissingBlock(String),

    /// A listing page without category indicators
    #[error("Not a listing grid page")]
    NotGridPage,

    #[error("Embedded data failed to parse: {0}")]
    InvalidBlob(#[from] serde_json::Error),

    #[error("Required field '{0}' is missing")]
    MissingField(&'static str),
}

impl ExtractError {
    /// Returns true for pages that are skipped silently rather than reported
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::MissingBlock(_) | Self::NotGridPage)
    }
}

/// Result type for extraction operations
pub type ExtractResult<T> = Result<T, ExtractError>;
