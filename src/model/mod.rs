//! Data model shared by traversal, extraction and export
//!
//! # Components
//!
//! - `CategoryPath`: ordered category labels from taxonomy root to leaf
//! - `CrawlContext`: per-branch state carried with a pending fetch
//! - `ProductRecord`: the canonical product written to a partition

mod category;
mod context;
mod record;

pub use category::CategoryPath;
pub use context::CrawlContext;
pub use record::ProductRecord;
