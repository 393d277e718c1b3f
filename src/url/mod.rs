//! URL handling module
//!
//! This module provides link resolution, query-string rewriting for
//! pagination, query stripping for image URLs, and request fingerprints
//! for duplicate filtering.

mod fingerprint;
mod query;
mod resolve;

pub use fingerprint::request_fingerprint;
pub use query::{strip_query, with_query_params};
pub use resolve::resolve_link;
