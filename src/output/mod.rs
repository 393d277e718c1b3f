//! Output module for exporting product records
//!
//! This module handles:
//! - Mapping a record's category path to a partition file
//! - JSON line serialization with the configured text encoding
//! - Append-only writes, serialized per partition
//! - The run-scoped pipeline that owns the open partitions
//! - Crawl statistics and the end-of-run summary

mod json;
mod partition;
mod pipeline;
mod router;
pub mod stats;
mod traits;

pub use json::{to_json_line, LineEncoding, LINE_SEPARATOR};
pub use partition::PartitionPath;
pub use pipeline::PartitionPipeline;
pub use router::{ClosedPartition, ExportRouter};
pub use stats::{print_statistics, CrawlStats, RunSummary, StatsSnapshot};
pub use traits::RecordSink;

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while exporting records
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid partition: {0}")]
    InvalidPartition(String),

    #[error("Unsupported output encoding '{0}'")]
    UnsupportedEncoding(String),

    #[error("Export pipeline is not open")]
    NotOpen,
}

impl ExportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for export operations
pub type ExportResult<T> = Result<T, ExportError>;
