//! Record sink trait
//!
//! A sink receives every record of a run as soon as it is assembled. The
//! coordinator calls the start hook once before the first fetch and the end
//! hook once after the last page, whether the run finished or was stopped.

use crate::model::ProductRecord;
use crate::output::ExportResult;
use async_trait::async_trait;

/// Consumer of the records produced by a crawl run
///
/// Implementations must be safe to call from concurrent page tasks.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Prepares the sink for a run of the named site
    async fn on_run_start(&self, site: &str) -> ExportResult<()>;

    /// Consumes one record
    async fn process_record(&self, record: ProductRecord) -> ExportResult<()>;

    /// Flushes and releases everything the run opened
    async fn on_run_end(&self) -> ExportResult<()>;
}
