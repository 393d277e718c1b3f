use crate::config::OutputConfig;
use crate::model::ProductRecord;
use crate::output::{ExportError, ExportResult, ExportRouter, LineEncoding, RecordSink};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Record sink that writes each record to its partition file
///
/// The router exists only between the start and end hooks. Records are
/// written as they arrive; nothing is buffered across the run.
pub struct PartitionPipeline {
    root: PathBuf,
    encoding: LineEncoding,
    router: Mutex<Option<Arc<ExportRouter>>>,
}

impl PartitionPipeline {
    pub fn new(root: impl Into<PathBuf>, encoding: LineEncoding) -> Self {
        Self {
            root: root.into(),
            encoding,
            router: Mutex::new(None),
        }
    }

    pub fn from_config(config: &OutputConfig) -> ExportResult<Self> {
        Ok(Self::new(
            &config.root_dir,
            LineEncoding::from_config(config.encoding.as_deref())?,
        ))
    }

    async fn router(&self) -> ExportResult<Arc<ExportRouter>> {
        self.router
            .lock()
            .await
            .as_ref()
            .map(Arc::clone)
            .ok_or(ExportError::NotOpen)
    }
}

#[async_trait]
impl RecordSink for PartitionPipeline {
    async fn on_run_start(&self, site: &str) -> ExportResult<()> {
        let mut slot = self.router.lock().await;
        if let Some(previous) = slot.take() {
            previous.close().await?;
        }

        debug!(
            "Export router ready for '{}' under {}",
            site,
            self.root.display()
        );
        *slot = Some(Arc::new(ExportRouter::new(&self.root, site, self.encoding)));
        Ok(())
    }

    async fn process_record(&self, record: ProductRecord) -> ExportResult<()> {
        let partition = self.router().await?.route(&record).await?;
        debug!(
            url = %record.product_url,
            partition = %partition.file_path().display(),
            "Exported record"
        );
        Ok(())
    }

    async fn on_run_end(&self) -> ExportResult<()> {
        let Some(router) = self.router.lock().await.take() else {
            return Ok(());
        };

        let closed = router.close().await?;
        let lines: u64 = closed.iter().map(|partition| partition.lines).sum();
        info!(
            "Closed {} partition(s) for '{}', {} line(s) written",
            closed.len(),
            router.site(),
            lines
        );
        Ok(())
    }
}
