//! Export router
//!
//! Routes each record to the partition file of its category path. Partition
//! files are opened lazily in append mode and stay open until the router is
//! closed. Writes to one partition are serialized by that partition's async
//! mutex; writes to different partitions do not wait on each other.

use crate::model::ProductRecord;
use crate::output::{to_json_line, ExportError, ExportResult, LineEncoding, PartitionPath};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// An open partition file
struct PartitionWriter {
    path: PathBuf,
    file: File,
    /// File length after the last complete line
    len: u64,
    lines: u64,
}

impl PartitionWriter {
    async fn open(partition: &PartitionPath) -> ExportResult<Self> {
        let path = partition.file_path();

        fs::create_dir_all(partition.directory())
            .await
            .map_err(|e| ExportError::io(partition.directory(), e))?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| ExportError::io(&path, e))?;

        let len = file
            .metadata()
            .await
            .map_err(|e| ExportError::io(&path, e))?
            .len();

        Ok(Self {
            path,
            file,
            len,
            lines: 0,
        })
    }

    /// Appends one complete line
    ///
    /// On failure the file is truncated back to its previous length so no
    /// partial line is left behind.
    async fn append(&mut self, line: &[u8]) -> ExportResult<()> {
        let written = async {
            self.file.write_all(line).await?;
            self.file.flush().await
        }
        .await;

        match written {
            Ok(()) => {
                self.len += line.len() as u64;
                self.lines += 1;
                Ok(())
            }
            Err(e) => {
                if let Err(rollback) = self.file.set_len(self.len).await {
                    tracing::warn!(
                        "Failed to roll back {} after write error: {}",
                        self.path.display(),
                        rollback
                    );
                }
                Err(ExportError::io(&self.path, e))
            }
        }
    }

    async fn close(mut self) -> ExportResult<ClosedPartition> {
        self.file
            .flush()
            .await
            .map_err(|e| ExportError::io(&self.path, e))?;
        self.file
            .sync_all()
            .await
            .map_err(|e| ExportError::io(&self.path, e))?;

        Ok(ClosedPartition {
            path: self.path,
            lines: self.lines,
        })
    }
}

/// A partition file released at the end of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedPartition {
    pub path: PathBuf,
    /// Lines appended during this run
    pub lines: u64,
}

/// Routes records of one site to their partition files
pub struct ExportRouter {
    root: PathBuf,
    site: String,
    encoding: LineEncoding,
    partitions: Mutex<HashMap<PathBuf, Arc<Mutex<PartitionWriter>>>>,
}

impl ExportRouter {
    /// Creates a router writing below `root/site`
    pub fn new(root: impl Into<PathBuf>, site: impl Into<String>, encoding: LineEncoding) -> Self {
        Self {
            root: root.into(),
            site: site.into(),
            encoding,
            partitions: Mutex::new(HashMap::new()),
        }
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    /// Appends a record to its partition
    ///
    /// # Returns
    ///
    /// The partition the record was written to
    pub async fn route(&self, record: &ProductRecord) -> ExportResult<PartitionPath> {
        let partition = PartitionPath::new(&self.root, &self.site, &record.article_type)?;
        let line = to_json_line(record, self.encoding)?;

        let writer = self.writer(&partition).await?;
        writer.lock().await.append(&line).await?;

        Ok(partition)
    }

    /// Returns the open writer of a partition, opening it on first use
    async fn writer(&self, partition: &PartitionPath) -> ExportResult<Arc<Mutex<PartitionWriter>>> {
        let path = partition.file_path();
        let mut partitions = self.partitions.lock().await;

        if let Some(writer) = partitions.get(&path) {
            return Ok(Arc::clone(writer));
        }

        tracing::debug!("Opening partition {}", path.display());
        let writer = Arc::new(Mutex::new(PartitionWriter::open(partition).await?));
        partitions.insert(path, Arc::clone(&writer));
        Ok(writer)
    }

    /// Number of partitions currently open
    pub async fn open_partitions(&self) -> usize {
        self.partitions.lock().await.len()
    }

    /// Flushes and closes every open partition
    ///
    /// All partitions are closed even if some fail; the first failure is
    /// returned after the rest were attempted.
    pub async fn close(&self) -> ExportResult<Vec<ClosedPartition>> {
        let drained: Vec<_> = self.partitions.lock().await.drain().collect();

        let mut closed = Vec::with_capacity(drained.len());
        let mut first_error = None;

        for (path, writer) in drained {
            // Wait for any in-progress append before taking the file
            let writer = match Arc::try_unwrap(writer) {
                Ok(writer) => writer.into_inner(),
                Err(shared) => {
                    let mut guard = shared.lock().await;
                    if let Err(e) = guard.file.flush().await {
                        first_error.get_or_insert(ExportError::io(&path, e));
                    }
                    closed.push(ClosedPartition {
                        path,
                        lines: guard.lines,
                    });
                    continue;
                }
            };

            match writer.close().await {
                Ok(partition) => closed.push(partition),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        closed.sort_by(|a, b| a.path.cmp(&b.path));

        match first_error {
            Some(e) => Err(e),
            None => Ok(closed),
        }
    }
}
