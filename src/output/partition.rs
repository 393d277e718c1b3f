use crate::model::CategoryPath;
use crate::output::{ExportError, ExportResult};
use std::path::{Path, PathBuf};

/// File extension of partition files
const EXTENSION: &str = "jl";

/// Location of one output partition
///
/// For a category path `P` of a site `S` under root `R`:
/// - `|P| == 1`: directory `R/S`, file `P[0]`
/// - otherwise: directory `R/S/P[0]/.../P[-2]`, file `P[-1]`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartitionPath {
    directory: PathBuf,
    file_name: String,
}

impl PartitionPath {
    /// Computes the partition of a category path
    ///
    /// Labels are used as path components after replacing path separators,
    /// so a label can never escape its parent directory.
    ///
    /// # Examples
    ///
    /// ```
    /// use catalog_crawler::model::CategoryPath;
    /// use catalog_crawler::output::PartitionPath;
    /// use std::path::Path;
    ///
    /// let path = CategoryPath::new(["a", "b", "c"]).unwrap();
    /// let partition = PartitionPath::new(Path::new("scraped_data"), "acme", &path).unwrap();
    ///
    /// assert_eq!(partition.directory(), Path::new("scraped_data/acme/a/b"));
    /// assert_eq!(partition.file_name(), "c");
    /// ```
    pub fn new(root: &Path, site: &str, category_path: &CategoryPath) -> ExportResult<Self> {
        let site = site.trim();
        if site.is_empty() {
            return Err(ExportError::InvalidPartition(
                "site name is empty".to_string(),
            ));
        }

        let mut directory = root.join(sanitize_label(site));
        for label in category_path.ancestors() {
            directory.push(sanitize_label(label));
        }

        Ok(Self {
            directory,
            file_name: sanitize_label(category_path.leaf()),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// File stem of the partition, without extension
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Full path of the partition file
    pub fn file_path(&self) -> PathBuf {
        self.directory
            .join(format!("{}.{}", self.file_name, EXTENSION))
    }
}

fn sanitize_label(label: &str) -> String {
    match label {
        "." | ".." => "_".to_string(),
        _ => label.replace(['/', '\\'], "-"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partition(labels: &[&str]) -> PartitionPath {
        PartitionPath::new(
            Path::new("scraped_data"),
            "acme",
            &CategoryPath::new(labels).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_single_label() {
        let partition = partition(&["a"]);
        assert_eq!(partition.directory(), Path::new("scraped_data/acme"));
        assert_eq!(partition.file_name(), "a");
        assert_eq!(partition.file_path(), Path::new("scraped_data/acme/a.jl"));
    }

    #[test]
    fn test_nested_labels() {
        let partition = partition(&["a", "b", "c"]);
        assert_eq!(partition.directory(), Path::new("scraped_data/acme/a/b"));
        assert_eq!(partition.file_name(), "c");
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(partition(&["Women", "Shoes"]), partition(&["Women", "Shoes"]));
        assert_ne!(partition(&["Women", "Shoes"]), partition(&["Men", "Shoes"]));
    }

    #[test]
    fn test_labels_cannot_escape() {
        let partition = partition(&["..", "Tops/Tees", "a\\b"]);
        assert_eq!(
            partition.directory(),
            Path::new("scraped_data/acme/_/Tops-Tees")
        );
        assert_eq!(partition.file_name(), "a-b");
    }

    #[test]
    fn test_labels_keep_case_and_spaces() {
        let partition = partition(&["Women", "Dresses & Skirts"]);
        assert_eq!(partition.file_name(), "Dresses & Skirts");
    }

    #[test]
    fn test_empty_site_rejected() {
        let result = PartitionPath::new(
            Path::new("out"),
            " ",
            &CategoryPath::new(["a"]).unwrap(),
        );
        assert!(matches!(result, Err(ExportError::InvalidPartition(_))));
    }
}
