use serde::Serialize;
use std::fmt;

/// Ordered sequence of category labels from root to leaf
///
/// Always holds at least one label. Labels are trimmed and keep their case,
/// e.g. `["Women", "Shoes", "Boots"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CategoryPath(Vec<String>);

impl CategoryPath {
    /// Builds a path from raw labels
    ///
    /// Labels are trimmed and blank labels dropped. Returns `None` when no
    /// label is left.
    pub fn new<I, S>(labels: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let labels: Vec<String> = labels
            .into_iter()
            .map(|label| label.as_ref().trim().to_string())
            .filter(|label| !label.is_empty())
            .collect();

        if labels.is_empty() {
            None
        } else {
            Some(Self(labels))
        }
    }

    /// All labels, root first
    pub fn labels(&self) -> &[String] {
        &self.0
    }

    /// Number of labels (never zero)
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; present for API symmetry with collections
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The deepest label
    pub fn leaf(&self) -> &str {
        &self.0[self.0.len() - 1]
    }

    /// Every label except the leaf
    pub fn ancestors(&self) -> &[String] {
        &self.0[..self.0.len() - 1]
    }
}

impl fmt::Display for CategoryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" / "))
    }
}
