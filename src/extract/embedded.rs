//! Structured data embedded in product page scripts
//!
//! Some sites ship price, size and colour data as a JSON object passed to a
//! script call instead of rendering it into markup. The blob is located by a
//! marker string plus a capture pattern, its escaping is repaired, and the
//! wanted values are read from the parsed JSON.

use crate::config::EmbeddedBlobConfig;
use crate::extract::ExtractResult;
use crate::ConfigError;
use regex::{NoExpand, Regex};
use serde_json::Value;
use std::sync::OnceLock;

/// Compiled embedded-blob settings for one site
#[derive(Debug, Clone)]
pub struct EmbeddedBlob {
    marker: String,
    pattern: Regex,
    price_path: Vec<String>,
    variants_key: String,
    size_key: String,
    colour_key: String,
}

/// Values read from an embedded blob
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbeddedData {
    pub price: Vec<String>,
    pub sizes: Vec<String>,
    pub colours: Vec<String>,
}

impl EmbeddedBlob {
    /// Compiles a site's blob settings
    ///
    /// # Errors
    ///
    /// `ConfigError::Validation` for an empty marker, `InvalidPattern` when
    /// the pattern does not compile or has no capture group for the blob.
    pub fn from_config(config: &EmbeddedBlobConfig) -> Result<Self, ConfigError> {
        if config.script_marker.is_empty() {
            return Err(ConfigError::Validation(
                "embedded script-marker cannot be empty".to_string(),
            ));
        }

        let invalid = |message: String| ConfigError::InvalidPattern {
            pattern: config.pattern.clone(),
            message,
        };

        let pattern = Regex::new(&config.pattern).map_err(|e| invalid(e.to_string()))?;
        if pattern.captures_len() < 2 {
            return Err(invalid(
                "pattern needs a capture group for the blob".to_string(),
            ));
        }

        Ok(Self {
            marker: config.script_marker.clone(),
            pattern,
            price_path: config
                .price_path
                .split('.')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
            variants_key: config.variants_key.clone(),
            size_key: config.size_key.clone(),
            colour_key: config.colour_key.clone(),
        })
    }

    /// Marker identifying the script that carries the blob
    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Finds the raw blob among a page's script texts
    ///
    /// Returns the first capture of the pattern in the first script that
    /// contains the marker and matches.
    pub fn locate<'a>(&self, scripts: &'a [String]) -> Option<&'a str> {
        scripts
            .iter()
            .filter(|script| script.contains(&self.marker))
            .find_map(|script| {
                self.pattern
                    .captures(script)
                    .and_then(|captures| captures.get(1))
                    .map(|blob| blob.as_str())
            })
    }

    /// Repairs and parses a located blob
    pub fn parse(&self, blob: &str) -> ExtractResult<EmbeddedData> {
        let value: Value = serde_json::from_str(&repair_escapes(blob))?;

        let price = lookup(&value, &self.price_path)
            .map(scalar_values)
            .unwrap_or_default();

        let mut sizes = Vec::new();
        let mut colours: Vec<String> = Vec::new();

        if let Some(variants) = value.get(&self.variants_key).and_then(Value::as_array) {
            for variant in variants {
                if let Some(size) = variant.get(&self.size_key).and_then(scalar) {
                    sizes.push(size);
                }
                if let Some(colour) = variant.get(&self.colour_key).and_then(scalar) {
                    if !colours.contains(&colour) {
                        colours.push(colour);
                    }
                }
            }
        }

        Ok(EmbeddedData {
            price,
            sizes,
            colours,
        })
    }
}

/// Repairs the non-standard escaping found in embedded blobs
///
/// A run of backslashes before a double quote becomes a single escaped quote,
/// and any backslashes before an apostrophe are dropped.
///
/// # Examples
///
/// ```
/// use catalog_crawler::extract::repair_escapes;
///
/// assert_eq!(repair_escapes(r#"{"a":"5\\" heel"}"#), r#"{"a":"5\" heel"}"#);
/// assert_eq!(repair_escapes(r#"{"a":"Levi\'s"}"#), r#"{"a":"Levi's"}"#);
/// ```
pub fn repair_escapes(blob: &str) -> String {
    static QUOTE: OnceLock<Regex> = OnceLock::new();
    static APOSTROPHE: OnceLock<Regex> = OnceLock::new();

    let quote = QUOTE.get_or_init(|| Regex::new(r#"\\+""#).expect("static regex"));
    let apostrophe = APOSTROPHE.get_or_init(|| Regex::new(r"\\+'").expect("static regex"));

    let repaired = quote.replace_all(blob, NoExpand(r#"\""#));
    apostrophe.replace_all(&repaired, NoExpand("'")).into_owned()
}

fn lookup<'a>(value: &'a Value, path: &[String]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, key| current.get(key))
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn scalar_values(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(scalar).collect(),
        other => scalar(other).into_iter().collect(),
    }
}
