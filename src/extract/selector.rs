//! Selector service over parsed HTML
//!
//! Locators are CSS selectors with an optional Scrapy-style suffix:
//! - `::text` selects the direct text children of each match
//! - `::attr(name)` selects an attribute of each match
//! - no suffix selects the full text content of each match
//!
//! Every match is trimmed and blank matches are dropped.

use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};

/// What a locator returns from each matched element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// All descendant text, concatenated
    Text,
    /// Each direct text child separately
    OwnText,
    /// The value of the named attribute
    Attr(String),
}

/// A parsed, reusable locator
#[derive(Debug, Clone)]
pub struct Locator {
    selector: Selector,
    target: Target,
}

impl Locator {
    /// Parses a locator expression
    ///
    /// # Errors
    ///
    /// `ConfigError::InvalidLocator` for a malformed suffix or CSS selector.
    ///
    /// # Examples
    ///
    /// ```
    /// use catalog_crawler::extract::{Locator, Target};
    ///
    /// let locator = Locator::parse("li a::attr(href)").unwrap();
    /// assert_eq!(locator.target(), &Target::Attr("href".to_string()));
    /// ```
    pub fn parse(source: &str) -> Result<Self, ConfigError> {
        let source = source.trim();

        let (css, target) = if let Some(css) = source.strip_suffix("::text") {
            (css, Target::OwnText)
        } else if let Some(index) = source.find("::attr(") {
            let name = source[index + "::attr(".len()..]
                .strip_suffix(')')
                .map(str::trim)
                .filter(|name| !name.is_empty() && !name.contains(['(', ')']))
                .ok_or_else(|| invalid(source, "malformed ::attr(name) suffix"))?;
            (&source[..index], Target::Attr(name.to_string()))
        } else if source.contains("::") {
            return Err(invalid(source, "unsupported pseudo-element"));
        } else {
            (source, Target::Text)
        };

        let selector =
            Selector::parse(css.trim()).map_err(|e| invalid(source, format!("{:?}", e)))?;

        Ok(Self { selector, target })
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    fn collect(&self, element: ElementRef<'_>, out: &mut Vec<String>) {
        match &self.target {
            Target::Text => push_trimmed(out, &element.text().collect::<String>()),
            Target::OwnText => {
                for child in element.children() {
                    if let Some(text) = child.value().as_text() {
                        push_trimmed(out, text);
                    }
                }
            }
            Target::Attr(name) => {
                if let Some(value) = element.value().attr(name) {
                    push_trimmed(out, value);
                }
            }
        }
    }
}

fn invalid(source: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidLocator {
        locator: source.to_string(),
        message: message.into(),
    }
}

fn push_trimmed(out: &mut Vec<String>, value: &str) {
    let value = value.trim();
    if !value.is_empty() {
        out.push(value.to_string());
    }
}

/// Narrow query interface the traversal and assembler depend on
pub trait SelectorService {
    /// Returns every match of `locator` in document order
    fn select(&self, locator: &Locator) -> Vec<String>;
}

/// An HTML page parsed once and queried many times
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    pub fn parse(body: &str) -> Self {
        Self {
            html: Html::parse_document(body),
        }
    }
}

impl SelectorService for HtmlDocument {
    fn select(&self, locator: &Locator) -> Vec<String> {
        let mut matches = Vec::new();
        for element in self.html.select(&locator.selector) {
            locator.collect(element, &mut matches);
        }
        matches
    }
}
