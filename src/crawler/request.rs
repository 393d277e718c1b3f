use crate::model::CrawlContext;
use url::Url;

/// Which page handler a fetched page is passed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Callback {
    /// A start page listing top-level categories
    Start,
    /// A category or listing grid page
    Listing,
    /// A product detail page
    Product,
}

/// A pending fetch and everything needed to handle its page
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub url: Url,
    pub context: CrawlContext,
    pub callback: Callback,
}

impl FetchRequest {
    pub fn new(url: Url, context: CrawlContext, callback: Callback) -> Self {
        Self {
            url,
            context,
            callback,
        }
    }

    /// A request for a site's start page
    pub fn start(url: Url) -> Self {
        Self::new(url, CrawlContext::root(), Callback::Start)
    }
}
