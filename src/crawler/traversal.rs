//! Traversal engine
//!
//! Each site is crawled with one of two strategies:
//! - Tree descent: start page, category pages, product pages. Every request
//!   carries an empty context and the category path comes from the product
//!   page itself.
//! - Paginated grid: start page, listing pages requested with a page counter,
//!   product pages. The listing's category indicators become the product's
//!   category path and the next page is requested until a page has no
//!   products.
//!
//! Handlers are pure functions of the page and the request that fetched it.
//! They return follow-up requests instead of touching the scheduler.

use crate::config::{GridTraversal, SiteConfig, TraversalConfig, TreeTraversal};
use crate::crawler::{Callback, FetchRequest};
use crate::extract::{
    ExtractError, ExtractResult, Locator, RecordAssembler, SelectorService,
};
use crate::model::{CategoryPath, CrawlContext, ProductRecord};
use crate::url::{resolve_link, with_query_params};
use crate::{ConfigError, Result};
use tracing::debug;
use url::Url;

/// What handling one page produced
#[derive(Debug, Default)]
pub struct PageOutcome {
    /// Follow-up requests, in discovery order
    pub requests: Vec<FetchRequest>,
    /// The record built from a product page
    pub record: Option<ProductRecord>,
    /// Set when a listing page ended its pagination branch
    pub exhausted: bool,
}

impl PageOutcome {
    fn follow(requests: Vec<FetchRequest>) -> Self {
        Self {
            requests,
            ..Self::default()
        }
    }
}

/// Tree descent locators
#[derive(Debug, Clone)]
pub struct TreeDescent {
    category_links: Locator,
    product_links: Locator,
}

/// Paginated grid locators and listing parameters
#[derive(Debug, Clone)]
pub struct PaginatedGrid {
    category_links: Locator,
    category_indicator: Locator,
    product_links: Locator,
    page_param: String,
    fixed_params: Vec<(String, String)>,
}

/// Traversal strategy of a site
#[derive(Debug, Clone)]
pub enum Traversal {
    Tree(TreeDescent),
    Grid(PaginatedGrid),
}

/// A site's configuration compiled for crawling
#[derive(Debug, Clone)]
pub struct SiteProfile {
    name: String,
    start_urls: Vec<Url>,
    traversal: Traversal,
    assembler: RecordAssembler,
}

impl SiteProfile {
    /// Compiles locators, patterns and start URLs of a site
    pub fn compile(config: &SiteConfig) -> Result<Self> {
        let start_urls = config
            .start_urls
            .iter()
            .map(|url| Url::parse(url))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let traversal = match &config.traversal {
            TraversalConfig::Tree(tree) => Traversal::Tree(TreeDescent::compile(tree)?),
            TraversalConfig::Grid(grid) => Traversal::Grid(PaginatedGrid::compile(grid)?),
        };

        Ok(Self {
            name: config.name.clone(),
            start_urls,
            traversal,
            assembler: RecordAssembler::from_config(&config.product)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Initial requests of a crawl, one per start URL
    pub fn start_requests(&self) -> Vec<FetchRequest> {
        self.start_urls
            .iter()
            .cloned()
            .map(FetchRequest::start)
            .collect()
    }

    /// Dispatches a fetched page to the handler named by its request
    ///
    /// # Arguments
    ///
    /// * `page` - Selector service over the fetched page
    /// * `page_url` - Final URL of the page, used to resolve relative links
    /// * `request` - The request that fetched the page
    pub fn handle(
        &self,
        page: &dyn SelectorService,
        page_url: &Url,
        request: &FetchRequest,
    ) -> ExtractResult<PageOutcome> {
        match request.callback {
            Callback::Product => {
                let record = self.assembler.assemble(page, page_url, &request.context)?;
                Ok(PageOutcome {
                    record: Some(record),
                    ..PageOutcome::default()
                })
            }
            Callback::Start => Ok(self.traversal.start(page, page_url)),
            Callback::Listing => self.traversal.listing(page, page_url, &request.context),
        }
    }
}

impl Traversal {
    fn start(&self, page: &dyn SelectorService, page_url: &Url) -> PageOutcome {
        match self {
            Self::Tree(tree) => tree.start(page, page_url),
            Self::Grid(grid) => grid.start(page, page_url),
        }
    }

    fn listing(
        &self,
        page: &dyn SelectorService,
        page_url: &Url,
        context: &CrawlContext,
    ) -> ExtractResult<PageOutcome> {
        match self {
            Self::Tree(tree) => Ok(tree.listing(page, page_url)),
            Self::Grid(grid) => grid.listing(page, page_url, context),
        }
    }
}

impl TreeDescent {
    fn compile(config: &TreeTraversal) -> std::result::Result<Self, ConfigError> {
        Ok(Self {
            category_links: Locator::parse(&config.category_links)?,
            product_links: Locator::parse(&config.product_links)?,
        })
    }

    fn start(&self, page: &dyn SelectorService, page_url: &Url) -> PageOutcome {
        let requests = links(page, &self.category_links, page_url)
            .into_iter()
            .map(|url| FetchRequest::new(url, CrawlContext::root(), Callback::Listing))
            .collect();
        PageOutcome::follow(requests)
    }

    fn listing(&self, page: &dyn SelectorService, page_url: &Url) -> PageOutcome {
        let requests = links(page, &self.product_links, page_url)
            .into_iter()
            .map(|url| FetchRequest::new(url, CrawlContext::root(), Callback::Product))
            .collect();
        PageOutcome::follow(requests)
    }
}

impl PaginatedGrid {
    fn compile(config: &GridTraversal) -> std::result::Result<Self, ConfigError> {
        Ok(Self {
            category_links: Locator::parse(&config.category_links)?,
            category_indicator: Locator::parse(&config.category_indicator)?,
            product_links: Locator::parse(&config.product_links)?,
            page_param: config.page_param.clone(),
            fixed_params: config
                .fixed_params
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        })
    }

    /// Listing URL for a given page of a branch
    fn page_url(&self, url: &Url, page: u32) -> Url {
        let mut params = self.fixed_params.clone();
        params.push((self.page_param.clone(), page.to_string()));
        with_query_params(url, &params)
    }

    fn start(&self, page: &dyn SelectorService, page_url: &Url) -> PageOutcome {
        let context = CrawlContext::first_page();
        let requests = links(page, &self.category_links, page_url)
            .into_iter()
            .map(|url| {
                FetchRequest::new(
                    self.page_url(&url, context.current_page()),
                    context.clone(),
                    Callback::Listing,
                )
            })
            .collect();
        PageOutcome::follow(requests)
    }

    fn listing(
        &self,
        page: &dyn SelectorService,
        page_url: &Url,
        context: &CrawlContext,
    ) -> ExtractResult<PageOutcome> {
        let category_path = CategoryPath::new(page.select(&self.category_indicator))
            .ok_or(ExtractError::NotGridPage)?;

        let products = links(page, &self.product_links, page_url);
        if products.is_empty() {
            debug!(
                url = %page_url,
                category = %category_path,
                page = context.current_page(),
                "Listing exhausted"
            );
            return Ok(PageOutcome {
                exhausted: true,
                ..PageOutcome::default()
            });
        }

        let mut requests: Vec<FetchRequest> = products
            .into_iter()
            .map(|url| {
                FetchRequest::new(
                    url,
                    CrawlContext::for_product(category_path.clone()),
                    Callback::Product,
                )
            })
            .collect();

        let next = context.next_page();
        requests.push(FetchRequest::new(
            self.page_url(page_url, next.current_page()),
            next,
            Callback::Listing,
        ));

        Ok(PageOutcome::follow(requests))
    }
}

/// Resolves every match of a link locator against the page URL
fn links(page: &dyn SelectorService, locator: &Locator, page_url: &Url) -> Vec<Url> {
    page.select(locator)
        .iter()
        .filter_map(|href| resolve_link(href, page_url))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ProductSelectors, TraversalConfig};
    use crate::extract::HtmlDocument;
    use std::collections::BTreeMap;

    fn grid_site() -> SiteProfile {
        let mut fixed_params = BTreeMap::new();
        fixed_params.insert("top".to_string(), "4".to_string());

        SiteProfile::compile(&SiteConfig {
            name: "acme".to_string(),
            start_urls: vec!["https://shop.example.com/".to_string()],
            traversal: TraversalConfig::Grid(GridTraversal {
                category_links: "nav a.category::attr(href)".to_string(),
                category_indicator: "nav.breadcrumb li::text".to_string(),
                product_links: "article.tile a::attr(href)".to_string(),
                page_param: "page".to_string(),
                fixed_params,
            }),
            product: ProductSelectors {
                product_name: Some("h1::text".to_string()),
                ..Default::default()
            },
        })
        .unwrap()
    }

    fn tree_site() -> SiteProfile {
        SiteProfile::compile(&SiteConfig {
            name: "outlet".to_string(),
            start_urls: vec!["https://outlet.example.com/".to_string()],
            traversal: TraversalConfig::Tree(TreeTraversal {
                category_links: "ul.menu a::attr(href)".to_string(),
                product_links: "article a::attr(href)".to_string(),
            }),
            product: ProductSelectors {
                article_type: Some("ol.crumbs li::text".to_string()),
                product_name: Some("h1::text".to_string()),
                ..Default::default()
            },
        })
        .unwrap()
    }

    fn listing_request(url: &str, context: CrawlContext) -> FetchRequest {
        FetchRequest::new(Url::parse(url).unwrap(), context, Callback::Listing)
    }

    fn handle(site: &SiteProfile, html: &str, request: &FetchRequest) -> ExtractResult<PageOutcome> {
        site.handle(&HtmlDocument::parse(html), &request.url, request)
    }

    #[test]
    fn test_start_requests() {
        let requests = grid_site().start_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].callback, Callback::Start);
        assert_eq!(requests[0].context, CrawlContext::root());
    }

    #[test]
    fn test_grid_start_fans_out_with_fixed_params() {
        let site = grid_site();
        let html = r#"
            <nav>
                <a class="category" href="/c/women-shoes">Shoes</a>
                <a class="category" href="/c/women-dresses?sort=new">Dresses</a>
            </nav>"#;
        let request = FetchRequest::start(Url::parse("https://shop.example.com/").unwrap());

        let outcome = handle(&site, html, &request).unwrap();

        let urls: Vec<String> = outcome.requests.iter().map(|r| r.url.to_string()).collect();
        assert_eq!(
            urls,
            vec![
                "https://shop.example.com/c/women-shoes?top=4&page=1",
                "https://shop.example.com/c/women-dresses?sort=new&top=4&page=1",
            ]
        );
        for request in &outcome.requests {
            assert_eq!(request.callback, Callback::Listing);
            assert_eq!(request.context.page(), Some(1));
        }
    }

    #[test]
    fn test_grid_listing_requests_products_and_next_page() {
        let site = grid_site();
        let html = r#"
            <nav class="breadcrumb"><ul><li>Women</li><li>Shoes</li></ul></nav>
            <article class="tile"><a href="/p/1">One</a></article>
            <article class="tile"><a href="https://shop.example.com/p/2">Two</a></article>"#;
        let request = listing_request(
            "https://shop.example.com/c/women-shoes?top=4&page=3",
            CrawlContext::first_page().next_page().next_page(),
        );

        let outcome = handle(&site, html, &request).unwrap();
        assert!(!outcome.exhausted);
        assert_eq!(outcome.requests.len(), 3);

        let path = CategoryPath::new(["Women", "Shoes"]).unwrap();
        for product in &outcome.requests[..2] {
            assert_eq!(product.callback, Callback::Product);
            assert_eq!(product.context.category_path(), Some(&path));
        }
        assert_eq!(outcome.requests[0].url.as_str(), "https://shop.example.com/p/1");

        let next = &outcome.requests[2];
        assert_eq!(next.callback, Callback::Listing);
        assert_eq!(next.context.page(), Some(4));
        assert_eq!(
            next.url.as_str(),
            "https://shop.example.com/c/women-shoes?top=4&page=4"
        );
    }

    #[test]
    fn test_grid_listing_without_products_is_exhausted() {
        let site = grid_site();
        let html = r#"<nav class="breadcrumb"><ul><li>Women</li></ul></nav><p>No results</p>"#;
        let request = listing_request(
            "https://shop.example.com/c/women?top=4&page=7",
            CrawlContext::first_page(),
        );

        let outcome = handle(&site, html, &request).unwrap();
        assert!(outcome.exhausted);
        assert!(outcome.requests.is_empty());
        assert!(outcome.record.is_none());
    }

    #[test]
    fn test_grid_listing_without_indicator_is_skipped() {
        let site = grid_site();
        let html = r#"<article class="tile"><a href="/p/1">One</a></article>"#;
        let request = listing_request("https://shop.example.com/promo", CrawlContext::first_page());

        let err = handle(&site, html, &request).unwrap_err();
        assert!(matches!(err, ExtractError::NotGridPage));
        assert!(err.is_skip());
    }

    #[test]
    fn test_tree_descent() {
        let site = tree_site();
        let start = FetchRequest::start(Url::parse("https://outlet.example.com/").unwrap());
        let outcome = handle(
            &site,
            r#"<ul class="menu"><li><a href="/women">Women</a></li></ul>"#,
            &start,
        )
        .unwrap();

        assert_eq!(outcome.requests.len(), 1);
        let category = &outcome.requests[0];
        assert_eq!(category.url.as_str(), "https://outlet.example.com/women");
        assert_eq!(category.callback, Callback::Listing);
        assert_eq!(category.context, CrawlContext::root());

        let outcome = handle(
            &site,
            r#"<article><a href="p/9">Nine</a></article><article><a href="p/10">Ten</a></article>"#,
            category,
        )
        .unwrap();

        let urls: Vec<&str> = outcome.requests.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://outlet.example.com/p/9", "https://outlet.example.com/p/10"]
        );
        assert!(outcome
            .requests
            .iter()
            .all(|r| r.callback == Callback::Product && r.context == CrawlContext::root()));
    }

    #[test]
    fn test_tree_page_without_links_ends_branch() {
        let site = tree_site();
        let request = listing_request("https://outlet.example.com/empty", CrawlContext::root());

        let outcome = handle(&site, "<html></html>", &request).unwrap();
        assert!(outcome.requests.is_empty());
        assert!(!outcome.exhausted);
    }

    #[test]
    fn test_product_page_builds_record() {
        let site = tree_site();
        let request = FetchRequest::new(
            Url::parse("https://outlet.example.com/p/9").unwrap(),
            CrawlContext::root(),
            Callback::Product,
        );
        let html = r#"<ol class="crumbs"><li>Home</li><li>Bags</li></ol><h1>Tote</h1>"#;

        let outcome = handle(&site, html, &request).unwrap();
        let record = outcome.record.unwrap();

        assert_eq!(record.article_type.labels(), ["Bags"]);
        assert_eq!(record.product_name.as_deref(), Some("Tote"));
        assert_eq!(record.product_url, "https://outlet.example.com/p/9");
        assert!(outcome.requests.is_empty());
    }
}
