use serde::Deserialize;
use std::collections::BTreeMap;

/// Main configuration structure for the catalog crawler
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default, rename = "site")]
    pub sites: Vec<SiteConfig>,
}

impl Config {
    /// Looks up a site by name
    pub fn site(&self, name: &str) -> Option<&SiteConfig> {
        self.sites.iter().find(|site| site.name == name)
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of fetches in flight at once
    #[serde(rename = "max-concurrent-requests")]
    pub max_concurrent_requests: u32,

    /// Minimum time between two dispatched requests (milliseconds)
    #[serde(rename = "download-delay", default)]
    pub download_delay: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Drop requests for URLs already requested during the run
    #[serde(rename = "dedupe-requests", default)]
    pub dedupe_requests: bool,
}

fn default_request_timeout() -> u64 {
    30
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `CrawlerName/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Root directory under which per-site partitions are written
    #[serde(rename = "root-dir", default = "default_root_dir")]
    pub root_dir: String,

    /// Text encoding of exported lines; unset means ASCII-escaped JSON
    #[serde(default)]
    pub encoding: Option<String>,
}

fn default_root_dir() -> String {
    "scraped_data".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            encoding: None,
        }
    }
}

/// A single catalog site to crawl
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SiteConfig {
    /// Site name, used as the top-level partition directory
    pub name: String,

    /// URLs the traversal starts from
    pub start_urls: Vec<String>,

    /// How category and listing pages are walked
    pub traversal: TraversalConfig,

    /// Locators for product page fields
    pub product: ProductSelectors,
}

/// Traversal variant with its listing locators
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "variant", rename_all = "kebab-case")]
pub enum TraversalConfig {
    /// Fixed fan-out tree descent: start -> categories -> products
    Tree(TreeTraversal),
    /// Paginated listing grid with an explicit page counter
    Grid(GridTraversal),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TreeTraversal {
    /// Locator for category links on the start page
    pub category_links: String,

    /// Locator for product links on a category page
    pub product_links: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GridTraversal {
    /// Locator for category links on the start page
    pub category_links: String,

    /// Locator for the labels identifying a listing page's category
    pub category_indicator: String,

    /// Locator for product tile links on a listing page
    pub product_links: String,

    /// Query parameter carrying the page counter
    #[serde(default = "default_page_param")]
    pub page_param: String,

    /// Query parameters set on every listing request (e.g. `top = "4"`)
    #[serde(default)]
    pub fixed_params: BTreeMap<String, String>,
}

fn default_page_param() -> String {
    "page".to_string()
}

/// Locators for product page fields
///
/// A missing locator means the field is not extracted from markup.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProductSelectors {
    pub article_type: Option<String>,
    pub product_name: Option<String>,
    pub brand_name: Option<String>,
    pub price: Option<String>,
    pub fit: Option<String>,
    pub width: Option<String>,
    pub colors: Option<String>,
    pub size_info: Option<String>,
    pub details_and_care_info: Option<String>,
    pub details_and_care_list: Option<String>,
    pub image_urls: Option<String>,

    /// Structured data blob embedded in a script tag
    pub embedded: Option<EmbeddedBlobConfig>,
}

/// Settings for reading price, sizes and colours from an embedded JSON blob
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EmbeddedBlobConfig {
    /// Text that identifies the script holding the blob
    pub script_marker: String,

    /// Regex whose first capture group is the blob
    pub pattern: String,

    /// Dotted path to the price value
    #[serde(default = "default_price_path")]
    pub price_path: String,

    /// Key of the variants array
    #[serde(default = "default_variants_key")]
    pub variants_key: String,

    /// Key of the size inside a variant
    #[serde(default = "default_size_key")]
    pub size_key: String,

    /// Key of the colour inside a variant
    #[serde(default = "default_colour_key")]
    pub colour_key: String,
}

fn default_price_path() -> String {
    "price.current".to_string()
}

fn default_variants_key() -> String {
    "variants".to_string()
}

fn default_size_key() -> String {
    "size".to_string()
}

fn default_colour_key() -> String {
    "colour".to_string()
}
