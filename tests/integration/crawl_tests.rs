//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock catalog sites and test the full
//! crawl cycle end-to-end, from start page to partition files on disk.

use catalog_crawler::config::{parse_config, Config};
use catalog_crawler::crawler::crawl;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration for one site served by `base_url`
fn create_test_config(root_dir: &Path, site: &str) -> Config {
    let content = format!(
        r#"
[crawler]
max-concurrent-requests = 4
download-delay = 0
request-timeout = 5

[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"
contact-email = "test@example.com"

[output]
root-dir = '{}'

{}
"#,
        root_dir.display(),
        site
    );
    parse_config(&content).expect("Failed to parse test config")
}

fn grid_site(base_url: &str) -> String {
    format!(
        r#"
[[site]]
name = "acme"
start-urls = ["{}/"]

[site.traversal]
variant = "grid"
category-links = "nav a.category::attr(href)"
category-indicator = "ol.breadcrumb li::text"
product-links = "article.tile a::attr(href)"
fixed-params = {{ top = "4" }}

[site.product]
product-name = "h1::text"
brand-name = "a.brand::text"
price = "div.price::text"
image-urls = "img.gallery::attr(src)"
"#,
        base_url
    )
}

fn tree_site(base_url: &str) -> String {
    format!(
        r#"
[[site]]
name = "outlet"
start-urls = ["{}/"]

[site.traversal]
variant = "tree"
category-links = "ul.menu a::attr(href)"
product-links = "article a::attr(href)"

[site.product]
article-type = "ol.crumbs li::text"
product-name = "h1::text"

[site.product.embedded]
script-marker = "Pages/FullProduct"
pattern = "view\\('(\\{{.*\\}})',"
"#,
        base_url
    )
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

async fn mount_grid_site(server: &MockServer) {
    let crumbs = r#"<ol class="breadcrumb"><li>Women</li><li>Shoes</li></ol>"#;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<nav>
                <a class="category" href="/c/shoes">Shoes</a>
                <a class="category" href="/c/promo">Promo</a>
            </nav>"#,
        ))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/c/shoes"))
        .and(query_param("top", "4"))
        .and(query_param("page", "1"))
        .respond_with(html(&format!(
            r#"{}
            <article class="tile"><a href="/p/1">Runner</a></article>
            <article class="tile"><a href="/p/2">Loafer</a></article>"#,
            crumbs
        )))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/c/shoes"))
        .and(query_param("top", "4"))
        .and(query_param("page", "2"))
        .respond_with(html(&format!("{}<p>No more results</p>", crumbs)))
        .mount(server)
        .await;

    // A landing page without category indicators
    Mock::given(method("GET"))
        .and(path("/c/promo"))
        .respond_with(html(r#"<article class="tile"><a href="/p/9">Gift</a></article>"#))
        .mount(server)
        .await;

    for (id, name, price) in [("1", "Runner", "$25.00"), ("2", "Loafer", "$60.00")] {
        Mock::given(method("GET"))
            .and(path(format!("/p/{}", id)))
            .respond_with(html(&format!(
                r#"<h1>{}</h1>
                <a class="brand">Acme</a>
                <div class="price">{}</div>
                <img class="gallery" src="https://img.acme.test/{}.jpg?w=400">"#,
                name, price, id
            )))
            .mount(server)
            .await;
    }
}

async fn mount_tree_site(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<ul class="menu"><li><a href="/women/dresses">Dresses</a></li></ul>"#,
        ))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/women/dresses"))
        .respond_with(html(
            r#"<article><a href="/prd/1">Midi</a></article>
            <article><a href="/prd/2">Maxi</a></article>
            <article><a href="/prd/3">Gone</a></article>"#,
        ))
        .mount(server)
        .await;

    let crumbs = r#"<ol class="crumbs"><li>Home</li><li>Women</li><li>Dresses</li></ol>"#;

    Mock::given(method("GET"))
        .and(path("/prd/1"))
        .respond_with(html(&format!(
            r#"{}<h1>Robe Café</h1>
            <script>require(['Pages/FullProduct'], function (p) {{ p.view('{{"price":{{"current":"£35.00"}},"variants":[{{"size":"UK 8","colour":"Red"}},{{"size":"UK 10","colour":"Red"}}]}}', 'gb'); }});</script>"#,
            crumbs
        )))
        .mount(server)
        .await;

    // Product page without the embedded blob
    Mock::given(method("GET"))
        .and(path("/prd/2"))
        .respond_with(html(&format!("{}<h1>Maxi</h1>", crumbs)))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/prd/3"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
}

fn read_lines(path: &Path) -> Vec<serde_json::Value> {
    std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e))
        .lines()
        .map(|line| serde_json::from_str(line).expect("Invalid JSON line"))
        .collect()
}

#[tokio::test]
async fn test_grid_site_crawl() {
    let server = MockServer::start().await;
    mount_grid_site(&server).await;

    let output = TempDir::new().unwrap();
    let config = create_test_config(output.path(), &grid_site(&server.uri()));

    let summaries = crawl(&config, &[]).await.expect("Crawl failed");
    assert_eq!(summaries.len(), 1);

    let stats = summaries[0].stats;
    // start, 2 shoe listing pages, promo page, 2 products
    assert_eq!(stats.requests_issued, 6);
    assert_eq!(stats.records_exported, 2);
    assert_eq!(stats.pages_skipped, 1);
    assert_eq!(stats.branches_exhausted, 1);
    assert_eq!(stats.total_errors(), 0);

    let mut records = read_lines(&output.path().join("acme/Women/Shoes.jl"));
    records.sort_by_key(|record| record["product_url"].as_str().unwrap_or_default().to_string());

    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["article_type"], serde_json::json!(["Women", "Shoes"]));
    assert_eq!(records[0]["product_name"], "Runner");
    assert_eq!(records[0]["brand_name"], "Acme");
    assert_eq!(records[0]["price"], "25.00");
    assert_eq!(records[0]["image_urls"], serde_json::json!(["https://img.acme.test/1.jpg"]));
    assert_eq!(records[0]["product_url"], format!("{}/p/1", server.uri()));
    assert_eq!(records[1]["price"], "60.00");
    assert!(records[1].get("fit").is_none());
}

#[tokio::test]
async fn test_repeated_runs_append() {
    let server = MockServer::start().await;
    mount_grid_site(&server).await;

    let output = TempDir::new().unwrap();
    let config = create_test_config(output.path(), &grid_site(&server.uri()));

    crawl(&config, &[]).await.expect("First crawl failed");
    crawl(&config, &["acme".to_string()])
        .await
        .expect("Second crawl failed");

    let records = read_lines(&output.path().join("acme/Women/Shoes.jl"));
    assert_eq!(records.len(), 4);
}

#[tokio::test]
async fn test_tree_site_with_embedded_blob() {
    let server = MockServer::start().await;
    mount_tree_site(&server).await;

    let output = TempDir::new().unwrap();
    let config = create_test_config(output.path(), &tree_site(&server.uri()));

    let summaries = crawl(&config, &[]).await.expect("Crawl failed");
    let stats = summaries[0].stats;

    assert_eq!(stats.requests_issued, 5);
    assert_eq!(stats.records_exported, 1);
    assert_eq!(stats.pages_skipped, 1);
    assert_eq!(stats.fetch_errors, 1);

    let file = output.path().join("outlet/Women/Dresses.jl");
    let raw = std::fs::read_to_string(&file).unwrap();
    assert!(raw.contains("Robe Caf\\u00e9"));
    assert!(raw.is_ascii());

    let records = read_lines(&file);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["article_type"], serde_json::json!(["Women", "Dresses"]));
    assert_eq!(records[0]["product_name"], "Robe Café");
    assert_eq!(records[0]["price"], "35.00");
    assert_eq!(records[0]["fit"], serde_json::json!(["UK 8", "UK 10"]));
    assert_eq!(records[0]["colors"], serde_json::json!(["Red"]));
}

#[tokio::test]
async fn test_unreachable_start_page_writes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let output = TempDir::new().unwrap();
    let config = create_test_config(output.path(), &grid_site(&server.uri()));

    let summaries = crawl(&config, &[]).await.expect("Crawl failed");
    assert_eq!(summaries[0].stats.fetch_errors, 1);
    assert_eq!(summaries[0].stats.records_exported, 0);
    assert!(!output.path().join("acme").exists());
}
