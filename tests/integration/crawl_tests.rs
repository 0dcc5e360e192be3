//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use sumi_harvest::config::CrawlConfig;
use sumi_harvest::crawler::{
    crawl, resume, Coordinator, FetchError, FetchedPage, HttpFetcher, PageFetcher, VisitedCheck,
};
use sumi_harvest::storage::{page_id, FsStorage, Storage, STATE_FILE};
use sumi_harvest::CrawlPhase;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling the mock server into a temp dir
fn create_test_config(base_url: &str, output: &TempDir) -> CrawlConfig {
    let mut config = CrawlConfig::new(format!("{}/", base_url));
    config.output_dir = output.path().to_path_buf();
    config.delay_ms = 0;
    config.timeout_ms = 5000;
    config.user_agent = "TestBot/1.0".to_string();
    config
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html")
}

async fn mount_robots(server: &MockServer, body: &str, expected: u64) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(expected)
        .mount(server)
        .await;
}

async fn mount_page(server: &MockServer, route: &str, body: &str, expected: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .expect(expected)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_single_site() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let output = TempDir::new().unwrap();

    mount_robots(&mock_server, "User-agent: *\nAllow: /", 1).await;
    mount_page(
        &mock_server,
        "/",
        r#"<html><head><title>Home</title></head><body>
            <a href="/about">About</a>
            <a href="/contact">Contact</a>
            <a href="https://elsewhere.example.org/">Partner</a>
        </body></html>"#,
        1,
    )
    .await;
    mount_page(
        &mock_server,
        "/about",
        r#"<html><head><title>About Us</title>
            <meta name="description" content="Who we are">
            <script type="application/ld+json">{"@type": "Organization", "name": "Acme"}</script>
        </head><body><nav>Menu</nav><p>We build things.</p><a href="/">Home</a></body></html>"#,
        1,
    )
    .await;
    mount_page(
        &mock_server,
        "/contact",
        r#"<html><head><title>Contact</title></head><body><p>Write to us.</p></body></html>"#,
        1,
    )
    .await;

    let result = crawl(create_test_config(&base_url, &output)).await;

    assert!(result.success, "crawl failed: {:?}", result.error);
    assert_eq!(result.phase, CrawlPhase::Completed);
    assert_eq!(result.pages_succeeded, 3);
    assert_eq!(result.pages_failed, 0);
    assert_eq!(result.frontier_remaining, 0);

    let crawl_dir = result.crawl_dir.expect("crawl dir reported");
    let storage = FsStorage::new(&crawl_dir);
    let manifest = storage.load_manifest().unwrap().expect("manifest written");

    assert!(manifest.is_complete());
    assert_eq!(manifest.domain, "127.0.0.1");
    assert_eq!(manifest.pages.len(), 3);
    assert_eq!(manifest.pages[0].url, format!("{}/", base_url));
    assert_eq!(manifest.pages[0].depth, 0);
    assert!(manifest.pages[1..].iter().all(|p| p.depth == 1));
    assert!(!crawl_dir.join(STATE_FILE).exists());

    // Per-page artifacts
    let about_url = format!("{}/about", base_url);
    let id = page_id(&about_url);
    let pages = storage.pages_dir();
    let text = std::fs::read_to_string(pages.join(format!("{}.txt", id))).unwrap();
    assert!(text.contains("We build things."));
    assert!(!text.contains("Menu"));
    assert!(pages.join(format!("{}.html", id)).exists());

    let record: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(pages.join(format!("{}.json", id))).unwrap())
            .unwrap();
    assert_eq!(record["url"], about_url.as_str());
    assert_eq!(record["pageType"], "about");
    assert_eq!(record["metadata"]["title"], "About Us");
    assert_eq!(record["metadata"]["description"], "Who we are");
    assert_eq!(record["jsonLd"]["name"], "Acme");

    let home: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(pages.join(format!("{}.json", page_id(&format!("{}/", base_url)))))
            .unwrap(),
    )
    .unwrap();
    assert_eq!(home["pageType"], "homepage");
    assert_eq!(home["externalLinks"][0], "https://elsewhere.example.org/");
}

#[tokio::test]
async fn test_max_pages_stops_after_budget() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let output = TempDir::new().unwrap();

    mount_robots(&mock_server, "User-agent: *\nAllow: /", 1).await;

    let links: String = (0..10)
        .map(|i| format!(r#"<a href="/page{}">Page {}</a>"#, i, i))
        .collect();
    mount_page(&mock_server, "/", &format!("<html><body>{}</body></html>", links), 1).await;
    for i in 0..10 {
        mount_page(&mock_server, &format!("/page{}", i), "<html></html>", 0).await;
    }

    let mut config = create_test_config(&base_url, &output);
    config.max_pages = 1;

    let result = crawl(config).await;

    assert!(result.success);
    assert_eq!(result.pages_succeeded, 1);
    assert_eq!(result.frontier_remaining, 10);
}

#[tokio::test]
async fn test_robots_disallow_is_respected() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let output = TempDir::new().unwrap();

    mount_robots(&mock_server, "User-agent: *\nDisallow: /private\n", 1).await;
    mount_page(
        &mock_server,
        "/",
        r#"<a href="/public">Public</a><a href="/private/secret">Secret</a>"#,
        1,
    )
    .await;
    mount_page(&mock_server, "/public", "<p>Public</p>", 1).await;
    mount_page(&mock_server, "/private/secret", "<p>Secret</p>", 0).await;

    let result = crawl(create_test_config(&base_url, &output)).await;

    assert!(result.success);
    assert_eq!(result.pages_succeeded, 2);
    // Policy skips are not failures
    assert_eq!(result.pages_failed, 0);
}

#[tokio::test]
async fn test_robots_crawl_delay_slows_crawl() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let output = TempDir::new().unwrap();

    mount_robots(&mock_server, "User-agent: *\nCrawl-delay: 1\n", 1).await;
    mount_page(&mock_server, "/", r#"<a href="/next">Next</a>"#, 1).await;
    mount_page(&mock_server, "/next", "<p>Next</p>", 1).await;

    let config = create_test_config(&base_url, &output);
    assert_eq!(config.delay_ms, 0);

    let fetcher = HttpFetcher::new(&config).unwrap();
    let coordinator = Coordinator::start(config, Box::new(fetcher)).await.unwrap();
    assert_eq!(coordinator.delay(), Duration::from_secs(1));

    let started = std::time::Instant::now();
    let result = coordinator.run().await;

    assert_eq!(result.pages_succeeded, 2);
    assert!(started.elapsed() >= Duration::from_secs(1));
}

#[tokio::test]
async fn test_ignore_robots_crawls_everything() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let output = TempDir::new().unwrap();

    mount_robots(&mock_server, "User-agent: *\nDisallow: /\n", 0).await;
    mount_page(&mock_server, "/", r#"<a href="/private">Private</a>"#, 1).await;
    mount_page(&mock_server, "/private", "<p>Private</p>", 1).await;

    let mut config = create_test_config(&base_url, &output);
    config.respect_robots = false;

    let result = crawl(config).await;
    assert_eq!(result.pages_succeeded, 2);
}

#[tokio::test]
async fn test_missing_robots_allows_all() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let output = TempDir::new().unwrap();

    // No robots.txt mock: wiremock answers 404
    mount_page(&mock_server, "/", r#"<a href="/a">A</a>"#, 1).await;
    mount_page(&mock_server, "/a", "<p>A</p>", 1).await;

    let result = crawl(create_test_config(&base_url, &output)).await;
    assert!(result.success);
    assert_eq!(result.pages_succeeded, 2);
}

#[tokio::test]
async fn test_http_error_is_recorded() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let output = TempDir::new().unwrap();

    mount_robots(&mock_server, "User-agent: *\nAllow: /", 1).await;
    mount_page(&mock_server, "/", r#"<a href="/missing">Gone</a>"#, 1).await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = crawl(create_test_config(&base_url, &output)).await;

    assert!(result.success);
    assert_eq!(result.pages_succeeded, 1);
    assert_eq!(result.pages_failed, 1);

    let manifest = FsStorage::new(result.crawl_dir.unwrap())
        .load_manifest()
        .unwrap()
        .unwrap();
    assert_eq!(manifest.errors.len(), 1);
    assert_eq!(manifest.errors[0].status, 404);
    assert_eq!(manifest.errors[0].url, format!("{}/missing", base_url));
    assert_eq!(manifest.errors[0].depth, 1);
}

#[tokio::test]
async fn test_redirect_is_followed_once() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let output = TempDir::new().unwrap();

    mount_robots(&mock_server, "User-agent: *\nAllow: /", 1).await;
    mount_page(
        &mock_server,
        "/",
        r#"<a href="/old">Old</a><a href="/new">New</a>"#,
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
        .expect(1)
        .mount(&mock_server)
        .await;
    // Reached through the redirect; the direct link is then already visited
    mount_page(&mock_server, "/new", "<title>New</title>", 1).await;

    let result = crawl(create_test_config(&base_url, &output)).await;

    assert!(result.success);
    assert_eq!(result.pages_succeeded, 2);

    let storage = FsStorage::new(result.crawl_dir.unwrap());
    let id = page_id(&format!("{}/old", base_url));
    let record: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(storage.pages_dir().join(format!("{}.json", id))).unwrap(),
    )
    .unwrap();
    assert_eq!(record["finalUrl"], format!("{}/new", base_url).as_str());
}

#[tokio::test]
async fn test_redirect_into_visited_page_is_not_refetched() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let output = TempDir::new().unwrap();

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/new">New</a><a href="/old">Old</a>"#,
        1,
    )
    .await;
    mount_page(&mock_server, "/new", "<title>New</title>", 1).await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&base_url, &output);
    config.respect_robots = false;

    let result = crawl(config).await;

    assert!(result.success);
    assert_eq!(result.pages_succeeded, 2);
    assert_eq!(result.pages_failed, 0);

    let storage = FsStorage::new(result.crawl_dir.unwrap());
    let manifest = storage.load_manifest().unwrap().unwrap();
    assert_eq!(manifest.pages.len(), 2);
    assert!(manifest.errors.is_empty());
    let old_id = page_id(&format!("{}/old", base_url));
    assert!(!storage.pages_dir().join(format!("{}.json", old_id)).exists());
}

#[tokio::test]
async fn test_redirect_not_followed_when_disabled() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let output = TempDir::new().unwrap();

    mount_robots(&mock_server, "User-agent: *\nAllow: /", 1).await;
    mount_page(&mock_server, "/", r#"<a href="/old">Old</a>"#, 1).await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/new"))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/new", "<title>New</title>", 0).await;

    let mut config = create_test_config(&base_url, &output);
    config.follow_redirects = false;

    let result = crawl(config).await;
    assert_eq!(result.pages_succeeded, 1);
    assert_eq!(result.pages_failed, 1);
}

#[tokio::test]
async fn test_include_and_exclude_patterns() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let output = TempDir::new().unwrap();

    mount_robots(&mock_server, "User-agent: *\nAllow: /", 1).await;
    mount_page(
        &mock_server,
        "/",
        r#"<a href="/blog/post">Post</a>
           <a href="/blog/drafts/wip">Draft</a>
           <a href="/shop">Shop</a>
           <a href="/brochure.pdf">Brochure</a>"#,
        1,
    )
    .await;
    mount_page(&mock_server, "/blog/post", "<p>Post</p>", 1).await;
    mount_page(&mock_server, "/blog/drafts/wip", "<p>Draft</p>", 0).await;
    mount_page(&mock_server, "/shop", "<p>Shop</p>", 0).await;
    mount_page(&mock_server, "/brochure.pdf", "%PDF", 0).await;

    let mut config = create_test_config(&base_url, &output);
    config.include_patterns = vec!["/".to_string(), "/blog/**".to_string()];
    config.exclude_patterns.push("**/drafts/**".to_string());

    let result = crawl(config).await;
    assert!(result.success);
    assert_eq!(result.pages_succeeded, 2);
}

#[tokio::test]
async fn test_non_html_response_is_failure() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let output = TempDir::new().unwrap();

    mount_robots(&mock_server, "User-agent: *\nAllow: /", 1).await;
    mount_page(&mock_server, "/", r#"<a href="/data">Data</a>"#, 1).await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/octet-stream"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = crawl(create_test_config(&base_url, &output)).await;
    assert_eq!(result.pages_succeeded, 1);
    assert_eq!(result.pages_failed, 1);
}

#[tokio::test]
async fn test_invalid_seed_fails_without_crawling() {
    let output = TempDir::new().unwrap();
    let mut config = CrawlConfig::new("not a url");
    config.output_dir = output.path().to_path_buf();

    let result = crawl(config).await;
    assert!(!result.success);
    assert_eq!(result.phase, CrawlPhase::Failed);
    assert!(result.error.is_some());
    assert!(result.crawl_dir.is_none());
}

/// Delegates to a real fetcher but never completes the Nth fetch
struct HangingFetcher {
    inner: HttpFetcher,
    calls: AtomicUsize,
    hang_on: usize,
}

#[async_trait]
impl PageFetcher for HangingFetcher {
    async fn fetch(&self, url: &Url, visited: &VisitedCheck) -> Result<FetchedPage, FetchError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == self.hang_on {
            std::future::pending::<()>().await;
        }
        self.inner.fetch(url, visited).await
    }

    fn name(&self) -> &'static str {
        "hanging"
    }
}

#[tokio::test]
async fn test_interrupted_crawl_resumes_without_refetching() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let output = TempDir::new().unwrap();

    // Fetched once by the first run and once more on resume
    mount_robots(&mock_server, "User-agent: *\nAllow: /", 2).await;
    mount_page(
        &mock_server,
        "/",
        r#"<a href="/a">A</a><a href="/b">B</a><a href="/c">C</a>"#,
        1,
    )
    .await;
    for route in ["/a", "/b", "/c"] {
        mount_page(&mock_server, route, r#"<a href="/">Home</a>"#, 1).await;
    }

    let mut config = create_test_config(&base_url, &output);
    config.checkpoint_interval = 1;

    let fetcher = HangingFetcher {
        inner: HttpFetcher::new(&config).unwrap(),
        calls: AtomicUsize::new(0),
        hang_on: 2,
    };
    let coordinator = Coordinator::start(config, Box::new(fetcher)).await.unwrap();
    let crawl_dir = coordinator.crawl_dir().to_path_buf();

    // Interrupt the crawl while the third page is in flight
    let interrupted = tokio::time::timeout(Duration::from_secs(2), coordinator.run()).await;
    assert!(interrupted.is_err());

    let state_path = crawl_dir.join(STATE_FILE);
    let state = FsStorage::new(&crawl_dir).load_state().unwrap().expect("checkpoint");
    assert_eq!(state.stats.pages_succeeded, 2);
    assert_eq!(state.frontier.len(), 2);

    let result = resume(&state_path, None).await;

    assert!(result.success, "resume failed: {:?}", result.error);
    assert_eq!(result.phase, CrawlPhase::Completed);
    assert_eq!(result.pages_succeeded, 4);
    assert_eq!(result.crawl_dir.as_deref(), Some(crawl_dir.as_path()));
    assert!(!state_path.exists());

    let manifest = FsStorage::new(&crawl_dir).load_manifest().unwrap().unwrap();
    assert!(manifest.is_complete());
    assert_eq!(manifest.pages.len(), 4);
}

#[tokio::test]
async fn test_resume_without_checkpoint_fails() {
    let output = TempDir::new().unwrap();

    let result = resume(output.path(), Some(CrawlConfig::new("https://example.com/"))).await;

    assert!(!result.success);
    assert!(result.error.unwrap().contains("checkpoint"));
}
