//! Session-level behavior against a mock storefront: retry bounds, sentinel
//! handling, per-field error reporting and mixed runs.

use std::sync::Arc;

use storefront_harvest::application::ScrapeSession;
use storefront_harvest::infrastructure::config::ScrapingConfig;
use storefront_harvest::infrastructure::http_client::HttpClient;
use storefront_harvest::infrastructure::parsing::AppDetailParser;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COMPLETE_PAGE: &str = r##"<html><body>
<h1 class="tw-text-heading-lg">Loyalty Points</h1>
<p class="tw-text-body-md tw-text-fg-secondary">Points and rewards for your store</p>
<dl>
  <dd class="tw-flex tw-items-center tw-gap-2xs tw-text-body-sm">
    <span>4.8</span>
    <span>·</span>
    <span><a href="/loyalty-points/reviews">(1,234)</a></span>
  </dd>
  <dd class="app-categories">
    <a href="/categories/marketing">Marketing</a>
    <a href="/categories/loyalty">Loyalty</a>
  </dd>
  <dd class="app-launched">2021年5月3日 · 精选</dd>
</dl>
<div id="app-details">
  <p>Long form description of the app.</p>
  <ul><li>Point one</li><li>Point two</li></ul>
</div>
<a class="app-website" href="https://example.com">Website</a>
</body></html>"##;

const SENTINEL_PAGE: &str = r#"<html><body>
<div class="app-listing-incomplete">This listing is not available</div>
<h1 class="tw-text-heading-lg">Leftover Title</h1>
</body></html>"#;

const TITLE_ONLY_PAGE: &str = r#"<html><body>
<h1 class="tw-text-heading-lg">Only A Title</h1>
</body></html>"#;

fn fast_config() -> ScrapingConfig {
    ScrapingConfig {
        request_delay_ms: 0,
        ..Default::default()
    }
}

fn session(config: ScrapingConfig) -> ScrapeSession {
    ScrapeSession::new(
        HttpClient::new(&config).unwrap(),
        Arc::new(AppDetailParser::new().unwrap()),
        config,
    )
}

#[tokio::test]
async fn complete_listing_produces_one_record_and_no_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/loyalty-points"))
        .respond_with(ResponseTemplate::new(200).set_body_string(COMPLETE_PAGE))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/loyalty-points", server.uri());
    let output = session(fast_config()).run(&[url.clone()], "20250101_120000").await;

    assert!(output.errors.is_empty());
    assert_eq!(output.records.len(), 1);
    let record = &output.records[0];
    assert_eq!(record.url, url);
    assert!(record.complete_information);
    assert_eq!(record.title.as_deref(), Some("Loyalty Points"));
    assert_eq!(record.rating.as_deref(), Some("4.8"));
    assert_eq!(record.reviews_count.as_deref(), Some("1234"));
    assert_eq!(record.detail_points.as_deref(), Some("Point one|Point two"));
    assert_eq!(record.category.as_deref(), Some("Marketing|Loyalty"));
    assert_eq!(record.release_date.as_deref(), Some("2021-05-03"));
    assert_eq!(record.timestamp, "20250101_120000");
}

#[tokio::test]
async fn sentinel_listing_yields_incomplete_record_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/hidden-app"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SENTINEL_PAGE))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/hidden-app", server.uri());
    let output = session(fast_config()).run(&[url], "ts").await;

    assert!(output.errors.is_empty());
    assert_eq!(output.records.len(), 1);
    let record = &output.records[0];
    assert!(!record.complete_information);
    // the leftover title on the page must not leak into the record
    assert!(record.title.is_none());
    assert!(record.rating.is_none());
    assert!(record.reviews_count.is_none());
    assert!(record.main_description.is_none());
    assert!(record.detailed_description.is_none());
    assert!(record.detail_points.is_none());
    assert!(record.category.is_none());
    assert!(record.release_date.is_none());
    assert!(record.website.is_none());
}

#[tokio::test]
async fn persistent_500_exhausts_exactly_max_retries_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/broken-app"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let url = format!("{}/broken-app", server.uri());
    let output = session(fast_config()).run(&[url.clone()], "ts").await;

    assert!(output.records.is_empty());
    assert_eq!(output.errors.len(), 1);
    assert_eq!(output.errors[0].url, url);
    assert_eq!(output.errors[0].field, "http_request");
    assert!(output.errors[0].error_message.contains("500"));
}

#[tokio::test]
async fn transport_failure_reports_the_request_field() {
    // nothing listens here, so every attempt fails at the transport level
    let url = "http://127.0.0.1:1/no-server".to_string();
    let output = session(fast_config()).run(&[url.clone()], "ts").await;

    assert!(output.records.is_empty());
    assert_eq!(output.errors.len(), 1);
    assert_eq!(output.errors[0].field, "request");
    assert_eq!(output.errors[0].url, url);
}

#[tokio::test]
async fn incomplete_extraction_is_refetched_then_reported_per_field() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/thin-app"))
        .respond_with(ResponseTemplate::new(200).set_body_string(TITLE_ONLY_PAGE))
        .expect(2)
        .mount(&server)
        .await;

    let url = format!("{}/thin-app", server.uri());
    let output = session(fast_config()).run(&[url], "ts").await;

    assert!(output.records.is_empty());
    let mut fields: Vec<&str> = output.errors.iter().map(|e| e.field.as_str()).collect();
    fields.sort_unstable();
    assert_eq!(
        fields,
        vec![
            "category",
            "detail_points",
            "detailed_description",
            "main_description",
            "rating",
            "release_date",
            "reviews_count",
        ]
    );
}

#[tokio::test]
async fn mixed_run_keeps_partial_data_and_isolates_the_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/complete-app"))
        .respond_with(ResponseTemplate::new(200).set_body_string(COMPLETE_PAGE))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/hidden-app"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SENTINEL_PAGE))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken-app"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let complete_url = format!("{}/complete-app", server.uri());
    let hidden_url = format!("{}/hidden-app", server.uri());
    let broken_url = format!("{}/broken-app", server.uri());
    let targets = vec![complete_url.clone(), hidden_url.clone(), broken_url.clone()];

    let output = session(fast_config()).run(&targets, "ts").await;

    assert_eq!(output.records.len(), 2);
    let complete = output
        .records
        .iter()
        .find(|r| r.url == complete_url)
        .expect("complete listing recorded");
    assert!(complete.complete_information);
    let hidden = output
        .records
        .iter()
        .find(|r| r.url == hidden_url)
        .expect("sentinel listing recorded");
    assert!(!hidden.complete_information);

    assert!(!output.errors.is_empty());
    assert!(
        output
            .errors
            .iter()
            .any(|e| e.url == broken_url && e.field == "http_request")
    );
}

#[tokio::test]
async fn batch_size_caps_the_processed_targets() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/first"))
        .respond_with(ResponseTemplate::new(200).set_body_string(COMPLETE_PAGE))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/second"))
        .respond_with(ResponseTemplate::new(200).set_body_string(COMPLETE_PAGE))
        .expect(0)
        .mount(&server)
        .await;

    let config = ScrapingConfig {
        batch_size: Some(1),
        ..fast_config()
    };
    let targets = vec![
        format!("{}/first", server.uri()),
        format!("{}/second", server.uri()),
    ];
    let output = session(config).run(&targets, "ts").await;

    assert_eq!(output.records.len(), 1);
}

#[tokio::test]
async fn worker_pool_reports_every_target_in_any_order() {
    let server = MockServer::start().await;
    for name in ["a", "b", "c", "d", "e"] {
        Mock::given(method("GET"))
            .and(path(format!("/app-{name}")))
            .respond_with(ResponseTemplate::new(200).set_body_string(COMPLETE_PAGE))
            .expect(1)
            .mount(&server)
            .await;
    }

    let config = ScrapingConfig {
        max_concurrent: 3,
        ..fast_config()
    };
    let targets: Vec<String> = ["a", "b", "c", "d", "e"]
        .iter()
        .map(|name| format!("{}/app-{name}", server.uri()))
        .collect();
    let output = session(config).run(&targets, "ts").await;

    assert!(output.errors.is_empty());
    // row order carries no meaning, so compare as sets
    let mut urls: Vec<&str> = output.records.iter().map(|r| r.url.as_str()).collect();
    urls.sort_unstable();
    let mut expected: Vec<&str> = targets.iter().map(String::as_str).collect();
    expected.sort_unstable();
    assert_eq!(urls, expected);
}
