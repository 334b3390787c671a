//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run full
//! crawl jobs end-to-end with the static fetch engine.

use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use sumi_harvest::config::{
    parse_job_json, CrawlJob, FetchEngine, FieldSpec, FieldValue, NavigationSpec, PaginationSpec,
    SelectorSpec,
};
use sumi_harvest::crawler::run_crawl;
use sumi_harvest::{CollectingSink, EventKind, HarvestEngine};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Serves `body` as HTML at `route`
async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

/// Listing page with one `.row` per item id, plus an optional next link
fn listing_page(item_ids: &[u32], next: Option<&str>) -> String {
    let rows: String = item_ids
        .iter()
        .map(|id| format!(r#"<div class="row"><a href="/item/{id}">Item {id}</a></div>"#))
        .collect();
    let next = next
        .map(|href| format!(r#"<a class="next" href="{href}">Next</a>"#))
        .unwrap_or_default();
    format!("<html><body>{rows}{next}</body></html>")
}

fn detail_page(id: u32) -> String {
    format!(
        r#"<html><body><h1>Item {id}</h1><span class="price">{}</span></body></html>"#,
        id * 10
    )
}

/// Static list-mode job with no delay between requests
fn list_job(start_url: String) -> CrawlJob {
    let mut job = CrawlJob::new(
        start_url,
        FetchEngine::Static,
        vec![FieldSpec::new("title", SelectorSpec::text("h1"))],
    );
    let mut navigation = NavigationSpec::new(".row");
    navigation.detail_link_expression = Some("a".to_string());
    job.navigation = Some(navigation);
    job.timing.inter_request_delay_seconds = 0.0;
    job.timing.page_load_timeout_seconds = 5.0;
    job
}

fn titles(records: &[sumi_harvest::CrawlRecord]) -> Vec<String> {
    records
        .iter()
        .filter_map(|r| r.get("title").and_then(FieldValue::as_text).map(str::to_string))
        .collect()
}

#[tokio::test]
async fn test_list_mode_extracts_each_detail_page() {
    let server = MockServer::start().await;
    mount_page(&server, "/list", listing_page(&[1, 2, 3], None)).await;
    for id in 1..=3 {
        mount_page(&server, &format!("/item/{id}"), detail_page(id)).await;
    }

    let job = list_job(format!("{}/list", server.uri()));
    let sink = Arc::new(CollectingSink::new());
    let outcome = HarvestEngine::with_sink(sink.clone()).submit(&job).await;

    assert!(outcome.success, "errors: {:?}", outcome.errors);
    assert_eq!(outcome.total_items, 3);
    assert_eq!(outcome.records.len(), outcome.total_items);
    assert_eq!(titles(&outcome.records), vec!["Item 1", "Item 2", "Item 3"]);
    assert!(outcome.errors.is_empty());
    assert_eq!(outcome.next_page_url, None);

    assert_eq!(sink.of_kind(EventKind::RunStarted).len(), 1);
    assert_eq!(sink.of_kind(EventKind::ItemExtracted).len(), 3);
    assert_eq!(sink.of_kind(EventKind::RunFinished).len(), 1);
}

#[tokio::test]
async fn test_failing_detail_page_does_not_stop_run() {
    let server = MockServer::start().await;
    mount_page(&server, "/list", listing_page(&[1, 2, 3, 4, 5], None)).await;
    for id in [1, 2, 4, 5] {
        mount_page(&server, &format!("/item/{id}"), detail_page(id)).await;
    }
    Mock::given(method("GET"))
        .and(path("/item/3"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let job = list_job(format!("{}/list", server.uri()));
    let outcome = run_crawl(&job, &CollectingSink::new()).await;

    assert!(outcome.success);
    assert_eq!(outcome.total_items, 4);
    assert_eq!(titles(&outcome.records), vec!["Item 1", "Item 2", "Item 4", "Item 5"]);
    assert_eq!(outcome.errors.len(), 1);
    assert!(outcome.errors[0].contains("/item/3"));
    assert!(outcome.errors[0].contains("500"));
}

#[tokio::test]
async fn test_pagination_respects_max_pages() {
    let server = MockServer::start().await;
    mount_page(&server, "/page/1", listing_page(&[1], Some("/page/2"))).await;
    mount_page(&server, "/page/2", listing_page(&[2], Some("/page/3"))).await;
    mount_page(&server, "/item/1", detail_page(1)).await;
    mount_page(&server, "/item/2", detail_page(2)).await;
    Mock::given(method("GET"))
        .and(path("/page/3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[3], None)))
        .expect(0)
        .mount(&server)
        .await;

    let mut job = list_job(format!("{}/page/1", server.uri()));
    let mut pagination = PaginationSpec::follow("a.next");
    pagination.max_pages = Some(2);
    job.pagination = Some(pagination);

    let sink = CollectingSink::new();
    let outcome = run_crawl(&job, &sink).await;

    assert!(outcome.success, "errors: {:?}", outcome.errors);
    assert_eq!(titles(&outcome.records), vec!["Item 1", "Item 2"]);
    assert_eq!(outcome.next_page_url, Some(format!("{}/page/3", server.uri())));

    let finished = sink.of_kind(EventKind::RunFinished);
    assert_eq!(finished.len(), 1);
    assert!(
        finished[0].detail.contains("after 2 page(s)"),
        "detail: {}",
        finished[0].detail
    );
}

#[tokio::test]
async fn test_pagination_follows_until_no_next_link() {
    let server = MockServer::start().await;
    mount_page(&server, "/page/1", listing_page(&[1, 2], Some("/page/2"))).await;
    mount_page(&server, "/page/2", listing_page(&[3], None)).await;
    for id in 1..=3 {
        mount_page(&server, &format!("/item/{id}"), detail_page(id)).await;
    }

    let mut job = list_job(format!("{}/page/1", server.uri()));
    job.pagination = Some(PaginationSpec::follow("a.next"));

    let sink = CollectingSink::new();
    let outcome = run_crawl(&job, &sink).await;

    assert!(outcome.success);
    assert_eq!(titles(&outcome.records), vec!["Item 1", "Item 2", "Item 3"]);
    assert_eq!(outcome.next_page_url, None);
    assert_eq!(sink.of_kind(EventKind::PageAdvanced).len(), 1);
}

#[tokio::test]
async fn test_self_referencing_next_link_stops_pagination() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/solo"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[1], Some("/solo"))))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/item/1", detail_page(1)).await;

    let mut job = list_job(format!("{}/solo", server.uri()));
    job.pagination = Some(PaginationSpec::follow("a.next"));

    let sink = CollectingSink::new();
    let outcome = run_crawl(&job, &sink).await;

    assert!(outcome.success);
    assert_eq!(outcome.total_items, 1);
    assert_eq!(outcome.next_page_url, None);
    assert!(sink
        .of_kind(EventKind::PaginationStopped)
        .iter()
        .any(|e| e.detail.contains("current page")));
}

#[tokio::test]
async fn test_single_page_mode_extracts_start_page() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/article",
        r#"<html><body>
            <h1> Hello   world </h1>
            <ul><li>red</li><li> </li><li>blue</li></ul>
            <a class="author" href="/people/ada">Ada</a>
        </body></html>"#
            .to_string(),
    )
    .await;

    let mut job = CrawlJob::new(
        format!("{}/article", server.uri()),
        FetchEngine::Static,
        vec![
            FieldSpec::new("title", SelectorSpec::text("h1")),
            FieldSpec::new("tags", SelectorSpec::text("li").all()),
            FieldSpec::new("author", SelectorSpec::text("a.author").with_attribute("href")),
            FieldSpec::new("missing", SelectorSpec::text(".nope")),
        ],
    );
    job.timing.inter_request_delay_seconds = 0.0;

    let outcome = run_crawl(&job, &CollectingSink::new()).await;

    assert!(outcome.success);
    assert_eq!(outcome.total_items, 1);
    let record = &outcome.records[0];
    assert_eq!(record["title"], FieldValue::Text("Hello world".to_string()));
    assert_eq!(
        record["tags"],
        FieldValue::List(vec!["red".to_string(), "blue".to_string()])
    );
    assert_eq!(record["author"], FieldValue::Text("/people/ada".to_string()));
    assert!(!record.contains_key("missing"));
}

#[tokio::test]
async fn test_listing_page_failure_is_fatal_but_keeps_records() {
    let server = MockServer::start().await;
    mount_page(&server, "/page/1", listing_page(&[1], Some("/page/2"))).await;
    mount_page(&server, "/item/1", detail_page(1)).await;
    Mock::given(method("GET"))
        .and(path("/page/2"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut job = list_job(format!("{}/page/1", server.uri()));
    job.pagination = Some(PaginationSpec::follow("a.next"));

    let sink = CollectingSink::new();
    let outcome = run_crawl(&job, &sink).await;

    assert!(!outcome.success);
    assert_eq!(outcome.total_items, 1);
    assert_eq!(titles(&outcome.records), vec!["Item 1"]);
    assert_eq!(outcome.errors.len(), 1);
    assert!(outcome.errors[0].starts_with("Crawl failed"));
    assert!(outcome.errors[0].contains("404"));
    assert_eq!(sink.of_kind(EventKind::PageFailed).len(), 1);
}

#[tokio::test]
async fn test_invalid_job_is_rejected_without_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut job = list_job(format!("{}/list", server.uri()));
    job.fields.clear();
    job.context.insert("request_id".to_string(), json!("r-17"));

    let outcome = HarvestEngine::with_sink(Arc::new(CollectingSink::new()))
        .submit(&job)
        .await;

    assert!(!outcome.success);
    assert!(outcome.records.is_empty());
    assert_eq!(outcome.total_items, 0);
    assert!(outcome.errors.iter().any(|e| e.contains("At least one field")));
    assert_eq!(outcome.context["request_id"], json!("r-17"));
}

#[tokio::test]
async fn test_context_is_returned_unchanged() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "<html><body><h1>Home</h1></body></html>".to_string()).await;

    let mut job = CrawlJob::new(
        format!("{}/", server.uri()),
        FetchEngine::Static,
        vec![FieldSpec::new("title", SelectorSpec::text("h1"))],
    );
    job.context.insert("tenant".to_string(), json!({"id": 7, "tags": ["a", "b"]}));

    let outcome = run_crawl(&job, &CollectingSink::new()).await;

    assert!(outcome.success);
    assert_eq!(outcome.context, job.context);
}

#[tokio::test]
async fn test_invalid_field_selector_only_drops_that_field() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "<html><body><h1>Home</h1></body></html>".to_string()).await;

    let mut job = CrawlJob::new(
        format!("{}/", server.uri()),
        FetchEngine::Static,
        vec![
            FieldSpec::new("title", SelectorSpec::text("h1")),
            FieldSpec::new("broken", SelectorSpec::text("h1[")),
        ],
    );
    job.timing.inter_request_delay_seconds = 0.0;

    let sink = CollectingSink::new();
    let outcome = run_crawl(&job, &sink).await;

    assert!(outcome.success);
    assert!(outcome.errors.is_empty());
    let record = &outcome.records[0];
    assert_eq!(record["title"], FieldValue::Text("Home".to_string()));
    assert!(!record.contains_key("broken"));

    let failures = sink.of_kind(EventKind::FieldFailed);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].field.as_deref(), Some("broken"));
}

#[tokio::test]
async fn test_concurrent_runs_are_independent() {
    let server = MockServer::start().await;
    mount_page(&server, "/list", listing_page(&[1, 2], None)).await;
    mount_page(&server, "/item/1", detail_page(1)).await;
    mount_page(&server, "/item/2", detail_page(2)).await;
    mount_page(&server, "/single", detail_page(9)).await;

    let engine = HarvestEngine::with_sink(Arc::new(CollectingSink::new()));
    let list = list_job(format!("{}/list", server.uri()));
    let mut single = CrawlJob::new(
        format!("{}/single", server.uri()),
        FetchEngine::Static,
        vec![FieldSpec::new("title", SelectorSpec::text("h1"))],
    );
    single.timing.inter_request_delay_seconds = 0.0;

    let (a, b) = tokio::join!(engine.submit(&list), engine.submit(&single));

    assert!(a.success && b.success);
    assert_eq!(titles(&a.records), vec!["Item 1", "Item 2"]);
    assert_eq!(titles(&b.records), vec!["Item 9"]);
}

#[tokio::test]
async fn test_json_job_with_legacy_names_runs() {
    let server = MockServer::start().await;
    mount_page(&server, "/list", listing_page(&[4], None)).await;
    mount_page(&server, "/item/4", detail_page(4)).await;

    let raw = json!({
        "start_url": format!("{}/list", server.uri()),
        "engine": "beautifulsoup",
        "extractors": [
            {"field_name": "title", "selector_config": {"selector": "h1"}},
            {"field_name": "price", "selector_config": {"selector": ".price"}}
        ],
        "navigation": {"list_items_selector": ".row", "detail_link_selector": "a"},
        "wait_config": {"delay_between_requests": 0},
        "context": {"source": "legacy"}
    });
    let job = parse_job_json(&raw.to_string()).unwrap();
    assert_eq!(job.fetch_engine, FetchEngine::Static);

    let outcome = HarvestEngine::with_sink(Arc::new(CollectingSink::new()))
        .submit(&job)
        .await;

    let value = serde_json::to_value(&outcome).unwrap();
    assert_eq!(value["success"], json!(true));
    assert_eq!(value["total_items"], json!(1));
    assert_eq!(value["records"][0], json!({"price": "40", "title": "Item 4"}));
    assert_eq!(value["next_page_url"], json!(null));
    assert_eq!(value["errors"], json!([]));
    assert_eq!(value["context"], json!({"source": "legacy"}));
}

#[tokio::test]
async fn test_delay_separates_detail_and_listing_requests() {
    let server = MockServer::start().await;
    mount_page(&server, "/page/1", listing_page(&[1, 2], Some("/page/2"))).await;
    mount_page(&server, "/page/2", listing_page(&[3], None)).await;
    for id in 1..=3 {
        mount_page(&server, &format!("/item/{id}"), detail_page(id)).await;
    }

    let mut job = list_job(format!("{}/page/1", server.uri()));
    job.pagination = Some(PaginationSpec::follow("a.next"));
    job.timing.inter_request_delay_seconds = 0.2;

    let started = Instant::now();
    let outcome = run_crawl(&job, &CollectingSink::new()).await;
    let elapsed = started.elapsed();

    assert!(outcome.success);
    assert_eq!(outcome.total_items, 3);
    // One pause before item 2 and one before listing page 2
    assert!(elapsed >= Duration::from_millis(400), "elapsed: {:?}", elapsed);
}

#[tokio::test]
async fn test_first_request_is_not_delayed() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "<html><body><h1>Home</h1></body></html>".to_string()).await;

    let mut job = CrawlJob::new(
        format!("{}/", server.uri()),
        FetchEngine::Static,
        vec![FieldSpec::new("title", SelectorSpec::text("h1"))],
    );
    job.timing.inter_request_delay_seconds = 3.0;

    let started = Instant::now();
    let outcome = run_crawl(&job, &CollectingSink::new()).await;

    assert!(outcome.success);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_setup_failure_visits_no_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut job = CrawlJob::new(
        format!("{}/", server.uri()),
        FetchEngine::Rendered,
        vec![FieldSpec::new("title", SelectorSpec::text("h1"))],
    );
    job.browser_executable = Some(PathBuf::from("/nonexistent/chromium"));
    job.context.insert("run".to_string(), json!(3));

    let sink = Arc::new(CollectingSink::new());
    let outcome = HarvestEngine::with_sink(sink.clone()).submit(&job).await;

    assert!(!outcome.success);
    assert!(outcome.records.is_empty());
    assert_eq!(outcome.total_items, 0);
    assert_eq!(outcome.errors.len(), 1);
    assert!(outcome.errors[0].starts_with("Crawl setup failed"), "{}", outcome.errors[0]);
    assert_eq!(outcome.context["run"], json!(3));
    assert!(sink.of_kind(EventKind::RunStarted).is_empty());
    assert!(sink.of_kind(EventKind::PageFetched).is_empty());
}
