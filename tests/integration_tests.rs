//! Integration tests using mock HTTP server
//!
//! Tests the full end-to-end flow: YAML config → catalog requests → engine states

use pagechain::catalog::{CatalogRequestFactory, Film};
use pagechain::cli::{browse, BrowseOptions};
use pagechain::config::CatalogConfig;
use pagechain::engine::PaginationEngine;
use pagechain::pagination::{Page, PaginationState, Source, StateKind};
use pagechain::request::{request_fn, RequestFactory};
use pagechain::Error;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use test_case::test_case;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn films_body(page: u32, total_pages: u32, ids: std::ops::Range<u64>) -> serde_json::Value {
    let results: Vec<_> = ids
        .map(|id| json!({ "id": id, "title": format!("Film {id}"), "overview": "" }))
        .collect();
    json!({ "page": page, "total_pages": total_pages, "results": results })
}

async fn mount_page(
    server: &MockServer,
    endpoint: &str,
    language: &str,
    page: u32,
    body: serde_json::Value,
) {
    Mock::given(method("GET"))
        .and(path(endpoint))
        .and(query_param("page", page.to_string()))
        .and(query_param("language", language))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

fn catalog_config(server: &MockServer, page_size: u32) -> CatalogConfig {
    let yaml = format!(
        r"
base_url: {}
api_key: test-key
sources:
  - name: popular
    path: 3/movie/popular
    language: en
    page_size: {page_size}
  - name: empty
    path: 3/movie/empty
    language: de
    page_size: {page_size}
  - name: top_rated
    path: 3/movie/top_rated
    language: ru
    page_size: {page_size}
",
        server.uri()
    );
    let config = CatalogConfig::from_yaml_str(&yaml).unwrap();
    config.validate().unwrap();
    config
}

fn catalog_engine(config: &CatalogConfig) -> PaginationEngine<Film> {
    let factory = Arc::new(CatalogRequestFactory::from_config(config).unwrap());
    PaginationEngine::with_config(config.engine_sources(), factory, config.engine_config()).unwrap()
}

async fn next_state(
    rx: &mut tokio::sync::broadcast::Receiver<PaginationState<Film>>,
) -> PaginationState<Film> {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for a transition")
        .unwrap()
}

// ============================================================================
// Catalog + Engine
// ============================================================================

#[tokio::test]
async fn test_catalog_chain_end_to_end() {
    let server = MockServer::start().await;
    mount_page(&server, "/3/movie/popular", "en", 1, films_body(1, 2, 0..4)).await;
    mount_page(&server, "/3/movie/popular", "en", 2, films_body(2, 2, 4..6)).await;
    mount_page(&server, "/3/movie/empty", "de", 1, films_body(1, 0, 0..0)).await;
    mount_page(&server, "/3/movie/top_rated", "ru", 1, films_body(1, 1, 100..103)).await;

    let config = catalog_config(&server, 4);
    let engine = catalog_engine(&config);

    let mut kinds = Vec::new();
    let last = browse(&engine, BrowseOptions::default(), |s| kinds.push(s.kind()))
        .await
        .unwrap();

    assert_eq!(last.kind(), StateKind::FullContent);
    let ids: Vec<u64> = last.content().iter().map(|f| f.id).collect();
    assert_eq!(ids, vec![0, 1, 2, 3, 4, 5, 100, 101, 102]);
    assert_eq!(
        kinds,
        vec![
            StateKind::EmptyLoading,
            StateKind::Content,
            StateKind::LoadingPage,
            StateKind::Content,
            StateKind::LoadingPage,
            StateKind::EmptyData,
            StateKind::LoadingPage,
            StateKind::FullContent,
        ]
    );

    let stats = engine.stats();
    assert_eq!(stats.requests_issued, 4);
    assert_eq!(stats.checkouts, 2);

    let requests = server.received_requests().await.unwrap();
    assert!(requests
        .iter()
        .all(|r| r.url.query().unwrap_or_default().contains("api_key=test-key")));
}

#[tokio::test]
async fn test_catalog_error_keeps_content_and_retries() {
    let server = MockServer::start().await;
    mount_page(&server, "/3/movie/popular", "en", 1, films_body(1, 2, 0..4)).await;
    Mock::given(method("GET"))
        .and(path("/3/movie/popular"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_page(&server, "/3/movie/popular", "en", 2, films_body(2, 2, 4..8)).await;

    let config = catalog_config(&server, 4);
    let engine = catalog_engine(&config);
    let mut rx = engine.transitions();

    engine.start(None);
    assert_eq!(next_state(&mut rx).await.kind(), StateKind::EmptyLoading);
    assert_eq!(next_state(&mut rx).await.kind(), StateKind::Content);

    engine.on_item_reached(3);
    assert_eq!(next_state(&mut rx).await.kind(), StateKind::LoadingPage);
    let failed = next_state(&mut rx).await;
    assert_eq!(failed.kind(), StateKind::LoadingPageError);
    assert_eq!(failed.page(), 1);
    assert_eq!(failed.content().len(), 4);
    assert!(matches!(
        failed.error().map(|e| &**e),
        Some(Error::HttpStatus { status: 503, .. })
    ));

    engine.retry();
    assert_eq!(next_state(&mut rx).await.kind(), StateKind::LoadingPage);
    let loaded = next_state(&mut rx).await;
    assert_eq!(loaded.kind(), StateKind::Content);
    assert_eq!(loaded.page(), 2);
    assert_eq!(loaded.content().len(), 8);
}

#[tokio::test]
async fn test_refresh_cancels_slow_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/3/movie/popular"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(films_body(1, 1, 0..2))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let config = catalog_config(&server, 4);
    let engine = catalog_engine(&config);
    let mut rx = engine.transitions();

    engine.start(None);
    assert_eq!(next_state(&mut rx).await.kind(), StateKind::EmptyLoading);
    engine.refresh();
    assert_eq!(next_state(&mut rx).await.kind(), StateKind::Refreshing);

    let state = next_state(&mut rx).await;
    assert_eq!(state.kind(), StateKind::Content);
    assert_eq!(state.content().len(), 2);

    // Only the refresh's fetch was folded
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(rx.try_recv().is_err());
    assert_eq!(engine.stats().pages_loaded, 1);
}

// ============================================================================
// Closure-backed factories
// ============================================================================

#[test_case(1, 10, 3 ; "one based pages")]
#[test_case(0, 10, 3 ; "zero based pages")]
#[test_case(1, 7, 1 ; "single page source")]
#[tokio::test]
async fn test_request_fn_offsets(initial_page: u32, page_size: u32, total_pages: u32) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let factory = request_fn(move |limit, offset, source_index| {
        counter.fetch_add(1, Ordering::SeqCst);
        async move {
            assert_eq!(source_index, 0);
            let items: Vec<u64> = (offset..offset + u64::from(limit)).collect();
            Ok(Page::new(items, total_pages + initial_page - 1))
        }
    });
    let engine = PaginationEngine::new(
        vec![Source::new(initial_page, page_size)],
        Arc::new(factory) as Arc<dyn RequestFactory<u64>>,
    )
    .unwrap();

    let last = browse(&engine, BrowseOptions::default(), |_| {})
        .await
        .unwrap();

    assert_eq!(last.kind(), StateKind::FullContent);
    let first = u64::from(initial_page) * u64::from(page_size);
    let expected: Vec<u64> = (first..first + u64::from(total_pages * page_size)).collect();
    assert_eq!(last.content(), &expected[..]);
    assert_eq!(calls.load(Ordering::SeqCst), total_pages as usize);
}

#[tokio::test]
async fn test_states_stream_replays_latest() {
    use futures::StreamExt;

    let factory = request_fn(|limit, offset, _| async move {
        Ok(Page::new((offset..offset + u64::from(limit)).collect::<Vec<u64>>(), 1))
    });
    let engine = PaginationEngine::new(
        vec![Source::new(1, 5)],
        Arc::new(factory) as Arc<dyn RequestFactory<u64>>,
    )
    .unwrap();

    let mut rx = engine.transitions();
    engine.start(None);
    while !next_u64(&mut rx).await.is_terminal() {}

    // A late subscriber sees the latest state first
    let mut states = engine.states();
    let first = states.next().await.unwrap();
    assert_eq!(first.kind(), StateKind::FullContent);
    assert_eq!(first.content().len(), 5);
}

async fn next_u64(
    rx: &mut tokio::sync::broadcast::Receiver<PaginationState<u64>>,
) -> PaginationState<u64> {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for a transition")
        .unwrap()
}
