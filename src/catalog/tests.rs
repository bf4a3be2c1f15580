//! Tests for the catalog module

use super::*;
use crate::error::Error;
use crate::http::{HttpClient, HttpClientConfig};
use crate::request::RequestFactory;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn page_body(page: u32, total_pages: u32, ids: &[u64]) -> serde_json::Value {
    let results: Vec<_> = ids
        .iter()
        .map(|id| {
            json!({
                "id": id,
                "title": format!("Film {id}"),
                "overview": format!("About film {id}"),
                "poster_path": format!("/poster{id}.jpg"),
            })
        })
        .collect();
    json!({ "page": page, "total_pages": total_pages, "results": results })
}

fn factory(server: &MockServer) -> CatalogRequestFactory {
    let config = HttpClientConfig::builder()
        .base_url(server.uri())
        .query("api_key", "test-key")
        .build();
    let client = HttpClient::with_config(config).unwrap();
    CatalogRequestFactory::new(
        client,
        vec![
            CatalogSource::new("3/movie/popular", "en"),
            CatalogSource::new("3/movie/top_rated", "ru"),
        ],
    )
}

// ============================================================================
// DTO Mapping
// ============================================================================

#[test]
fn test_film_dto_mapping() {
    let dto: FilmDto = serde_json::from_value(json!({
        "id": 42,
        "title": "Solaris",
        "poster_path": "/solaris.jpg",
        "vote_average": 8.1
    }))
    .unwrap();

    let film = Film::from(dto);
    assert_eq!(
        film,
        Film {
            id: 42,
            title: "Solaris".to_string(),
            overview: String::new(),
            image_link: Some("/solaris.jpg".to_string()),
        }
    );
}

#[test]
fn test_page_dto_mapping() {
    let dto: FilmsPageDto = serde_json::from_value(page_body(3, 7, &[1, 2])).unwrap();
    assert_eq!(dto.page, 3);

    let page: crate::pagination::Page<Film> = dto.into();
    assert_eq!(page.total_pages, 7);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[1].title, "Film 2");
}

#[test]
fn test_page_dto_without_results() {
    let dto: FilmsPageDto =
        serde_json::from_value(json!({ "page": 1, "total_pages": 0 })).unwrap();
    assert!(dto.results.is_empty());
}

// ============================================================================
// Fetching
// ============================================================================

#[tokio::test]
async fn test_fetch_page_sends_page_and_language() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/3/movie/top_rated"))
        .and(query_param("page", "2"))
        .and(query_param("language", "ru"))
        .and(query_param("api_key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(2, 5, &[7, 8, 9])))
        .expect(1)
        .mount(&server)
        .await;

    let page = factory(&server).fetch_page(1, 2).await.unwrap();
    assert_eq!(page.total_pages, 5);
    assert_eq!(
        page.items.iter().map(|f| f.id).collect::<Vec<_>>(),
        vec![7, 8, 9]
    );
    assert_eq!(page.items[0].image_link.as_deref(), Some("/poster7.jpg"));
}

#[tokio::test]
async fn test_create_maps_offset_to_page_number() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/3/movie/popular"))
        .and(query_param("page", "3"))
        .and(query_param("language", "en"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(3, 10, &[1])))
        .expect(1)
        .mount(&server)
        .await;

    // Source(1, 20) on its third page: offset 60
    let page = factory(&server).create(20, 60, 0).await.unwrap();
    assert_eq!(page.len(), 1);
}

#[tokio::test]
async fn test_create_rejects_zero_limit() {
    let server = MockServer::start().await;
    let err = factory(&server).create(0, 0, 0).await.unwrap_err();
    assert!(matches!(err, Error::InvalidConfigValue { .. }));
}

#[tokio::test]
async fn test_unknown_source_index() {
    let server = MockServer::start().await;
    let err = factory(&server).fetch_page(5, 1).await.unwrap_err();
    assert!(matches!(err, Error::SourceOutOfRange { index: 5, count: 2 }));
}

#[tokio::test]
async fn test_http_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/3/movie/popular"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
        .mount(&server)
        .await;

    let err = factory(&server).fetch_page(0, 1).await.unwrap_err();
    match err {
        Error::HttpStatus { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "Invalid API key");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"page\": \"one\"}"))
        .mount(&server)
        .await;

    let err = factory(&server).fetch_page(0, 1).await.unwrap_err();
    assert!(matches!(err, Error::JsonParse(_)));
}

#[test]
fn test_from_config() {
    let config = crate::config::CatalogConfig::tmdb().unwrap();
    let factory = CatalogRequestFactory::from_config(&config).unwrap();
    assert_eq!(factory.sources().len(), 3);
    assert_eq!(factory.sources()[2], CatalogSource::new("3/movie/upcoming", "en"));
}
