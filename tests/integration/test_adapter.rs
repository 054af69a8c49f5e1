//! Integration tests for the table adapter against a live HTTP backend.
//!
//! These tests drive `TableAdapter` through `RestClient` and check both what
//! reaches the backend and how its answers are normalized.

mod common;

use std::time::Duration;

use common::{MockBackend, ACCESS_TOKEN};
use serde::Deserialize;
use serde_json::Value;
use tutorlix_client::{ClientOptions, RestClient};
use tutorlix_table::{FetchErrorKind, SortEntry, SortMap, TableError, TableQuery};

fn client(backend: &MockBackend) -> RestClient {
    RestClient::new(&backend.base_url, ClientOptions::default()).expect("client")
}

fn titles(rows: &[Value]) -> Vec<&str> {
    rows.iter()
        .map(|row| row["title"].as_str().unwrap_or_default())
        .collect()
}

fn fetch_kind(error: &TableError) -> Option<FetchErrorKind> {
    match error {
        TableError::Fetch { kind, .. } => Some(*kind),
        _ => None,
    }
}

// ============================================================================
// Request Parameters
// ============================================================================

#[tokio::test]
async fn test_first_page_sends_only_page_params() {
    let backend = MockBackend::start().await;
    let adapter = client(&backend).json_adapter("/api/notes/", SortMap::new());

    adapter.try_fetch(&TableQuery::new(5)).await.expect("fetch");

    let request = backend.last_request();
    assert_eq!(request.path, "/api/notes/");
    assert_eq!(request.params.len(), 2);
    assert_eq!(request.params["page"], "1");
    assert_eq!(request.params["page_size"], "5");
    assert!(!request.params.contains_key("search"));
    assert!(!request.params.contains_key("ordering"));
}

#[tokio::test]
async fn test_search_sort_page_and_filters_reach_backend() {
    let backend = MockBackend::start().await;
    let adapter = client(&backend).json_adapter("/api/notes/", SortMap::new());

    let mut query = TableQuery::new(2)
        .with_search("chem")
        .with_sort(SortEntry::desc("title"))
        .with_filter("status", "published");
    query.page_index = 1;

    let result = adapter.try_fetch(&query).await.expect("fetch");

    let request = backend.last_request();
    assert_eq!(request.params["page"], "2");
    assert_eq!(request.params["page_size"], "2");
    assert_eq!(request.params["search"], "chem");
    assert_eq!(request.params["ordering"], "-title");
    assert_eq!(request.params["status"], "published");

    // Published chemistry notes in reverse title order: Physical, Inorganic, Bio.
    assert_eq!(result.total_count, 3);
    assert_eq!(result.page_count, 2);
    assert_eq!(titles(&result.rows), vec!["Biochemistry"]);
}

#[tokio::test]
async fn test_sort_map_translates_column_to_backend_field() {
    let backend = MockBackend::start().await;
    let sort_map = SortMap::new().with("creator", "creator__first_name");
    let adapter = client(&backend).json_adapter("/api/notes/", sort_map);

    let query = TableQuery::new(12).with_sort(SortEntry::asc("creator"));
    let result = adapter.try_fetch(&query).await.expect("fetch");

    assert_eq!(
        backend.last_request().params["ordering"],
        "creator__first_name"
    );
    assert_eq!(result.rows.len(), 12);
    assert_eq!(result.rows[0]["creator"]["first_name"], "Ada");
    assert_eq!(result.rows[11]["creator"]["first_name"], "Linus");
}

// ============================================================================
// Response Normalization
// ============================================================================

#[tokio::test]
async fn test_page_envelope_is_normalized() {
    let backend = MockBackend::start().await;
    let adapter = client(&backend).json_adapter("/api/notes/", SortMap::new());

    let result = adapter.try_fetch(&TableQuery::new(5)).await.expect("fetch");

    assert_eq!(result.total_count, 12);
    assert_eq!(result.page_count, 3);
    assert_eq!(
        titles(&result.rows),
        vec![
            "Organic Chemistry",
            "Cell Biology",
            "Linear Algebra",
            "World History",
            "Inorganic Chemistry",
        ]
    );
}

#[tokio::test]
async fn test_last_page_is_partial() {
    let backend = MockBackend::start().await;
    let adapter = client(&backend).json_adapter("/api/notes/", SortMap::new());

    let mut query = TableQuery::new(5);
    query.page_index = 2;
    let result = adapter.try_fetch(&query).await.expect("fetch");

    assert_eq!(result.page_count, 3);
    assert_eq!(titles(&result.rows), vec!["Physical Chemistry", "Genetics"]);
}

#[tokio::test]
async fn test_bare_array_is_a_single_page() {
    let backend = MockBackend::start().await;
    let adapter = client(&backend).json_adapter("/api/tags/", SortMap::new());

    let result = adapter.try_fetch(&TableQuery::new(2)).await.expect("fetch");

    assert_eq!(result.total_count, 3);
    assert_eq!(result.page_count, 1);
    assert_eq!(result.rows.len(), 3);
}

#[tokio::test]
async fn test_typed_rows() {
    #[derive(Debug, Clone, Deserialize)]
    struct Note {
        id: u64,
        title: String,
    }

    let backend = MockBackend::start().await;
    let adapter = client(&backend).adapter::<Note>("/api/notes/", SortMap::new());

    let query = TableQuery::new(3).with_sort(SortEntry::desc("id"));
    let result = adapter.try_fetch(&query).await.expect("fetch");

    let ids: Vec<u64> = result.rows.iter().map(|note| note.id).collect();
    assert_eq!(ids, vec![12, 11, 10]);
    assert_eq!(result.rows[0].title, "Genetics");
}

#[tokio::test]
async fn test_repeated_fetch_is_idempotent() {
    let backend = MockBackend::start().await;
    let adapter = client(&backend).json_adapter("/api/notes/", SortMap::new());
    let query = TableQuery::new(4).with_search("o");

    let first = adapter.fetch_data(&query).await;
    let second = adapter.fetch_data(&query).await;

    assert_eq!(first, second);
    assert_eq!(backend.request_count("/api/notes/"), 2);
    let requests = backend.requests();
    assert_eq!(requests[0].params, requests[1].params);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_server_error_surfaces_as_server_kind() {
    let backend = MockBackend::start().await;
    let adapter = client(&backend).json_adapter("/api/broken/", SortMap::new());

    let error = adapter
        .try_fetch(&TableQuery::new(5))
        .await
        .expect_err("500 should fail");

    assert_eq!(fetch_kind(&error), Some(FetchErrorKind::Server));
    assert!(error.to_string().contains("500"));
}

#[tokio::test]
async fn test_server_error_degrades_to_empty_page() {
    let backend = MockBackend::start().await;
    let adapter = client(&backend).json_adapter("/api/broken/", SortMap::new());

    let result = adapter.fetch_data(&TableQuery::new(5)).await;

    assert!(result.is_empty());
    assert_eq!(result.total_count, 0);
    assert_eq!(result.page_count, 0);
    assert_eq!(backend.request_count("/api/broken/"), 1);
}

#[tokio::test]
async fn test_out_of_range_page_degrades_to_empty_page() {
    let backend = MockBackend::start().await;
    let adapter = client(&backend).json_adapter("/api/notes/", SortMap::new());

    let mut query = TableQuery::new(5);
    query.page_index = 9;

    let error = adapter.try_fetch(&query).await.expect_err("404 expected");
    assert_eq!(fetch_kind(&error), Some(FetchErrorKind::Client));

    let result = adapter.fetch_data(&query).await;
    assert!(result.is_empty());
}

#[tokio::test]
async fn test_non_json_body_is_a_decode_error() {
    let backend = MockBackend::start().await;
    let adapter = client(&backend).json_adapter("/api/garbled/", SortMap::new());

    let error = adapter
        .try_fetch(&TableQuery::new(5))
        .await
        .expect_err("HTML body should fail");

    assert_eq!(fetch_kind(&error), Some(FetchErrorKind::Decode));
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let backend = MockBackend::start_with_delay(Duration::from_millis(500)).await;
    let options = ClientOptions {
        access_token: None,
        timeout: Some(Duration::from_millis(50)),
    };
    let client = RestClient::new(&backend.base_url, options).expect("client");
    let adapter = client.json_adapter("/api/notes/", SortMap::new());

    let error = adapter
        .try_fetch(&TableQuery::new(5))
        .await
        .expect_err("request should time out");

    assert_eq!(fetch_kind(&error), Some(FetchErrorKind::Timeout));
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_missing_token_is_a_client_error() {
    let backend = MockBackend::start().await;
    let adapter = client(&backend).json_adapter("/api/private/notes/", SortMap::new());

    let error = adapter
        .try_fetch(&TableQuery::new(5))
        .await
        .expect_err("401 expected");

    assert_eq!(fetch_kind(&error), Some(FetchErrorKind::Client));
}

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let backend = MockBackend::start().await;
    let options = ClientOptions {
        access_token: Some(ACCESS_TOKEN.to_string()),
        timeout: None,
    };
    let client = RestClient::new(&backend.base_url, options).expect("client");
    let adapter = client.json_adapter("/api/private/notes/", SortMap::new());

    let result = adapter.try_fetch(&TableQuery::new(5)).await.expect("fetch");

    assert_eq!(result.total_count, 12);
    assert_eq!(result.rows.len(), 5);
}
