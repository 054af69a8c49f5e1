//! End-to-end tests for the table driver over HTTP.
//!
//! Each test mounts a `ServerDataTable` against the mock backend and drives
//! it the way a page would: typing, paging, sorting, and changing filters.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::MockBackend;
use serde_json::Value;
use tokio::time::timeout;
use tutorlix_client::{ClientOptions, RestClient};
use tutorlix_render::{render, Column, OutputFormat};
use tutorlix_table::{
    ExtraFilters, FilterValue, ServerDataTable, SortMap, TableOptions, TableSnapshot, TableStatus,
};

const OPTIONS: TableOptions = TableOptions {
    page_size: 5,
    debounce: Duration::from_millis(50),
};

fn mount(backend: &MockBackend, path: &str) -> ServerDataTable {
    mount_with(backend, path, ExtraFilters::new())
}

fn mount_with(backend: &MockBackend, path: &str, dependencies: ExtraFilters) -> ServerDataTable {
    let client = RestClient::new(&backend.base_url, ClientOptions::default()).expect("client");
    let adapter = Arc::new(client.json_adapter(path, SortMap::new()));
    ServerDataTable::spawn_with_dependencies(adapter, OPTIONS, dependencies)
}

async fn settled(table: &ServerDataTable) -> TableSnapshot {
    timeout(Duration::from_secs(5), table.wait_until_settled())
        .await
        .expect("table did not settle in time")
        .expect("table driver stopped")
}

fn first_title(snapshot: &TableSnapshot) -> &str {
    snapshot.rows[0]["title"].as_str().unwrap_or_default()
}

fn status_filter(value: &str) -> ExtraFilters {
    let mut filters = ExtraFilters::new();
    filters.insert("status".to_string(), FilterValue::from(value));
    filters
}

#[tokio::test]
async fn test_mount_loads_first_page() {
    let backend = MockBackend::start().await;
    let table = mount(&backend, "/api/notes/");

    let snapshot = settled(&table).await;

    assert_eq!(snapshot.status, TableStatus::Loaded);
    assert_eq!(snapshot.rows.len(), 5);
    assert_eq!(snapshot.total_count, 12);
    assert_eq!(snapshot.page_count, 3);
    assert_eq!((snapshot.showing_from, snapshot.showing_to), (1, 5));
    assert!(!snapshot.can_previous_page);
    assert!(snapshot.can_next_page);
    assert_eq!(backend.request_count("/api/notes/"), 1);
}

#[tokio::test]
async fn test_paging_to_the_last_page_and_back() {
    let backend = MockBackend::start().await;
    let table = mount(&backend, "/api/notes/");
    settled(&table).await;

    for _ in 0..3 {
        table.next_page().expect("send");
        settled(&table).await;
    }

    let last = table.snapshot();
    assert_eq!(last.page_index, 2);
    assert_eq!(last.rows.len(), 2);
    assert_eq!((last.showing_from, last.showing_to), (11, 12));
    assert!(!last.can_next_page);
    // The third next_page was a no-op on the last page.
    assert_eq!(backend.request_count("/api/notes/"), 3);

    table.previous_page().expect("send");
    let back = settled(&table).await;
    assert_eq!(back.page_index, 1);
    assert_eq!(backend.last_request().params["page"], "2");
}

#[tokio::test]
async fn test_typing_commits_one_search_and_resets_page() {
    let backend = MockBackend::start().await;
    let table = mount(&backend, "/api/notes/");
    settled(&table).await;

    table.next_page().expect("send");
    settled(&table).await;

    table.set_search("chem").expect("send");
    table.set_search("chemis").expect("send");
    table.set_search("chemistry").expect("send");
    let snapshot = settled(&table).await;

    assert_eq!(snapshot.search, "chemistry");
    assert_eq!(snapshot.page_index, 0);
    assert_eq!(snapshot.total_count, 4);
    assert_eq!(snapshot.page_count, 1);

    let searches: Vec<String> = backend
        .requests()
        .iter()
        .filter_map(|r| r.params.get("search").cloned())
        .collect();
    assert_eq!(searches, vec!["chemistry".to_string()]);
    assert_eq!(backend.last_request().params["page"], "1");
}

#[tokio::test]
async fn test_sort_cycles_through_ascending_descending_and_off() {
    let backend = MockBackend::start().await;
    let table = mount(&backend, "/api/notes/");
    settled(&table).await;

    table.toggle_sort("title").expect("send");
    let ascending = settled(&table).await;
    assert_eq!(first_title(&ascending), "Biochemistry");
    assert_eq!(backend.last_request().params["ordering"], "title");

    table.toggle_sort("title").expect("send");
    let descending = settled(&table).await;
    assert_eq!(first_title(&descending), "World History");
    assert_eq!(backend.last_request().params["ordering"], "-title");

    table.toggle_sort("title").expect("send");
    let unsorted = settled(&table).await;
    assert!(unsorted.sorting.is_empty());
    assert_eq!(first_title(&unsorted), "Organic Chemistry");
    assert!(!backend.last_request().params.contains_key("ordering"));
}

#[tokio::test]
async fn test_dependencies_filter_and_refetch() {
    let backend = MockBackend::start().await;
    let table = mount_with(&backend, "/api/notes/", status_filter("published"));

    let published = settled(&table).await;
    assert_eq!(published.total_count, 8);
    assert_eq!(backend.last_request().params["status"], "published");

    table.set_dependencies(status_filter("draft")).expect("send");
    let drafts = settled(&table).await;
    assert_eq!(drafts.total_count, 4);
    assert_eq!(backend.request_count("/api/notes/"), 2);
    assert!(drafts
        .rows
        .iter()
        .all(|row| row["status"] == Value::from("draft")));
}

#[tokio::test]
async fn test_refresh_refetches_current_query() {
    let backend = MockBackend::start().await;
    let table = mount(&backend, "/api/notes/");
    let before = settled(&table).await;

    table.refresh().expect("send");
    let after = settled(&table).await;

    assert!(after.generation > before.generation);
    assert_eq!(after.rows, before.rows);
    assert_eq!(backend.request_count("/api/notes/"), 2);
}

#[tokio::test]
async fn test_backend_failure_shows_empty_state() {
    let backend = MockBackend::start().await;
    let table = mount(&backend, "/api/broken/");

    let snapshot = settled(&table).await;

    assert_eq!(snapshot.status, TableStatus::Empty);
    assert!(snapshot.rows.is_empty());
    assert_eq!(snapshot.total_count, 0);
    assert!(snapshot
        .last_error
        .as_deref()
        .is_some_and(|e| e.contains("500")));
}

#[tokio::test]
async fn test_settled_snapshot_renders() {
    let backend = MockBackend::start().await;
    let table = mount(&backend, "/api/notes/");
    table.toggle_sort("title").expect("send");
    let snapshot = settled(&table).await;

    let columns = Column::parse_list("id,title");
    let output = render(&snapshot, &columns, OutputFormat::Markdown).expect("render");

    assert!(output.starts_with("| id | title ↑ |\n| --- | --- |\n"));
    assert!(output.contains("| 9 | Biochemistry |"));
    assert!(output.ends_with("Showing 1 to 5 of 12 records · Page 1 / 3\n"));
}
