//! In-process Django-style list backend for integration tests.
//!
//! Serves a fixed catalog of notes over the Django REST list convention
//! (`page`, `page_size`, `search`, `ordering`, plus arbitrary field filters)
//! and records every request it sees.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::task::JoinHandle;

/// Token accepted by the private endpoint.
pub const ACCESS_TOKEN: &str = "test-token";

/// Titles of the seeded notes, in id order.
pub const TITLES: [&str; 12] = [
    "Organic Chemistry",
    "Cell Biology",
    "Linear Algebra",
    "World History",
    "Inorganic Chemistry",
    "Calculus I",
    "Physics: Mechanics",
    "Microeconomics",
    "Biochemistry",
    "Statistics",
    "Physical Chemistry",
    "Genetics",
];

const CREATORS: [&str; 4] = ["Ada", "Grace", "Linus", "Barbara"];

/// One request as seen by the backend.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Request path.
    pub path: String,
    /// Decoded query string.
    pub params: HashMap<String, String>,
}

#[derive(Clone)]
struct BackendState {
    notes: Arc<Vec<Value>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    delay: Duration,
}

impl BackendState {
    fn record(&self, path: &str, params: &HashMap<String, String>) {
        self.requests.lock().unwrap().push(RecordedRequest {
            path: path.to_string(),
            params: params.clone(),
        });
    }
}

/// A running mock backend. Stops when dropped.
pub struct MockBackend {
    /// Origin to point a `RestClient` at.
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    handle: JoinHandle<()>,
}

impl MockBackend {
    /// Starts a backend that answers immediately.
    pub async fn start() -> Self {
        Self::start_with_delay(Duration::ZERO).await
    }

    /// Starts a backend that waits before answering every list request.
    pub async fn start_with_delay(delay: Duration) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = BackendState {
            notes: Arc::new(seed_notes()),
            requests: Arc::clone(&requests),
            delay,
        };

        let router = Router::new()
            .route("/api/notes/", get(list_notes))
            .route("/api/tags/", get(list_tags))
            .route("/api/broken/", get(broken))
            .route("/api/private/notes/", get(list_private_notes))
            .route("/api/garbled/", get(garbled))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get local addr");

        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server failed");
        });

        Self {
            base_url: format!("http://{addr}"),
            requests,
            handle,
        }
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// The most recent request.
    pub fn last_request(&self) -> RecordedRequest {
        self.requests()
            .pop()
            .expect("backend has not received a request")
    }

    /// Number of requests received on the given path.
    pub fn request_count(&self, path: &str) -> usize {
        self.requests().iter().filter(|r| r.path == path).count()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn seed_notes() -> Vec<Value> {
    TITLES
        .iter()
        .enumerate()
        .map(|(i, title)| {
            json!({
                "id": i + 1,
                "title": title,
                "status": if i % 3 == 0 { "draft" } else { "published" },
                "creator": { "first_name": CREATORS[i % CREATORS.len()] },
            })
        })
        .collect()
}

async fn list_notes(
    State(state): State<BackendState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.record("/api/notes/", &params);
    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }
    paginate(&state.notes, &params)
}

async fn list_private_notes(
    State(state): State<BackendState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.record("/api/private/notes/", &params);
    let expected = format!("Bearer {ACCESS_TOKEN}");
    let authorized = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == expected);
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Authentication credentials were not provided."})),
        )
            .into_response();
    }
    paginate(&state.notes, &params)
}

async fn list_tags(
    State(state): State<BackendState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    state.record("/api/tags/", &params);
    Json(json!([
        {"id": 1, "name": "chemistry"},
        {"id": 2, "name": "biology"},
        {"id": 3, "name": "mathematics"},
    ]))
}

async fn broken(
    State(state): State<BackendState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.record("/api/broken/", &params);
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}

async fn garbled(
    State(state): State<BackendState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.record("/api/garbled/", &params);
    (StatusCode::OK, "<!DOCTYPE html><title>Login</title>").into_response()
}

/// Applies search, field filters, ordering and pagination the way a
/// `ModelViewSet` with `PageNumberPagination` would.
fn paginate(notes: &[Value], params: &HashMap<String, String>) -> Response {
    let mut rows: Vec<Value> = notes
        .iter()
        .filter(|note| matches_search(note, params.get("search")))
        .filter(|note| matches_filters(note, params))
        .cloned()
        .collect();

    if let Some(ordering) = params.get("ordering") {
        let (field, descending) = ordering
            .strip_prefix('-')
            .map_or((ordering.as_str(), false), |field| (field, true));
        rows.sort_by(|a, b| {
            let ordered = sort_key(a, field).cmp(&sort_key(b, field));
            if descending {
                ordered.reverse()
            } else {
                ordered
            }
        });
    }

    let page: usize = params
        .get("page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(1);
    let page_size: usize = params
        .get("page_size")
        .and_then(|p| p.parse().ok())
        .filter(|size| *size > 0)
        .unwrap_or(10);

    let count = rows.len();
    let last_page = count.div_ceil(page_size).max(1);
    if page == 0 || page > last_page {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"detail": "Invalid page."})),
        )
            .into_response();
    }

    let results: Vec<Value> = rows
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .collect();

    let next = (page < last_page).then(|| format!("?page={}", page + 1));
    let previous = (page > 1).then(|| format!("?page={}", page - 1));

    Json(json!({
        "count": count,
        "next": next,
        "previous": previous,
        "results": results,
    }))
    .into_response()
}

fn matches_search(note: &Value, search: Option<&String>) -> bool {
    search.map_or(true, |needle| {
        note["title"]
            .as_str()
            .unwrap_or_default()
            .to_lowercase()
            .contains(&needle.to_lowercase())
    })
}

fn matches_filters(note: &Value, params: &HashMap<String, String>) -> bool {
    params
        .iter()
        .filter(|(key, _)| !matches!(key.as_str(), "page" | "page_size" | "search" | "ordering"))
        .all(|(key, value)| match &note[key.as_str()] {
            Value::String(field) => field == value,
            Value::Number(field) => field.to_string() == *value,
            _ => false,
        })
}

fn sort_key(note: &Value, field: &str) -> String {
    match field {
        "id" => format!("{:08}", note["id"].as_u64().unwrap_or_default()),
        "creator__first_name" => note["creator"]["first_name"]
            .as_str()
            .unwrap_or_default()
            .to_string(),
        other => note[other].as_str().unwrap_or_default().to_string(),
    }
}
