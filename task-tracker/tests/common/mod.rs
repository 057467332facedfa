#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use task_tracker::store::Store;
use task_tracker::web::{AppState, create_router};
use tower::ServiceExt;

/// Test context for endpoint tests backed by a data file in a temporary directory.
pub struct TestContext {
    /// Kept so the directory outlives the test.
    pub dir: tempfile::TempDir,
    pub data_file: PathBuf,
    pub state: Arc<AppState>,
}

impl TestContext {
    pub fn app(&self) -> Router {
        create_router(self.state.clone())
    }

    /// Reads the data file as it currently is on disk.
    pub fn persisted(&self) -> Value {
        let contents = std::fs::read_to_string(&self.data_file).expect("Failed to read data file");
        serde_json::from_str(&contents).expect("Data file is not valid JSON")
    }
}

pub fn setup() -> TestContext {
    setup_with(|state| state)
}

pub fn setup_with(configure: impl FnOnce(AppState) -> AppState) -> TestContext {
    // Allow multiple calls to init for tests.
    let _ = tracing_subscriber::fmt().try_init();
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let data_file = dir.path().join("data.json");
    let store = Store::open(&data_file);
    store.initialize().expect("Failed to initialize store");
    let state = Arc::new(configure(AppState::new(store)));
    TestContext {
        dir,
        data_file,
        state,
    }
}

/// Response parts collected from a single request.
pub struct JsonResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> JsonResponse {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    JsonResponse {
        status,
        headers,
        body,
    }
}

pub async fn get(app: Router, uri: &str) -> JsonResponse {
    send(app, Method::GET, uri, None).await
}

pub async fn post(app: Router, uri: &str, body: Value) -> JsonResponse {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn put(app: Router, uri: &str, body: Value) -> JsonResponse {
    send(app, Method::PUT, uri, Some(body)).await
}

pub async fn delete(app: Router, uri: &str) -> JsonResponse {
    send(app, Method::DELETE, uri, None).await
}

/// HTTP response snapshot for testing endpoints.
#[derive(Debug, Serialize)]
pub struct HttpResponseSnapshot {
    test_context: String,
    status: u16,
    headers: BTreeMap<String, String>,
    json_body: Value,
}

impl HttpResponseSnapshot {
    /// Create a new HTTP response snapshot.
    pub fn new(response: &JsonResponse, test_context: &str) -> Self {
        Self {
            test_context: test_context.to_string(),
            status: response.status.as_u16(),
            headers: filter_variable_headers(&response.headers),
            json_body: response.body.clone(),
        }
    }
}

/// Filter out variable headers from response headers for snapshot testing.
fn filter_variable_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let variable_headers = ["date", "content-length", "vary"];

    headers
        .iter()
        .filter_map(|(name, value)| {
            let name_str = name.as_str().to_lowercase();
            if variable_headers.contains(&name_str.as_str()) {
                None
            } else {
                value.to_str().ok().map(|v| (name_str, v.to_string()))
            }
        })
        .collect()
}
