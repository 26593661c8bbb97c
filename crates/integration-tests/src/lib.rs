//! Integration tests for the Shoebox data layer.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shoebox-integration-tests
//! ```
//!
//! No external services are needed: [`FakeRemote`] serves the subset of the
//! hosted table and object store API the adapter uses, on an ephemeral
//! localhost port.
//!
//! # Test Categories
//!
//! - `remote_path` - Requests served by the remote store
//! - `fallback_path` - Requests served locally when the remote store is down,
//!   unconfigured, slow or rejects the payload
//! - `properties` - Behaviour that must hold whichever store serves a request

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{TimeDelta, TimeZone, Utc};
use secrecy::SecretString;
use serde_json::{Map, Value, json};
use shoebox_admin::config::RemoteConfig;
use shoebox_admin::fallback::LocalStorage;
use shoebox_admin::remote::RemoteClient;
use shoebox_admin::services::DataLayer;

/// API key the fake store accepts.
pub const API_KEY: &str = "test-anon-key-7Qz1xVb9";

const USER_COLUMNS: &[&str] = &[
    "id",
    "created_at",
    "name",
    "gmail",
    "phone_number",
    "phone2",
    "pin",
    "city",
    "country",
    "points",
    "role",
    "password",
];

const PRODUCT_COLUMNS: &[&str] = &[
    "id",
    "created_at",
    "product_title",
    "description",
    "image_url",
    "price",
    "sku",
    "category",
    "colour",
    "size_6",
    "size_7",
    "size_8",
    "size_9",
    "size_10",
    "size_11",
];

/// One request the fake store received.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub table: String,
    pub query: HashMap<String, String>,
    pub body: Option<Value>,
}

#[derive(Default)]
struct FakeState {
    tables: Mutex<HashMap<String, Vec<Map<String, Value>>>>,
    objects: Mutex<HashMap<String, (String, Vec<u8>)>>,
    requests: Mutex<Vec<RecordedRequest>>,
    fail_with: Mutex<Option<StatusCode>>,
    fail_writes: Mutex<Option<StatusCode>>,
    delay: Mutex<Option<Duration>>,
    next_id: AtomicU64,
}

impl FakeState {
    fn record(&self, request: RecordedRequest) {
        self.requests.lock().unwrap().push(request);
    }

    /// Response short-circuiting the request, if any. `write` marks requests
    /// that change stored rows or objects.
    async fn gate(&self, headers: &HeaderMap, write: bool) -> Option<Response> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(status) = *self.fail_with.lock().unwrap() {
            return Some(error(status, "forced failure"));
        }
        if write && let Some(status) = *self.fail_writes.lock().unwrap() {
            return Some(error(status, "forced write failure"));
        }

        let bearer = format!("Bearer {API_KEY}");
        let authorised = headers.get("apikey").is_some_and(|v| v == API_KEY)
            && headers
                .get("authorization")
                .is_some_and(|v| v == bearer.as_str());
        if !authorised {
            return Some(error(StatusCode::UNAUTHORIZED, "Invalid API key"));
        }
        None
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn columns(table: &str) -> Option<&'static [&'static str]> {
    match table {
        "custom_users" => Some(USER_COLUMNS),
        "products" => Some(PRODUCT_COLUMNS),
        _ => None,
    }
}

fn unknown_column(table: &str, body: &Map<String, Value>) -> Option<String> {
    let known = columns(table)?;
    body.keys().find(|k| !known.contains(&k.as_str())).cloned()
}

fn id_filter(query: &HashMap<String, String>) -> Option<String> {
    query
        .get("id")
        .and_then(|f| f.strip_prefix("eq."))
        .map(String::from)
}

fn same_id(row: &Map<String, Value>, id: &str) -> bool {
    match row.get("id") {
        Some(Value::String(s)) => s == id,
        Some(Value::Number(n)) => n.to_string() == id,
        _ => false,
    }
}

async fn list_rows(
    State(state): State<Arc<FakeState>>,
    Path(table): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if let Some(response) = state.gate(&headers, false).await {
        return response;
    }
    state.record(RecordedRequest {
        method: "GET",
        table: table.clone(),
        query: query.clone(),
        body: None,
    });
    if columns(&table).is_none() {
        return error(StatusCode::NOT_FOUND, "relation does not exist");
    }

    let mut rows = state
        .tables
        .lock()
        .unwrap()
        .get(&table)
        .cloned()
        .unwrap_or_default();
    if query.get("order").map(String::as_str) == Some("created_at.desc") {
        rows.sort_by(|a, b| {
            let key = |r: &Map<String, Value>| {
                r.get("created_at")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };
            key(b).cmp(&key(a))
        });
    }
    Json(rows).into_response()
}

async fn insert_row(
    State(state): State<Arc<FakeState>>,
    Path(table): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Map<String, Value>>,
) -> Response {
    if let Some(response) = state.gate(&headers, true).await {
        return response;
    }
    state.record(RecordedRequest {
        method: "POST",
        table: table.clone(),
        query: HashMap::new(),
        body: Some(Value::Object(body.clone())),
    });
    if columns(&table).is_none() {
        return error(StatusCode::NOT_FOUND, "relation does not exist");
    }
    if let Some(column) = unknown_column(&table, &body) {
        return error(
            StatusCode::BAD_REQUEST,
            &format!("Could not find the '{column}' column of '{table}'"),
        );
    }
    if table == "products" {
        for required in ["product_title", "sku", "price"] {
            if body.get(required).is_none_or(Value::is_null) {
                return error(
                    StatusCode::BAD_REQUEST,
                    &format!("null value in column \"{required}\" violates not-null constraint"),
                );
            }
        }
    }

    let n = state.next_id.fetch_add(1, Ordering::SeqCst) + 1;
    let mut row = body;
    row.insert("id".to_string(), json!(format!("r{n}")));
    row.insert("created_at".to_string(), json!(timestamp(n)));
    state
        .tables
        .lock()
        .unwrap()
        .entry(table)
        .or_default()
        .push(row.clone());

    let single = headers
        .get("accept")
        .is_some_and(|v| v == "application/vnd.pgrst.object+json");
    let representation = headers
        .get("prefer")
        .is_some_and(|v| v == "return=representation");
    if !representation {
        return StatusCode::CREATED.into_response();
    }
    if single {
        (StatusCode::CREATED, Json(Value::Object(row))).into_response()
    } else {
        (StatusCode::CREATED, Json(json!([row]))).into_response()
    }
}

async fn update_rows(
    State(state): State<Arc<FakeState>>,
    Path(table): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Map<String, Value>>,
) -> Response {
    if let Some(response) = state.gate(&headers, true).await {
        return response;
    }
    state.record(RecordedRequest {
        method: "PATCH",
        table: table.clone(),
        query: query.clone(),
        body: Some(Value::Object(body.clone())),
    });
    if let Some(column) = unknown_column(&table, &body) {
        return error(
            StatusCode::BAD_REQUEST,
            &format!("Could not find the '{column}' column of '{table}'"),
        );
    }
    let Some(id) = id_filter(&query) else {
        return error(StatusCode::BAD_REQUEST, "UPDATE requires a WHERE clause");
    };

    let mut updated = Vec::new();
    if let Some(rows) = state.tables.lock().unwrap().get_mut(&table) {
        for row in rows.iter_mut().filter(|r| same_id(r, &id)) {
            row.extend(body.clone());
            updated.push(row.clone());
        }
    }

    let representation = headers
        .get("prefer")
        .is_some_and(|v| v == "return=representation");
    if representation {
        Json(updated).into_response()
    } else {
        StatusCode::NO_CONTENT.into_response()
    }
}

async fn delete_rows(
    State(state): State<Arc<FakeState>>,
    Path(table): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if let Some(response) = state.gate(&headers, true).await {
        return response;
    }
    state.record(RecordedRequest {
        method: "DELETE",
        table: table.clone(),
        query: query.clone(),
        body: None,
    });
    let Some(id) = id_filter(&query) else {
        return error(StatusCode::BAD_REQUEST, "DELETE requires a WHERE clause");
    };

    if let Some(rows) = state.tables.lock().unwrap().get_mut(&table) {
        rows.retain(|r| !same_id(r, &id));
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn upload_object(
    State(state): State<Arc<FakeState>>,
    Path((bucket, path)): Path<(String, String)>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Response {
    if let Some(response) = state.gate(&headers, true).await {
        return response;
    }
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    let key = format!("{bucket}/{path}");

    let mut objects = state.objects.lock().unwrap();
    if objects.contains_key(&key) {
        return error(StatusCode::CONFLICT, "The resource already exists");
    }
    objects.insert(key.clone(), (content_type, body.to_vec()));
    (StatusCode::OK, Json(json!({ "Key": key }))).into_response()
}

/// Distinct, increasing creation times.
fn timestamp(n: u64) -> String {
    let base = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    let offset = TimeDelta::seconds(i64::try_from(n).unwrap());
    (base + offset).to_rfc3339()
}

/// In-process stand-in for the hosted store.
pub struct FakeRemote {
    pub base_url: String,
    state: Arc<FakeState>,
    server: tokio::task::JoinHandle<()>,
}

impl Drop for FakeRemote {
    fn drop(&mut self) {
        self.server.abort();
    }
}

impl FakeRemote {
    /// Start serving on an ephemeral localhost port.
    pub async fn start() -> Self {
        let state = Arc::new(FakeState::default());
        let app = Router::new()
            .route(
                "/rest/v1/{table}",
                get(list_rows)
                    .post(insert_row)
                    .patch(update_rows)
                    .delete(delete_rows),
            )
            .route("/storage/v1/object/{bucket}/{*path}", post(upload_object))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake remote");
        let addr = listener.local_addr().expect("Failed to read local address");
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
            server,
        }
    }

    /// Remote configuration pointing at this fake with the accepted key.
    pub fn config(&self) -> RemoteConfig {
        RemoteConfig::new(&self.base_url, SecretString::from(API_KEY)).unwrap()
    }

    pub fn client(&self) -> RemoteClient {
        RemoteClient::new(&self.config()).unwrap()
    }

    /// Data layer using this fake and fresh in-memory local storage.
    pub fn layer(&self) -> DataLayer {
        self.layer_with(LocalStorage::memory())
    }

    pub fn layer_with(&self, storage: LocalStorage) -> DataLayer {
        DataLayer::new(Some(self.client()), storage)
    }

    /// Put a row straight into a table, bypassing column checks.
    pub fn seed_row(&self, table: &str, row: Value) {
        let Value::Object(row) = row else {
            panic!("rows are objects");
        };
        self.state
            .tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .push(row);
    }

    /// Current rows of a table, in insertion order.
    pub fn rows(&self, table: &str) -> Vec<Map<String, Value>> {
        self.state
            .tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Stored object as `(content type, bytes)`.
    pub fn object(&self, key: &str) -> Option<(String, Vec<u8>)> {
        self.state.objects.lock().unwrap().get(key).cloned()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Answer every request with `status` until cleared with `None`.
    pub fn fail_with(&self, status: Option<StatusCode>) {
        *self.state.fail_with.lock().unwrap() = status;
    }

    /// Fail every insert, update, delete and upload with `status` while
    /// reads keep working; `None` restores normal service.
    pub fn fail_writes(&self, status: Option<StatusCode>) {
        *self.state.fail_writes.lock().unwrap() = status;
    }

    /// Hold every response for `delay`.
    pub fn delay(&self, delay: Option<Duration>) {
        *self.state.delay.lock().unwrap() = delay;
    }
}

/// Configuration whose remote store refuses connections.
pub fn unreachable_config() -> RemoteConfig {
    RemoteConfig::new("http://127.0.0.1:9", SecretString::from(API_KEY))
        .unwrap()
        .with_timeout(Duration::from_secs(2))
}
