//! In-process REST backend shared by the screen tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use school::{requests, Notification, SchoolAdmin, SchoolContext};
use schoolerp_client::{HttpApi, StaticToken, UiConfig};

pub const TOKEN: &str = "test-token";

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub auth: Option<String>,
}

#[derive(Default)]
pub struct Backend {
    tables: BTreeMap<String, Vec<Value>>,
    next_id: i64,
    pub calls: Vec<Call>,
    /// Status and body answered to every write while set.
    pub fail_writes: Option<(u16, Value)>,
    /// (file name, size) of each bulk upload received.
    pub uploads: Vec<(String, usize)>,
    /// Held before answering a create.
    pub write_delay: Option<Duration>,
}

impl Backend {
    /// Insert rows, assigning ids to rows without one.
    pub fn seed(&mut self, resource: &str, rows: Vec<Value>) {
        for row in rows {
            self.insert(resource, row);
        }
    }

    fn insert(&mut self, resource: &str, mut row: Value) -> Value {
        match row.get("id").and_then(Value::as_i64) {
            Some(id) => self.next_id = self.next_id.max(id),
            None => {
                self.next_id += 1;
                row["id"] = json!(self.next_id);
            }
        }
        self.tables.entry(resource.to_string()).or_default().push(row.clone());
        row
    }

    pub fn rows(&self, resource: &str) -> Vec<Value> {
        self.tables.get(resource).cloned().unwrap_or_default()
    }
}

pub type Shared = Arc<Mutex<Backend>>;

fn record(s: &Shared, method: &str, uri: &Uri, headers: &HeaderMap) {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    s.lock().unwrap().calls.push(Call {
        method: method.into(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        auth,
    });
}

fn failure(s: &Shared) -> Option<Response> {
    let (status, body) = s.lock().unwrap().fail_writes.clone()?;
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    Some((status, Json(body)).into_response())
}

fn text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Paginated envelope of the rows matching every non-paging query param.
fn list_rows(s: &Shared, resource: &str, q: &BTreeMap<String, String>) -> Value {
    let rows: Vec<Value> = s
        .lock()
        .unwrap()
        .rows(resource)
        .into_iter()
        .filter(|row| {
            q.iter()
                .filter(|(k, _)| !matches!(k.as_str(), "page" | "page_size" | "search"))
                .all(|(k, v)| row.get(k).map(text).as_deref() == Some(v.as_str()))
        })
        .collect();
    let total = rows.len();
    let page_size = q
        .get("page_size")
        .and_then(|v| v.parse().ok())
        .unwrap_or(total.max(1));
    let page = q.get("page").and_then(|v| v.parse::<usize>().ok()).unwrap_or(1).max(1);
    let items: Vec<Value> = rows.into_iter().skip((page - 1) * page_size).take(page_size).collect();
    let next = (page * page_size < total).then(|| format!("?page={}", page + 1));
    json!({ "count": total, "next": next, "previous": null, "results": items })
}

async fn list(
    State(s): State<Shared>,
    Path(resource): Path<String>,
    Query(q): Query<BTreeMap<String, String>>,
    uri: Uri,
    headers: HeaderMap,
) -> Json<Value> {
    record(&s, "GET", &uri, &headers);
    Json(list_rows(&s, &resource, &q))
}

async fn create(
    State(s): State<Shared>,
    Path(resource): Path<String>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record(&s, "POST", &uri, &headers);
    let delay = s.lock().unwrap().write_delay;
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    if let Some(resp) = failure(&s) {
        return resp;
    }
    let row = s.lock().unwrap().insert(&resource, body);
    (StatusCode::CREATED, Json(row)).into_response()
}

async fn get_one(
    State(s): State<Shared>,
    Path((resource, id)): Path<(String, i64)>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    record(&s, "GET", &uri, &headers);
    let row = s
        .lock()
        .unwrap()
        .rows(&resource)
        .into_iter()
        .find(|r| r["id"] == json!(id));
    match row {
        Some(row) => Json(row).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not found." }))).into_response(),
    }
}

async fn update(
    State(s): State<Shared>,
    Path((resource, id)): Path<(String, i64)>,
    uri: Uri,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    record(&s, "PUT", &uri, &headers);
    if let Some(resp) = failure(&s) {
        return resp;
    }
    let mut b = s.lock().unwrap();
    let table = b.tables.entry(resource).or_default();
    match table.iter_mut().find(|r| r["id"] == json!(id)) {
        Some(row) => {
            body["id"] = json!(id);
            *row = body.clone();
            Json(body).into_response()
        }
        None => (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not found." }))).into_response(),
    }
}

async fn remove(
    State(s): State<Shared>,
    Path((resource, id)): Path<(String, i64)>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    record(&s, "DELETE", &uri, &headers);
    if let Some(resp) = failure(&s) {
        return resp;
    }
    let mut b = s.lock().unwrap();
    let table = b.tables.entry(resource).or_default();
    let before = table.len();
    table.retain(|r| r["id"] != json!(id));
    if table.len() < before {
        StatusCode::NO_CONTENT.into_response()
    } else {
        (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not found." }))).into_response()
    }
}

async fn list_notices(
    State(s): State<Shared>,
    Query(q): Query<BTreeMap<String, String>>,
    uri: Uri,
    headers: HeaderMap,
) -> Json<Value> {
    record(&s, "GET", &uri, &headers);
    Json(list_rows(&s, "notices", &q))
}

/// Multipart notice create; the attachment is stored as `"{name}:{size}"`.
async fn create_notice(State(s): State<Shared>, uri: Uri, headers: HeaderMap, mut mp: Multipart) -> Response {
    record(&s, "POST", &uri, &headers);
    let mut row = serde_json::Map::new();
    while let Ok(Some(field)) = mp.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let bytes = field.bytes().await.unwrap_or_default();
                row.insert(name, json!(format!("{}:{}", file_name, bytes.len())));
            }
            None => {
                row.insert(name, json!(field.text().await.unwrap_or_default()));
            }
        }
    }
    if let Some(resp) = failure(&s) {
        return resp;
    }
    let row = s.lock().unwrap().insert("notices", Value::Object(row));
    (StatusCode::CREATED, Json(row)).into_response()
}

/// Accepts one spreadsheet and pretends it held two valid rows and one bad
/// one.
async fn bulk_upload(State(s): State<Shared>, uri: Uri, headers: HeaderMap, mut mp: Multipart) -> Response {
    record(&s, "POST", &uri, &headers);
    let mut received = None;
    while let Ok(Some(field)) = mp.next_field().await {
        if field.name() == Some("file") {
            let name = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await.unwrap_or_default();
            received = Some((name, bytes.len()));
        }
    }
    let Some(file) = received else {
        return (StatusCode::BAD_REQUEST, Json(json!({ "file": ["No file was submitted."] }))).into_response();
    };
    if let Some(resp) = failure(&s) {
        return resp;
    }
    let mut b = s.lock().unwrap();
    b.uploads.push(file);
    for (first, last) in [("Ram", "Thapa"), ("Sita", "Gurung")] {
        b.insert(
            "students",
            json!({ "first_name": first, "last_name": last, "student_class": 1, "section": 1, "status": "active" }),
        );
    }
    Json(json!({ "created": 2, "errors": ["row 4: student_class is required"] })).into_response()
}

pub async fn start() -> (String, Shared) {
    let state: Shared = Arc::new(Mutex::new(Backend::default()));
    let app = Router::new()
        .route("/api/notices/", get(list_notices).post(create_notice))
        .route("/api/students/bulk-upload/", post(bulk_upload))
        .route("/api/{resource}/", get(list).post(create))
        .route("/api/{resource}/{id}/", get(get_one).put(update).delete(remove))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}/api", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (base, state)
}

/// Group #1 holding `codes`.
pub fn group(codes: &[&str]) -> Value {
    let permissions: Vec<Value> = codes
        .iter()
        .enumerate()
        .map(|(i, code)| json!({ "id": i + 1, "name": code, "codename": code }))
        .collect();
    json!({ "id": 1, "name": "Staff", "permissions": permissions })
}

pub struct Harness {
    pub admin: SchoolAdmin,
    pub backend: Shared,
}

fn ui() -> UiConfig {
    UiConfig {
        filter_debounce_ms: 40,
        page_size: 25,
    }
}

async fn boot(base: String, backend: Shared, configure: impl FnOnce(SchoolContext) -> SchoolContext) -> Harness {
    let api = HttpApi::new(base, Arc::new(StaticToken::new(TOKEN)));
    let ctx = configure(SchoolContext::new(Arc::new(api)).with_ui(ui()));
    let admin = SchoolAdmin::new(ctx);
    admin.emit(requests::INITIALIZE, ()).await;
    Harness { admin, backend }
}

/// Signed in as a member of group #1 holding `codes`.
pub async fn signed_in(codes: &[&str]) -> Harness {
    let (base, backend) = start().await;
    backend.lock().unwrap().seed("groups", vec![group(codes)]);
    boot(base, backend, |ctx| ctx.with_group(1)).await
}

/// Signed in with a group the server does not know.
pub async fn unknown_group() -> Harness {
    let (base, backend) = start().await;
    boot(base, backend, |ctx| ctx.with_group(99)).await
}

pub async fn superuser() -> Harness {
    let (base, backend) = start().await;
    boot(base, backend, |ctx| ctx.with_superuser(true)).await
}

impl Harness {
    pub fn seed(&self, resource: &str, rows: Vec<Value>) {
        self.backend.lock().unwrap().seed(resource, rows);
    }

    pub fn rows(&self, resource: &str) -> Vec<Value> {
        self.backend.lock().unwrap().rows(resource)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.backend.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.backend.lock().unwrap().calls.clear();
    }

    /// Every non-GET call as `"METHOD /path"`.
    pub fn writes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.method != "GET")
            .map(|c| format!("{} {}", c.method, c.path))
            .collect()
    }

    pub fn count(&self, method: &str, path: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.method == method && c.path == path)
            .count()
    }

    pub fn fail_writes(&self, status: u16, body: Value) {
        self.backend.lock().unwrap().fail_writes = Some((status, body));
    }

    pub fn slow_writes(&self, delay: Duration) {
        self.backend.lock().unwrap().write_delay = Some(delay);
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.admin.notifications()
    }
}
