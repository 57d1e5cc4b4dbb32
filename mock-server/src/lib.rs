//! In-memory stand-in for the waitinglist.dev service.
//!
//! Serves the four `/api/v1` endpoints the client talks to, authenticates by
//! the `api_key` query parameter and can be told to fail upcoming requests
//! through a `MockHandle`.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use axum::{
    extract::{rejection::JsonRejection, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;
use uuid::Uuid;

pub const DEFAULT_API_KEY: &str = "wl_test_key";
pub const PROJECT_ID: &str = "proj_mock";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Detail {
    pub field: String,
    pub message: String,
}

/// A stored signup, including the tokens a confirmation email would carry.
#[derive(Clone, Debug)]
pub struct Entry {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub tags: Vec<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub position: u64,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub verification_token: String,
    pub unsubscribe_token: String,
}

#[derive(Serialize)]
struct EntryView<'a> {
    id: String,
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<&'a str>,
    position: u64,
    is_verified: bool,
    created_at: DateTime<Utc>,
}

impl<'a> From<&'a Entry> for EntryView<'a> {
    fn from(entry: &'a Entry) -> Self {
        Self {
            id: entry.id.to_string(),
            email: &entry.email,
            name: entry.name.as_deref(),
            phone: entry.phone.as_deref(),
            position: entry.position,
            is_verified: entry.is_verified,
            created_at: entry.created_at,
        }
    }
}

#[derive(Deserialize)]
pub struct SignupBody {
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
}

#[derive(Deserialize)]
pub struct TokenBody {
    pub token: String,
}

#[derive(Clone, Debug)]
struct Fault {
    status: StatusCode,
    body: Value,
}

#[derive(Default)]
struct Store {
    entries: Vec<Entry>,
    next_position: u64,
}

struct Inner {
    api_key: String,
    store: RwLock<Store>,
    faults: Mutex<VecDeque<Fault>>,
    hits: Mutex<HashMap<String, usize>>,
}

/// Shared view of a running mock, for arranging faults and inspecting state.
#[derive(Clone)]
pub struct MockHandle {
    inner: Arc<Inner>,
}

impl MockHandle {
    /// Answer the next request with `status` and a generic error body,
    /// before authentication runs. Queued faults are consumed in order.
    pub fn fail_next(&self, status: u16) {
        let body = json!({ "success": false, "error": "injected_failure" });
        self.fail_next_with(status, body);
    }

    pub fn fail_next_with(&self, status: u16, body: Value) {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        lock(&self.inner.faults).push_back(Fault { status, body });
    }

    /// Requests received on `path`, including rejected ones.
    pub fn hits(&self, path: &str) -> usize {
        lock(&self.inner.hits).get(path).copied().unwrap_or(0)
    }

    pub async fn entries(&self) -> Vec<Entry> {
        self.inner.store.read().await.entries.clone()
    }

    pub async fn entry(&self, email: &str) -> Option<Entry> {
        self.inner
            .store
            .read()
            .await
            .entries
            .iter()
            .find(|e| e.email.eq_ignore_ascii_case(email))
            .cloned()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug)]
pub enum MockError {
    Unauthorized,
    BadRequest(String),
    Validation(Vec<Detail>),
    Duplicate,
    UnknownToken,
    Injected(StatusCode, Value),
}

impl IntoResponse for MockError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            MockError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "success": false, "error": "unauthorized", "message": "Invalid API key" }),
            ),
            MockError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                json!({ "success": false, "error": "bad_request", "message": message }),
            ),
            MockError::Validation(details) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "success": false, "error": "validation_failed", "details": details }),
            ),
            MockError::Duplicate => (
                StatusCode::CONFLICT,
                json!({
                    "success": false,
                    "error": "already_registered",
                    "message": "This email is already on the waitlist",
                }),
            ),
            MockError::UnknownToken => (
                StatusCode::NOT_FOUND,
                json!({ "success": false, "error": "invalid_token", "message": "Token not found" }),
            ),
            MockError::Injected(status, body) => (status, body),
        };
        (status, Json(body)).into_response()
    }
}

/// Router for the mock service, authenticating with `api_key`.
pub fn app(api_key: &str) -> Router {
    app_with_handle(api_key).0
}

pub fn app_with_handle(api_key: &str) -> (Router, MockHandle) {
    let handle = MockHandle {
        inner: Arc::new(Inner {
            api_key: api_key.to_string(),
            store: RwLock::new(Store::default()),
            faults: Mutex::new(VecDeque::new()),
            hits: Mutex::new(HashMap::new()),
        }),
    };
    let router = Router::new()
        .route("/api/v1/signup", post(signup))
        .route("/api/v1/project", get(project))
        .route("/api/v1/verify", post(verify))
        .route("/api/v1/unsubscribe", post(unsubscribe))
        .layer(middleware::from_fn_with_state(handle.clone(), gate))
        .with_state(handle.clone());
    (router, handle)
}

pub async fn serve(listener: TcpListener, router: Router) -> Result<(), std::io::Error> {
    axum::serve(listener, router).await
}

pub async fn run(listener: TcpListener, api_key: &str) -> Result<(), std::io::Error> {
    serve(listener, app(api_key)).await
}

async fn gate(
    State(mock): State<MockHandle>,
    Query(params): Query<HashMap<String, String>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    *lock(&mock.inner.hits).entry(path.clone()).or_default() += 1;

    let fault = lock(&mock.inner.faults).pop_front();
    if let Some(fault) = fault {
        debug!(%path, status = fault.status.as_u16(), "injecting failure");
        return MockError::Injected(fault.status, fault.body).into_response();
    }

    if params.get("api_key").map(String::as_str) != Some(mock.inner.api_key.as_str()) {
        return MockError::Unauthorized.into_response();
    }
    next.run(request).await
}

fn validate(body: &SignupBody) -> Vec<Detail> {
    let mut details = Vec::new();
    let valid_email = body
        .email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.') && !domain.ends_with('.'));
    if !valid_email {
        details.push(Detail {
            field: "email".to_string(),
            message: "Invalid email address".to_string(),
        });
    }
    if let Some(phone) = body.phone.as_deref() {
        let digits = phone.chars().filter(char::is_ascii_digit).count();
        if !(10..=15).contains(&digits) {
            details.push(Detail {
                field: "phone".to_string(),
                message: "Invalid phone number".to_string(),
            });
        }
    }
    details
}

async fn signup(
    State(mock): State<MockHandle>,
    body: Result<Json<SignupBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), MockError> {
    let Json(body) = body.map_err(|e| MockError::BadRequest(e.body_text()))?;
    let details = validate(&body);
    if !details.is_empty() {
        return Err(MockError::Validation(details));
    }

    let mut store = mock.inner.store.write().await;
    if store.entries.iter().any(|e| e.email.eq_ignore_ascii_case(&body.email)) {
        return Err(MockError::Duplicate);
    }
    store.next_position += 1;
    let entry = Entry {
        id: Uuid::new_v4(),
        email: body.email,
        name: body.name,
        phone: body.phone,
        tags: body.tags,
        user_agent: body.user_agent,
        referrer: body.referrer,
        position: store.next_position,
        is_verified: false,
        created_at: Utc::now(),
        verification_token: Uuid::new_v4().simple().to_string(),
        unsubscribe_token: Uuid::new_v4().simple().to_string(),
    };
    let data = json!(EntryView::from(&entry));
    store.entries.push(entry);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": data,
            "message": "Successfully joined the waitlist",
        })),
    ))
}

async fn project() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": { "project_id": PROJECT_ID, "timestamp": Utc::now() },
    }))
}

async fn verify(
    State(mock): State<MockHandle>,
    body: Result<Json<TokenBody>, JsonRejection>,
) -> Result<Json<Value>, MockError> {
    let Json(body) = body.map_err(|e| MockError::BadRequest(e.body_text()))?;
    let mut store = mock.inner.store.write().await;
    let entry = store
        .entries
        .iter_mut()
        .find(|e| e.verification_token == body.token)
        .ok_or(MockError::UnknownToken)?;
    entry.is_verified = true;
    Ok(Json(json!({ "success": true, "message": "Email verified successfully" })))
}

async fn unsubscribe(
    State(mock): State<MockHandle>,
    body: Result<Json<TokenBody>, JsonRejection>,
) -> Result<Json<Value>, MockError> {
    let Json(body) = body.map_err(|e| MockError::BadRequest(e.body_text()))?;
    let mut store = mock.inner.store.write().await;
    let index = store
        .entries
        .iter()
        .position(|e| e.unsubscribe_token == body.token)
        .ok_or(MockError::UnknownToken)?;
    store.entries.remove(index);
    Ok(Json(json!({ "success": true, "message": "Successfully unsubscribed" })))
}
