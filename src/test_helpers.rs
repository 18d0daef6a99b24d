//! Shared fixtures for unit tests: an in-process mock of the backend API.
//!
//! The mock binds an ephemeral localhost port and implements just enough of
//! the backend contract (login, signup, both bootstrap variants, and the
//! company-scoped reads) to drive the session and the page loaders.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde_json::{Value, json};

use crate::config::AppConfig;

pub const EMAIL: &str = "ana@example.com";
pub const PASSWORD: &str = "secret";
pub const VALID_TOKEN: &str = "tok-ana";
pub const SIGNUP_TOKEN: &str = "tok-new";
pub const STALE_TOKEN: &str = "tok-stale";
/// Valid, but `/getUserByToken` answers it only after `SLOW_LOOKUP`.
pub const SLOW_TOKEN: &str = "tok-slow";
pub const SLOW_LOOKUP: Duration = Duration::from_millis(200);

#[derive(Default)]
pub struct BackendCounters {
    pub bootstrap_calls: AtomicUsize,
    pub login_calls: AtomicUsize,
    pub total_requests: AtomicUsize,
}

impl BackendCounters {
    pub fn bootstrap_calls(&self) -> usize {
        self.bootstrap_calls.load(Ordering::SeqCst)
    }

    pub fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    pub fn total_requests(&self) -> usize {
        self.total_requests.load(Ordering::SeqCst)
    }
}

pub struct MockBackend {
    pub base_url: String,
    pub counters: Arc<BackendCounters>,
}

impl MockBackend {
    /// Default config pointed at this backend.
    pub fn config(&self) -> AppConfig {
        AppConfig { api_base_url: self.base_url.clone(), ..AppConfig::default() }
    }
}

fn token_valid(token: &str) -> bool {
    token == VALID_TOKEN || token == SIGNUP_TOKEN || token == SLOW_TOKEN
}

fn bearer_valid(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(token_valid)
}

fn company_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get("company_id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": "invalid token" }))).into_response()
}

async fn login(State(c): State<Arc<BackendCounters>>, Json(body): Json<Value>) -> Response {
    c.total_requests.fetch_add(1, Ordering::SeqCst);
    c.login_calls.fetch_add(1, Ordering::SeqCst);
    if body["email"] == EMAIL && body["password"] == PASSWORD {
        Json(json!({ "token": VALID_TOKEN, "user": { "id": "1", "name": "Ana" } })).into_response()
    } else {
        (StatusCode::BAD_REQUEST, Json(json!({ "error": "invalid credentials" }))).into_response()
    }
}

async fn signup(State(c): State<Arc<BackendCounters>>, Json(body): Json<Value>) -> Response {
    c.total_requests.fetch_add(1, Ordering::SeqCst);
    if body["email"] == EMAIL {
        return (StatusCode::CONFLICT, Json(json!({ "error": "email taken" }))).into_response();
    }
    let user = json!({ "id": "2", "name": body["name"], "email": body["email"] });
    (StatusCode::CREATED, Json(json!({ "token": SIGNUP_TOKEN, "user": user }))).into_response()
}

async fn get_user_by_token(State(c): State<Arc<BackendCounters>>, Json(body): Json<Value>) -> Response {
    c.total_requests.fetch_add(1, Ordering::SeqCst);
    c.bootstrap_calls.fetch_add(1, Ordering::SeqCst);
    if body["token"] == SLOW_TOKEN {
        tokio::time::sleep(SLOW_LOOKUP).await;
    }
    match body["token"].as_str() {
        Some(t) if token_valid(t) => Json(json!({ "id": "1", "email": EMAIL, "name": "Ana" })).into_response(),
        _ => unauthorized(),
    }
}

async fn me(State(c): State<Arc<BackendCounters>>, headers: HeaderMap) -> Response {
    c.total_requests.fetch_add(1, Ordering::SeqCst);
    c.bootstrap_calls.fetch_add(1, Ordering::SeqCst);
    if bearer_valid(&headers) {
        Json(json!({ "id": 1, "email": EMAIL, "name": "Ana" })).into_response()
    } else {
        unauthorized()
    }
}

async fn company(State(c): State<Arc<BackendCounters>>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    c.total_requests.fetch_add(1, Ordering::SeqCst);
    if !bearer_valid(&headers) {
        return unauthorized();
    }
    if id == "missing" {
        return (StatusCode::NOT_FOUND, Json(json!({ "error": "company not found" }))).into_response();
    }
    Json(json!({ "id": id, "name": "Acme", "cnpj": "00.000.000/0001-00" })).into_response()
}

async fn locations(State(c): State<Arc<BackendCounters>>, headers: HeaderMap) -> Response {
    c.total_requests.fetch_add(1, Ordering::SeqCst);
    if !bearer_valid(&headers) {
        return unauthorized();
    }
    let Some(company_id) = company_header(&headers) else {
        return (StatusCode::BAD_REQUEST, "company_id header required").into_response();
    };
    Json(json!([
        { "id": "l1", "name": "HQ", "cep": "01001-000", "company_id": company_id },
        { "id": "l2", "name": "Branch", "cep": "20040-002", "company_id": company_id }
    ]))
    .into_response()
}

async fn tickets(State(c): State<Arc<BackendCounters>>, headers: HeaderMap) -> Response {
    c.total_requests.fetch_add(1, Ordering::SeqCst);
    if !bearer_valid(&headers) {
        return unauthorized();
    }
    let Some(company_id) = company_header(&headers) else {
        return (StatusCode::BAD_REQUEST, "company_id header required").into_response();
    };
    Json(json!([{ "id": "t1", "title": "Printer down", "company_id": company_id }])).into_response()
}

async fn boom(State(c): State<Arc<BackendCounters>>) -> Response {
    c.total_requests.fetch_add(1, Ordering::SeqCst);
    (StatusCode::INTERNAL_SERVER_ERROR, "kaboom").into_response()
}

/// Start the mock backend on an ephemeral port.
pub async fn spawn_backend() -> MockBackend {
    let counters = Arc::new(BackendCounters::default());
    let app = Router::new()
        .route("/login", post(login))
        .route("/signup", post(signup))
        .route("/getUserByToken", post(get_user_by_token))
        .route("/me", get(me))
        .route("/empresas/{id}", get(company))
        .route("/locais", get(locations))
        .route("/tickets", get(tickets))
        .route("/boom", get(boom))
        .with_state(Arc::clone(&counters));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock backend");
    let addr = listener.local_addr().expect("mock backend addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockBackend { base_url: format!("http://{addr}"), counters }
}

/// Poll `cond` until it holds or two seconds pass.
pub async fn eventually<F>(cond: F) -> bool
where
    F: Fn() -> bool,
{
    for _ in 0..200 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}
