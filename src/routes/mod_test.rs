use super::*;
use crate::config::AppConfig;
use crate::routes::guard::{PageError, Redirect};
use crate::test_helpers::{self, MockBackend, STALE_TOKEN, VALID_TOKEN};
use axum::http::header::{LOCATION, SET_COOKIE};
use std::sync::Arc;

/// Serve the page router against `backend` and return its base URL.
async fn spawn_app(backend: &MockBackend) -> String {
    let state = AppState::new(Arc::new(backend.config()));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app(state)).await;
    });
    format!("http://{addr}")
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

async fn fetch(base: &str, path: &str, cookie: Option<&str>) -> reqwest::Response {
    let mut request = client().get(format!("{base}{path}"));
    if let Some(cookie) = cookie {
        request = request.header("cookie", cookie);
    }
    request.send().await.unwrap()
}

fn location(response: &reqwest::Response) -> Option<&str> {
    response.headers().get(LOCATION).and_then(|v| v.to_str().ok())
}

fn set_cookies(response: &reqwest::Response) -> Vec<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok().map(str::to_owned))
        .collect()
}

// =============================================================================
// HTTP
// =============================================================================

#[tokio::test]
async fn healthz_ok() {
    let backend = test_helpers::spawn_backend().await;
    let base = spawn_app(&backend).await;
    assert_eq!(fetch(&base, "/healthz", None).await.status(), 200);
}

#[tokio::test]
async fn sign_in_page_renders_for_anonymous_visitor() {
    let backend = test_helpers::spawn_backend().await;
    let base = spawn_app(&backend).await;

    let response = fetch(&base, "/", None).await;

    assert_eq!(response.status(), 200);
    assert_eq!(response.json::<serde_json::Value>().await.unwrap(), serde_json::json!({}));
}

#[tokio::test]
async fn sign_in_page_redirects_signed_in_visitor_to_landing() {
    let backend = test_helpers::spawn_backend().await;
    let base = spawn_app(&backend).await;

    let response = fetch(&base, "/signup", Some("hubadmin.token=tok-ana")).await;

    assert_eq!(response.status(), 307);
    assert_eq!(location(&response), Some("/empresas"));
}

#[tokio::test]
async fn companies_page_redirects_anonymous_visitor_to_login() {
    let backend = test_helpers::spawn_backend().await;
    let base = spawn_app(&backend).await;

    let response = fetch(&base, "/empresas", None).await;

    assert_eq!(response.status(), 307);
    assert_eq!(location(&response), Some("/"));
}

#[tokio::test]
async fn company_page_sets_company_cookie() {
    let backend = test_helpers::spawn_backend().await;
    let base = spawn_app(&backend).await;

    let response = fetch(&base, "/empresas/c1", Some(&format!("hubadmin.token={VALID_TOKEN}"))).await;

    assert_eq!(response.status(), 200);
    assert!(set_cookies(&response).iter().any(|c| c.starts_with("company_id=c1")));
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["company"]["name"], "Acme");
    assert_eq!(body["locations"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn stale_token_is_cleared_on_redirect() {
    let backend = test_helpers::spawn_backend().await;
    let base = spawn_app(&backend).await;

    let cookie = format!("hubadmin.token={STALE_TOKEN}; company_id=c1");
    let response = fetch(&base, "/tickets", Some(&cookie)).await;

    assert_eq!(response.status(), 307);
    assert_eq!(location(&response), Some("/"));
    assert!(set_cookies(&response).iter().any(|c| c.starts_with("hubadmin.token=;")));
}

#[tokio::test]
async fn tickets_without_company_redirects_to_landing() {
    let backend = test_helpers::spawn_backend().await;
    let base = spawn_app(&backend).await;

    let response = fetch(&base, "/tickets", Some(&format!("hubadmin.token={VALID_TOKEN}"))).await;

    assert_eq!(response.status(), 307);
    assert_eq!(location(&response), Some("/empresas"));
}

#[tokio::test]
async fn location_page_renders_with_selected_company() {
    let backend = test_helpers::spawn_backend().await;
    let base = spawn_app(&backend).await;

    let cookie = format!("hubadmin.token={VALID_TOKEN}; company_id=c1");
    let response = fetch(&base, "/locais/l1", Some(&cookie)).await;

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "id": "l1", "company_id": "c1" }));
}

#[tokio::test]
async fn backend_failure_renders_500() {
    let backend = test_helpers::spawn_backend().await;
    let base = spawn_app(&backend).await;

    let response = fetch(&base, "/empresas/missing", Some(&format!("hubadmin.token={VALID_TOKEN}"))).await;

    assert_eq!(response.status(), 500);
}

// =============================================================================
// render
// =============================================================================

struct PermanentMove;

#[async_trait::async_trait]
impl PageLoader for PermanentMove {
    type Props = ();

    async fn load(&self, _ctx: &PageContext) -> Result<PageResult<()>, PageError> {
        Ok(PageResult::Redirect(Redirect { destination: "/new-home".into(), permanent: true }))
    }
}

#[tokio::test]
async fn render_maps_permanent_redirect_to_308() {
    let ctx = PageContext::new(Arc::new(AppConfig::default()), CookieJar::new());

    let response = render(&PermanentMove, ctx).await;

    assert_eq!(response.status(), StatusCode::PERMANENT_REDIRECT);
    assert_eq!(response.headers().get(LOCATION).unwrap(), "/new-home");
}
