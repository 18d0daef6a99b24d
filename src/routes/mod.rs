//! Router assembly and page rendering.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every page route builds a `PageContext` from the request's cookie jar,
//! runs its guarded loader, and maps the outcome onto an HTTP response.
//! Cookie changes made during the load (a cleared token, a selected
//! company) ride back on that response whatever its kind.

pub mod guard;
pub mod pages;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

use guard::{PageContext, PageLoader, PageResult, RequireNoSession, RequireSession};
use pages::{CompaniesPage, CompanyPage, LocationPage, SignInPage, SignUpPage, TicketsPage};

/// Page routes plus `/healthz`.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(sign_in))
        .route("/signup", get(sign_up))
        .route("/empresas", get(companies))
        .route("/empresas/{id}", get(company))
        .route("/locais/{id}", get(location))
        .route("/tickets", get(tickets))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run `loader` and turn its outcome into a response carrying the jar.
pub async fn render<L>(loader: &L, ctx: PageContext) -> Response
where
    L: PageLoader,
    L::Props: Serialize,
{
    let result = loader.load(&ctx).await;
    let jar = ctx.jar();
    match result {
        Ok(PageResult::Props(props)) => (jar, Json(props)).into_response(),
        Ok(PageResult::Redirect(redirect)) => {
            let response = if redirect.permanent {
                axum::response::Redirect::permanent(&redirect.destination)
            } else {
                axum::response::Redirect::temporary(&redirect.destination)
            };
            (jar, response).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "page load failed");
            (jar, StatusCode::INTERNAL_SERVER_ERROR).into_response()
        }
    }
}

fn context(state: &AppState, jar: CookieJar) -> PageContext {
    PageContext::new(state.config.clone(), jar)
}

async fn sign_in(State(state): State<AppState>, jar: CookieJar) -> Response {
    render(&RequireNoSession::new(SignInPage), context(&state, jar)).await
}

async fn sign_up(State(state): State<AppState>, jar: CookieJar) -> Response {
    render(&RequireNoSession::new(SignUpPage), context(&state, jar)).await
}

async fn companies(State(state): State<AppState>, jar: CookieJar) -> Response {
    render(&RequireSession::new(CompaniesPage), context(&state, jar)).await
}

async fn company(State(state): State<AppState>, jar: CookieJar, Path(id): Path<String>) -> Response {
    let ctx = context(&state, jar).with_param("id", id);
    render(&RequireSession::new(CompanyPage), ctx).await
}

async fn location(State(state): State<AppState>, jar: CookieJar, Path(id): Path<String>) -> Response {
    let ctx = context(&state, jar).with_param("id", id);
    render(&RequireSession::new(LocationPage), ctx).await
}

async fn tickets(State(state): State<AppState>, jar: CookieJar) -> Response {
    render(&RequireSession::new(TicketsPage), context(&state, jar)).await
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
