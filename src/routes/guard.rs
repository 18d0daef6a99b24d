//! Page-load contract and the session route guards.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every server-rendered page is a `PageLoader`: a request context in, props
//! or a redirect out. The guards are loaders too, wrapping another loader
//! and enforcing a session precondition before it runs. They hold no state
//! across requests.
//!
//! `RequireSession` is also the recovery boundary for server-side API calls:
//! a loader failing with `ApiError::AuthExpired` has its token cleared and
//! is turned into a redirect to the login route.

use std::collections::HashMap;
use std::sync::Arc;

use axum_extra::extract::cookie::CookieJar;

use crate::config::AppConfig;
use crate::net::api::{ApiClient, ApiError};
use crate::services::company::CompanySelection;
use crate::services::cookies::RequestCookies;
use crate::services::token::TokenStore;

// =============================================================================
// CONTRACT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub destination: String,
    pub permanent: bool,
}

impl Redirect {
    #[must_use]
    pub fn temporary(destination: impl Into<String>) -> Self {
        Self { destination: destination.into(), permanent: false }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageResult<P> {
    Props(P),
    Redirect(Redirect),
}

impl<P> PageResult<P> {
    #[must_use]
    pub fn redirect_to(destination: impl Into<String>) -> Self {
        Self::Redirect(Redirect::temporary(destination))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("missing route parameter: {0}")]
    MissingParam(&'static str),
}

impl PageError {
    #[must_use]
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Api(ApiError::AuthExpired))
    }
}

/// Per-request render context. The request's cookie jar is bound here so
/// token and company lookups never reach for ambient state.
pub struct PageContext {
    config: Arc<AppConfig>,
    cookies: Arc<RequestCookies>,
    params: HashMap<String, String>,
}

impl PageContext {
    #[must_use]
    pub fn new(config: Arc<AppConfig>, jar: CookieJar) -> Self {
        Self { config, cookies: Arc::new(RequestCookies::new(jar)), params: HashMap::new() }
    }

    #[must_use]
    pub fn with_param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.insert(key.to_owned(), value.into());
        self
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// # Errors
    ///
    /// Returns `PageError::MissingParam` when the route did not supply `key`.
    pub fn param(&self, key: &'static str) -> Result<&str, PageError> {
        self.params
            .get(key)
            .map(String::as_str)
            .ok_or(PageError::MissingParam(key))
    }

    #[must_use]
    pub fn tokens(&self) -> TokenStore {
        TokenStore::from_config(self.cookies.clone(), &self.config)
    }

    #[must_use]
    pub fn company(&self) -> CompanySelection {
        CompanySelection::new(self.cookies.clone(), &self.config)
    }

    /// Server-context API client carrying this request's token.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn api(&self) -> Result<ApiClient, PageError> {
        Ok(ApiClient::server(&self.config, &self.tokens())?)
    }

    /// Cookie jar with every change made during the render.
    #[must_use]
    pub fn jar(&self) -> CookieJar {
        self.cookies.jar()
    }
}

#[async_trait::async_trait]
pub trait PageLoader: Send + Sync {
    type Props: Send;

    async fn load(&self, ctx: &PageContext) -> Result<PageResult<Self::Props>, PageError>;
}

// =============================================================================
// GUARDS
// =============================================================================

/// Runs the inner loader only for requests carrying a session token.
pub struct RequireSession<L> {
    inner: L,
}

impl<L> RequireSession<L> {
    pub fn new(inner: L) -> Self {
        Self { inner }
    }
}

#[async_trait::async_trait]
impl<L: PageLoader> PageLoader for RequireSession<L> {
    type Props = L::Props;

    async fn load(&self, ctx: &PageContext) -> Result<PageResult<Self::Props>, PageError> {
        let tokens = ctx.tokens();
        if !tokens.is_present() {
            tracing::debug!("no session token; redirecting to login");
            return Ok(PageResult::redirect_to(&ctx.config().login_route));
        }

        match self.inner.load(ctx).await {
            Err(e) if e.is_auth_expired() => {
                tracing::info!("session token rejected during render; clearing it");
                tokens.destroy();
                Ok(PageResult::redirect_to(&ctx.config().login_route))
            }
            other => other,
        }
    }
}

/// Runs the inner loader only for requests without a session token.
pub struct RequireNoSession<L> {
    inner: L,
}

impl<L> RequireNoSession<L> {
    pub fn new(inner: L) -> Self {
        Self { inner }
    }
}

#[async_trait::async_trait]
impl<L: PageLoader> PageLoader for RequireNoSession<L> {
    type Props = L::Props;

    async fn load(&self, ctx: &PageContext) -> Result<PageResult<Self::Props>, PageError> {
        if ctx.tokens().is_present() {
            tracing::debug!("session token present; redirecting to landing");
            return Ok(PageResult::redirect_to(&ctx.config().landing_route));
        }
        self.inner.load(ctx).await
    }
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
