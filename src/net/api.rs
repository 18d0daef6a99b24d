//! REST client for the backend API.
//!
//! Every request goes through one response interceptor, the single place
//! where transport status codes are translated into domain errors. A 401
//! becomes `ApiError::AuthExpired`; in an interactive (tab) context the
//! interceptor also fires the session's expiry hook first. Server-render
//! clients never trigger that side effect and rely on the route guard.
//!
//! ERROR HANDLING
//! ==============
//! Callers get typed `ApiError`s and match on `AuthExpired` by variant;
//! nothing downstream re-reads raw status codes.

use std::sync::{Arc, PoisonError, RwLock};

use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::AppConfig;
use crate::services::token::TokenStore;

pub const COMPANY_HEADER: &str = "company_id";

/// Errors produced by API client operations.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The backend rejected the session token.
    #[error("authentication expired")]
    AuthExpired,

    /// The backend returned a non-success status other than 401.
    #[error("API response error: status {status}")]
    Status { status: u16, body: String },

    /// The HTTP request could not be completed.
    #[error("API request failed: {0}")]
    Transport(String),

    /// The response body could not be deserialized.
    #[error("API response parse failed: {0}")]
    Decode(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    ClientBuild(String),
}

impl ApiError {
    #[must_use]
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::AuthExpired)
    }

    /// Backend-supplied `error` message, if the body carries one.
    #[must_use]
    pub fn backend_message(&self) -> Option<String> {
        let Self::Status { body, .. } = self else {
            return None;
        };
        serde_json::from_str::<serde_json::Value>(body)
            .ok()?
            .get("error")?
            .as_str()
            .map(str::to_owned)
    }
}

/// Invoked by an interactive client when the backend answers 401.
pub type ExpiryHook = Arc<dyn Fn() + Send + Sync>;

/// Where the client runs. Only interactive clients have a session to end.
#[derive(Clone)]
pub enum ExecutionContext {
    Server,
    Interactive(ExpiryHook),
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Server => f.write_str("Server"),
            Self::Interactive(_) => f.write_str("Interactive"),
        }
    }
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    bearer: RwLock<Option<String>>,
    context: ExecutionContext,
}

impl ApiClient {
    /// Build a client whose default bearer is `token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &AppConfig, token: Option<String>, context: ExecutionContext) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeouts.request())
            .connect_timeout(config.timeouts.connect())
            .build()
            .map_err(|e| ApiError::ClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.api_base_url.clone(), bearer: RwLock::new(token), context })
    }

    /// Server-render client seeded from the request's persisted token.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn server(config: &AppConfig, tokens: &TokenStore) -> Result<Self, ApiError> {
        Self::new(config, tokens.read(), ExecutionContext::Server)
    }

    pub fn set_bearer(&self, token: Option<&str>) {
        *self.bearer.write().unwrap_or_else(PoisonError::into_inner) = token.map(str::to_owned);
    }

    #[must_use]
    pub fn bearer(&self) -> Option<String> {
        self.bearer
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn is_interactive(&self) -> bool {
        matches!(self.context, ExecutionContext::Interactive(_))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(self.http.get(self.url(path))).await
    }

    /// `GET` scoped to a company via the `company_id` header.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn get_for_company<T: DeserializeOwned>(&self, path: &str, company_id: &str) -> Result<T, ApiError> {
        let request = self.http.get(self.url(path)).header(COMPANY_HEADER, company_id);
        self.execute(request).await
    }

    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(self.http.post(self.url(path)).json(body)).await
    }

    async fn execute<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T, ApiError> {
        let request = match self.bearer() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| ApiError::Decode(e.to_string()));
        }

        let body = response.text().await.unwrap_or_default();
        Err(self.intercept(status, body))
    }

    /// Translate a failed response into the error handed to the caller.
    fn intercept(&self, status: StatusCode, body: String) -> ApiError {
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(interactive = self.is_interactive(), "backend rejected session token");
            if let ExecutionContext::Interactive(on_expired) = &self.context {
                on_expired();
            }
            return ApiError::AuthExpired;
        }
        tracing::debug!(status = status.as_u16(), "backend request failed");
        ApiError::Status { status: status.as_u16(), body }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("context", &self.context)
            .field("has_bearer", &self.bearer().is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;
