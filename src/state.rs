//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. The
//! page server is stateless across requests: all session state lives in the
//! request's cookies, so the only thing shared is the configuration.

use std::sync::Arc;

use crate::config::AppConfig;

/// Clone is required by Axum; the config is behind an `Arc`.
#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Arc<AppConfig>,
}

impl AppState {
    #[must_use]
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self { config }
    }
}
