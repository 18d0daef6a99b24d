//! Session token persistence.
//!
//! The token is opaque: this store only ever checks for presence. It works
//! against any `CookieStore`, so the same type serves a browser tab (shared
//! profile jar) and a server render (the request's own jar, bound
//! explicitly at construction).

use std::sync::Arc;

use crate::config::{AppConfig, CookieSettings};

use super::cookies::CookieStore;

#[derive(Clone)]
pub struct TokenStore {
    cookies: Arc<dyn CookieStore>,
    name: String,
    settings: CookieSettings,
}

impl TokenStore {
    #[must_use]
    pub fn new(cookies: Arc<dyn CookieStore>, name: impl Into<String>, settings: CookieSettings) -> Self {
        Self { cookies, name: name.into(), settings }
    }

    /// Store bound to the session cookie described by `config`.
    #[must_use]
    pub fn from_config(cookies: Arc<dyn CookieStore>, config: &AppConfig) -> Self {
        Self::new(cookies, config.session_cookie.clone(), config.cookie.clone())
    }

    /// Write the token with the configured max age and path.
    pub fn persist(&self, token: &str) {
        self.cookies.set(&self.name, token, &self.settings);
    }

    #[must_use]
    pub fn read(&self) -> Option<String> {
        self.cookies.get(&self.name)
    }

    /// Remove the token. No-op when absent.
    pub fn destroy(&self) {
        self.cookies.remove(&self.name, &self.settings.path);
    }

    #[must_use]
    pub fn is_present(&self) -> bool {
        self.read().is_some()
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("name", &self.name)
            .field("path", &self.settings.path)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "token_test.rs"]
mod tests;
