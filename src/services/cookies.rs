//! Cookie storage backends.
//!
//! ARCHITECTURE
//! ============
//! `BrowserCookies` is the profile-wide jar every tab of a `Browser` shares;
//! it honours `Max-Age` the way a user agent would. `RequestCookies` wraps the
//! jar of a single server-render request so removals and additions flow back
//! into the response `Set-Cookie` headers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::config::CookieSettings;

/// Name-keyed cookie persistence scoped by path.
pub trait CookieStore: Send + Sync {
    /// Write `name=value`, replacing any prior value at the same path.
    fn set(&self, name: &str, value: &str, settings: &CookieSettings);

    /// Current value, or `None` when unset, expired, or empty.
    fn get(&self, name: &str) -> Option<String>;

    /// Remove the cookie at `path`. Removing an absent cookie is a no-op.
    fn remove(&self, name: &str, path: &str);
}

// =============================================================================
// BROWSER JAR
// =============================================================================

#[derive(Debug, Clone)]
struct StoredCookie {
    value: String,
    expires_at: OffsetDateTime,
}

/// Profile-wide cookie jar. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct BrowserCookies {
    inner: Arc<Mutex<HashMap<(String, String), StoredCookie>>>,
}

impl BrowserCookies {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl BrowserCookies {
    /// Number of live (unexpired) cookies in the jar.
    pub(crate) fn len(&self) -> usize {
        let now = OffsetDateTime::now_utc();
        let jar = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        jar.values().filter(|c| c.expires_at > now).count()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CookieStore for BrowserCookies {
    fn set(&self, name: &str, value: &str, settings: &CookieSettings) {
        let key = (name.to_owned(), settings.path.clone());
        let mut jar = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if settings.max_age <= time::Duration::ZERO {
            jar.remove(&key);
            return;
        }
        let expires_at = OffsetDateTime::now_utc()
            .checked_add(settings.max_age)
            .unwrap_or_else(|| PrimitiveDateTime::MAX.assume_utc());
        jar.insert(key, StoredCookie { value: value.to_owned(), expires_at });
    }

    fn get(&self, name: &str) -> Option<String> {
        let now = OffsetDateTime::now_utc();
        let mut jar = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        jar.retain(|_, c| c.expires_at > now);
        jar.iter()
            .find(|((n, _), c)| n == name && !c.value.is_empty())
            .map(|(_, c)| c.value.clone())
    }

    fn remove(&self, name: &str, path: &str) {
        let mut jar = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        jar.remove(&(name.to_owned(), path.to_owned()));
    }
}

// =============================================================================
// REQUEST JAR
// =============================================================================

/// Cookies of one server-render request. Mutations accumulate as deltas that
/// are emitted with the response.
#[derive(Debug, Default)]
pub struct RequestCookies {
    jar: Mutex<CookieJar>,
}

impl RequestCookies {
    #[must_use]
    pub fn new(jar: CookieJar) -> Self {
        Self { jar: Mutex::new(jar) }
    }

    /// Snapshot of the jar including pending additions and removals.
    #[must_use]
    pub fn jar(&self) -> CookieJar {
        self.jar
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CookieStore for RequestCookies {
    fn set(&self, name: &str, value: &str, settings: &CookieSettings) {
        let cookie = Cookie::build((name.to_owned(), value.to_owned()))
            .path(settings.path.clone())
            .same_site(SameSite::Lax)
            .secure(settings.secure)
            .max_age(settings.max_age);
        let mut jar = self.jar.lock().unwrap_or_else(PoisonError::into_inner);
        *jar = jar.clone().add(cookie);
    }

    fn get(&self, name: &str) -> Option<String> {
        let jar = self.jar.lock().unwrap_or_else(PoisonError::into_inner);
        jar.get(name)
            .map(Cookie::value)
            .filter(|v| !v.is_empty())
            .map(str::to_owned)
    }

    fn remove(&self, name: &str, path: &str) {
        let mut jar = self.jar.lock().unwrap_or_else(PoisonError::into_inner);
        let removal = Cookie::build((name.to_owned(), "")).path(path.to_owned());
        *jar = jar.clone().remove(removal);
    }
}

#[cfg(test)]
#[path = "cookies_test.rs"]
mod tests;
