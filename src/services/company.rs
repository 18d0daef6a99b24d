//! Selected-company cookie.
//!
//! Company-scoped screens (tickets, locations) read the company the user
//! last opened from the `company_id` cookie instead of the URL.

use std::sync::Arc;

use crate::config::{AppConfig, COMPANY_COOKIE, CookieSettings};

use super::cookies::CookieStore;

#[derive(Clone)]
pub struct CompanySelection {
    cookies: Arc<dyn CookieStore>,
    settings: CookieSettings,
}

impl CompanySelection {
    #[must_use]
    pub fn new(cookies: Arc<dyn CookieStore>, config: &AppConfig) -> Self {
        Self { cookies, settings: config.cookie.clone() }
    }

    pub fn select(&self, company_id: &str) {
        tracing::debug!(%company_id, "company selected");
        self.cookies.set(COMPANY_COOKIE, company_id, &self.settings);
    }

    #[must_use]
    pub fn current(&self) -> Option<String> {
        self.cookies.get(COMPANY_COOKIE)
    }

    pub fn clear(&self) {
        self.cookies.remove(COMPANY_COOKIE, &self.settings.path);
    }
}
