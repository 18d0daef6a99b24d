//! Browsing profile and its tabs.
//!
//! ARCHITECTURE
//! ============
//! A `Browser` owns what all of its tabs share: the cookie jar and the
//! cross-tab broadcast hub. `open_tab` wires a fresh `Session` to those
//! shared resources plus the tab's own history, which is how the session
//! and the notifier get their dependencies injected.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::net::api::ApiError;

use super::company::CompanySelection;
use super::cookies::BrowserCookies;
use super::navigation::History;
use super::notifier::{CrossTabHub, Notifier};
use super::session::Session;
use super::token::TokenStore;

#[derive(Clone, Default)]
pub struct Browser {
    cookies: BrowserCookies,
    hub: CrossTabHub,
}

impl Browser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn cookies(&self) -> &BrowserCookies {
        &self.cookies
    }

    #[must_use]
    pub fn hub(&self) -> &CrossTabHub {
        &self.hub
    }

    /// Open a tab positioned on the login route. The tab is not mounted yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the tab's HTTP client fails to build.
    pub fn open_tab(&self, config: Arc<AppConfig>) -> Result<Tab, ApiError> {
        let cookies: Arc<BrowserCookies> = Arc::new(self.cookies.clone());
        let tokens = TokenStore::from_config(cookies.clone(), &config);
        let company = CompanySelection::new(cookies, &config);
        let notifier = Notifier::new(self.hub.clone(), config.auth_channel.clone());
        let history = Arc::new(History::new(&config.login_route));
        let session = Session::new(config, tokens, notifier, history.clone())?;
        Ok(Tab { session, history, company })
    }
}

pub struct Tab {
    session: Session,
    history: Arc<History>,
    company: CompanySelection,
}

impl Tab {
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn company(&self) -> &CompanySelection {
        &self.company
    }

    /// Current route of the tab.
    #[must_use]
    pub fn location(&self) -> Option<String> {
        self.history.current()
    }

    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.history.entries()
    }
}
