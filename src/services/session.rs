//! Interactive session for one browser tab.
//!
//! SYSTEM CONTEXT
//! ==============
//! A `Session` is the tab-side owner of auth state: it signs in, signs up and
//! signs out, recovers the identity from a persisted token when the tab
//! mounts, and keeps sibling tabs consistent through the auth channel.
//! It is passed explicitly to whatever needs the current user; there is no
//! ambient lookup.
//!
//! STATE
//! =====
//! `Unauthenticated` → `Authenticated` on sign-in, sign-up, successful
//! bootstrap, or a `signIn` announced by another tab (which shares the
//! cookie jar, so the token is already there). The reverse happens on
//! sign-out, on a received `signOut`, or when the API client reports the
//! token expired. Operations are not serialized against each other; the
//! last writer wins, except that a bootstrap drops its result when the
//! persisted token changed while the request was in flight.
//!
//! TRADE-OFFS
//! ==========
//! A tab that follows another tab's sign-in is authenticated with no
//! identity (`user` is `None`) for the rest of its life. Cross-tab events
//! carry no payload and adopting one never costs a network call. Mount runs
//! once per tab, so only a freshly opened tab bootstraps the identity again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock, Weak};

use crate::config::{AppConfig, BootstrapEndpoint};
use crate::net::api::{ApiClient, ApiError, ExecutionContext, ExpiryHook};
use crate::net::types::{AuthResponse, BootstrapUser, SignInRequest, SignUpRequest, TokenLookupRequest, User};

use super::navigation::Navigator;
use super::notifier::{AuthEvent, Notifier};
use super::token::TokenStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthStatus {
    #[default]
    Unauthenticated,
    Authenticated,
}

/// Snapshot of the tab's authentication state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthState {
    pub status: AuthStatus,
    pub user: Option<User>,
    /// True while the bootstrap request is in flight.
    pub loading: bool,
}

/// Whether a sign-out is announced to other tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Broadcast {
    Announce,
    /// Used when reacting to another tab's `signOut`, so it is not echoed back.
    Suppress,
}

#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    config: Arc<AppConfig>,
    state: RwLock<AuthState>,
    tokens: TokenStore,
    api: ApiClient,
    notifier: Notifier,
    navigator: Arc<dyn Navigator>,
    mounted: AtomicBool,
}

impl Session {
    /// Build a tab session. The API client's default bearer is whatever
    /// token is persisted right now.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(
        config: Arc<AppConfig>,
        tokens: TokenStore,
        notifier: Notifier,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        let slot: Arc<OnceLock<Weak<SessionInner>>> = Arc::default();
        let hook_slot = Arc::clone(&slot);
        let on_expired: ExpiryHook = Arc::new(move || {
            if let Some(inner) = hook_slot.get().and_then(Weak::upgrade) {
                Session { inner }.sign_out();
            }
        });

        let api = ApiClient::new(&config, tokens.read(), ExecutionContext::Interactive(on_expired))?;
        let inner = Arc::new(SessionInner {
            config,
            state: RwLock::new(AuthState::default()),
            tokens,
            api,
            notifier,
            navigator,
            mounted: AtomicBool::new(false),
        });
        let _ = slot.set(Arc::downgrade(&inner));
        Ok(Self { inner })
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    #[must_use]
    pub fn state(&self) -> AuthState {
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.state().user
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state().status == AuthStatus::Authenticated
    }

    /// The tab's interactive API client, for in-page calls.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenStore {
        &self.inner.tokens
    }

    fn update<F: FnOnce(&mut AuthState)>(&self, f: F) {
        let mut state = self
            .inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut state);
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Attach the tab: listen for cross-tab events, then recover the identity
    /// from a persisted token. Only the first call has any effect.
    pub async fn mount(&self) {
        if self.inner.mounted.swap(true, Ordering::SeqCst) {
            return;
        }

        let weak = Arc::downgrade(&self.inner);
        self.inner.notifier.on_receive(move |event| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            Session { inner }.apply_remote(event);
        });

        self.bootstrap().await;
    }

    fn apply_remote(&self, event: AuthEvent) {
        tracing::debug!(%event, "auth event from another tab");
        match event {
            AuthEvent::SignOut => self.sign_out_with(Broadcast::Suppress),
            AuthEvent::SignIn => {
                // Identity stays unknown; see TRADE-OFFS.
                if let Some(token) = self.inner.tokens.read() {
                    self.inner.api.set_bearer(Some(&token));
                    self.update(|s| s.status = AuthStatus::Authenticated);
                }
                self.inner.navigator.navigate(&self.inner.config.landing_route);
            }
        }
    }

    async fn bootstrap(&self) {
        let Some(token) = self.inner.tokens.read() else {
            return;
        };
        self.inner.api.set_bearer(Some(&token));
        self.update(|s| s.loading = true);

        let result = match self.inner.config.bootstrap {
            BootstrapEndpoint::TokenLookup => {
                self.inner
                    .api
                    .post::<_, BootstrapUser>("/getUserByToken", &TokenLookupRequest { token: &token })
                    .await
            }
            BootstrapEndpoint::Me => self.inner.api.get::<BootstrapUser>("/me").await,
        };
        self.update(|s| s.loading = false);

        // A sign-out (here or in another tab) may have raced the request.
        if self.inner.tokens.read().as_deref() != Some(token.as_str()) {
            tracing::info!("session token changed during bootstrap; discarding result");
            return;
        }

        match result {
            Ok(user) => {
                let user = User::from(user);
                tracing::info!(user_id = %user.id, "session restored from persisted token");
                self.update(|s| {
                    s.status = AuthStatus::Authenticated;
                    s.user = Some(user);
                });
            }
            // The interceptor already signed the tab out.
            Err(ApiError::AuthExpired) => tracing::info!("persisted token rejected during bootstrap"),
            Err(e) => {
                tracing::warn!(error = %e, "session bootstrap failed");
                self.sign_out();
            }
        }
    }

    // =========================================================================
    // OPERATIONS
    // =========================================================================

    /// Exchange credentials for a session via `POST /login`.
    ///
    /// # Errors
    ///
    /// Returns the backend error unchanged; nothing is retried.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let resp: AuthResponse = self
            .inner
            .api
            .post("/login", &SignInRequest { email, password })
            .await?;
        let user = resp.identity(email);
        self.establish(&resp.token, user.clone());
        Ok(user)
    }

    /// Register and start a session via `POST /signup`.
    ///
    /// # Errors
    ///
    /// Returns the backend error unchanged; nothing is retried.
    pub async fn sign_up(&self, name: &str, email: &str, password: &str) -> Result<User, ApiError> {
        let resp: AuthResponse = self
            .inner
            .api
            .post("/signup", &SignUpRequest { name, email, password })
            .await?;
        let user = resp.identity(email);
        self.establish(&resp.token, user.clone());
        Ok(user)
    }

    fn establish(&self, token: &str, user: User) {
        tracing::info!(user_id = %user.id, "signed in");
        self.inner.tokens.persist(token);
        self.inner.api.set_bearer(Some(token));
        self.update(|s| {
            s.status = AuthStatus::Authenticated;
            s.user = Some(user);
        });
        self.inner.notifier.announce(AuthEvent::SignIn);
        self.inner.navigator.navigate(&self.inner.config.landing_route);
    }

    /// End the session locally and tell the other tabs.
    pub fn sign_out(&self) {
        self.sign_out_with(Broadcast::Announce);
    }

    pub fn sign_out_with(&self, broadcast: Broadcast) {
        tracing::info!(?broadcast, "signing out");
        self.inner.tokens.destroy();
        self.inner.api.set_bearer(None);
        self.update(|s| {
            s.status = AuthStatus::Unauthenticated;
            s.user = None;
        });
        if broadcast == Broadcast::Announce {
            self.inner.notifier.announce(AuthEvent::SignOut);
        }
        self.inner.navigator.navigate(&self.inner.config.login_route);
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state())
            .field("tokens", &self.inner.tokens)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
