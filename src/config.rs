//! Front-end configuration parsed from environment variables.
//!
//! DESIGN
//! ======
//! Every knob the historical variants disagreed on (bootstrap endpoint,
//! redirect targets, cookie name) is a typed setting here instead of a
//! hard-coded constant. Parsing goes through a lookup function so tests can
//! feed values without touching the process environment.

use std::time::Duration as StdDuration;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3333";
pub const DEFAULT_LOGIN_ROUTE: &str = "/";
pub const DEFAULT_LANDING_ROUTE: &str = "/empresas";
pub const DEFAULT_SESSION_COOKIE: &str = "hubadmin.token";
pub const COMPANY_COOKIE: &str = "company_id";
pub const DEFAULT_SESSION_MAX_AGE_DAYS: i64 = 30;
pub const MAX_SESSION_MAX_AGE_DAYS: i64 = 3650;
pub const DEFAULT_AUTH_CHANNEL: &str = "auth";
pub const DEFAULT_API_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_API_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {key}: {value:?} is not a valid number")]
    InvalidNumber { key: &'static str, value: String },

    #[error("unknown AUTH_BOOTSTRAP: {0} (expected 'token' or 'me')")]
    UnknownBootstrap(String),

    #[error("invalid {key}: {value:?} must be an absolute path")]
    InvalidRoute { key: &'static str, value: String },

    #[error("invalid SESSION_MAX_AGE_DAYS: {0} (expected 1..={MAX_SESSION_MAX_AGE_DAYS})")]
    InvalidMaxAge(i64),
}

/// Which backend call recovers the user identity from a persisted token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapEndpoint {
    /// `POST /getUserByToken {token}`.
    TokenLookup,
    /// `GET /me` with the bearer header.
    Me,
}

/// Cookie attributes shared by the session token and company selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieSettings {
    pub path: String,
    pub max_age: time::Duration,
    pub secure: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl ApiTimeouts {
    #[must_use]
    pub fn request(&self) -> StdDuration {
        StdDuration::from_secs(self.request_secs)
    }

    #[must_use]
    pub fn connect(&self) -> StdDuration {
        StdDuration::from_secs(self.connect_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    pub api_base_url: String,
    pub bootstrap: BootstrapEndpoint,
    pub login_route: String,
    pub landing_route: String,
    pub session_cookie: String,
    pub cookie: CookieSettings,
    pub auth_channel: String,
    pub timeouts: ApiTimeouts,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            bootstrap: BootstrapEndpoint::TokenLookup,
            login_route: DEFAULT_LOGIN_ROUTE.to_owned(),
            landing_route: DEFAULT_LANDING_ROUTE.to_owned(),
            session_cookie: DEFAULT_SESSION_COOKIE.to_owned(),
            cookie: CookieSettings {
                path: "/".to_owned(),
                max_age: time::Duration::days(DEFAULT_SESSION_MAX_AGE_DAYS),
                secure: false,
            },
            auth_channel: DEFAULT_AUTH_CHANNEL.to_owned(),
            timeouts: ApiTimeouts {
                request_secs: DEFAULT_API_REQUEST_TIMEOUT_SECS,
                connect_secs: DEFAULT_API_CONNECT_TIMEOUT_SECS,
            },
        }
    }
}

impl AppConfig {
    /// Build typed config from environment variables.
    ///
    /// All optional:
    /// - `PORT`: default 3000
    /// - `API_BASE_URL`: default `http://localhost:3333`
    /// - `AUTH_BOOTSTRAP`: `token` (default, `POST /getUserByToken`) or `me` (`GET /me`)
    /// - `LOGIN_ROUTE`: default `/`
    /// - `LANDING_ROUTE`: default `/empresas`
    /// - `SESSION_COOKIE`: default `hubadmin.token`
    /// - `SESSION_MAX_AGE_DAYS`: default 30, at most 3650
    /// - `COOKIE_SECURE`: boolean, default false
    /// - `AUTH_CHANNEL`: default `auth`
    /// - `API_REQUEST_TIMEOUT_SECS`: default 30
    /// - `API_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error if a present value cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build typed config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a present value cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = parse_number(&lookup, "PORT", defaults.port)?;
        let api_base_url = lookup("API_BASE_URL")
            .unwrap_or(defaults.api_base_url)
            .trim_end_matches('/')
            .to_owned();
        let bootstrap = parse_bootstrap(lookup("AUTH_BOOTSTRAP").as_deref())?;
        let login_route = parse_route(&lookup, "LOGIN_ROUTE", defaults.login_route)?;
        let landing_route = parse_route(&lookup, "LANDING_ROUTE", defaults.landing_route)?;
        let session_cookie = lookup("SESSION_COOKIE")
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(defaults.session_cookie);
        let max_age_days = parse_max_age(&lookup)?;
        let secure = lookup("COOKIE_SECURE")
            .as_deref()
            .and_then(parse_bool)
            .unwrap_or(false);
        let auth_channel = lookup("AUTH_CHANNEL").unwrap_or(defaults.auth_channel);
        let timeouts = ApiTimeouts {
            request_secs: parse_number(&lookup, "API_REQUEST_TIMEOUT_SECS", DEFAULT_API_REQUEST_TIMEOUT_SECS)?,
            connect_secs: parse_number(&lookup, "API_CONNECT_TIMEOUT_SECS", DEFAULT_API_CONNECT_TIMEOUT_SECS)?,
        };

        Ok(Self {
            port,
            api_base_url,
            bootstrap,
            login_route,
            landing_route,
            session_cookie,
            cookie: CookieSettings { path: "/".to_owned(), max_age: time::Duration::days(max_age_days), secure },
            auth_channel,
            timeouts,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_bootstrap(raw: Option<&str>) -> Result<BootstrapEndpoint, ConfigError> {
    match raw.map(str::trim).unwrap_or("token") {
        "token" | "getUserByToken" => Ok(BootstrapEndpoint::TokenLookup),
        "me" => Ok(BootstrapEndpoint::Me),
        other => Err(ConfigError::UnknownBootstrap(other.to_owned())),
    }
}

fn parse_number<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { key, value: raw }),
    }
}

fn parse_max_age<F>(lookup: &F) -> Result<i64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let days = parse_number(lookup, "SESSION_MAX_AGE_DAYS", DEFAULT_SESSION_MAX_AGE_DAYS)?;
    if (1..=MAX_SESSION_MAX_AGE_DAYS).contains(&days) {
        Ok(days)
    } else {
        Err(ConfigError::InvalidMaxAge(days))
    }
}

fn parse_route<F>(lookup: &F, key: &'static str, default: String) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) if raw.starts_with('/') => Ok(raw),
        Some(raw) => Err(ConfigError::InvalidRoute { key, value: raw }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
