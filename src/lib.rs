//! Session and authentication lifecycle for the business-admin front end.
//!
//! `services` holds the tab-side pieces (cookie-backed token store, the
//! cross-tab notifier, the interactive `Session`), `net` the backend API
//! client, and `routes` the server-rendered pages with their session guards.

pub mod config;
pub mod net;
pub mod routes;
pub mod services;
pub mod state;

#[cfg(test)]
mod test_helpers;
