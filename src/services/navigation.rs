//! Client-side navigation.

use std::sync::{Mutex, PoisonError};

/// Moves a tab to another route.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

/// Route history of one tab. The last entry is the current location.
#[derive(Debug, Default)]
pub struct History {
    entries: Mutex<Vec<String>>,
}

impl History {
    #[must_use]
    pub fn new(initial: &str) -> Self {
        Self { entries: Mutex::new(vec![initial.to_owned()]) }
    }

    #[must_use]
    pub fn current(&self) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for History {
    fn navigate(&self, route: &str) {
        tracing::debug!(%route, "navigate");
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(route.to_owned());
    }
}
