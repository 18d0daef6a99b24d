//! Cross-tab auth notifications.
//!
//! ARCHITECTURE
//! ============
//! A `CrossTabHub` is the broadcast fabric of one browsing profile: one
//! `tokio::sync::broadcast` sender per channel name. Each tab owns a
//! `Notifier`, which lazily opens its `AuthChannel` on first use and keeps it
//! for the lifetime of the tab. Messages are tagged with the sending tab's id
//! so a tab never observes its own announcements.
//!
//! Wire payloads are the bare strings `"signIn"` and `"signOut"`; anything
//! else is ignored by receivers.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use uuid::Uuid;

const CHANNEL_CAPACITY: usize = 64;

// =============================================================================
// EVENTS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    SignIn,
    SignOut,
}

impl AuthEvent {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SignIn => "signIn",
            Self::SignOut => "signOut",
        }
    }
}

impl fmt::Display for AuthEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown auth event payload: {0:?}")]
pub struct UnknownEvent(pub String);

impl FromStr for AuthEvent {
    type Err = UnknownEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "signIn" => Ok(Self::SignIn),
            "signOut" => Ok(Self::SignOut),
            other => Err(UnknownEvent(other.to_owned())),
        }
    }
}

/// A message as it travels on a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMessage {
    pub origin: Uuid,
    pub payload: String,
}

pub type EventHandler = Arc<dyn Fn(AuthEvent) + Send + Sync>;

// =============================================================================
// HUB
// =============================================================================

/// Named broadcast channels shared by every tab of a profile.
#[derive(Clone, Default)]
pub struct CrossTabHub {
    channels: Arc<Mutex<HashMap<String, broadcast::Sender<ChannelMessage>>>>,
}

impl CrossTabHub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn sender(&self, name: &str) -> broadcast::Sender<ChannelMessage> {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        channels
            .entry(name.to_owned())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }

    /// Open a tab-side endpoint of channel `name` with a fresh tab id.
    #[must_use]
    pub fn open(&self, name: &str) -> AuthChannel {
        AuthChannel {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            sender: self.sender(name),
            handler: Arc::new(Mutex::new(None)),
            listener: OnceLock::new(),
        }
    }
}

#[cfg(test)]
impl CrossTabHub {
    /// Raw view of every message on `name`, including each sender's own.
    pub(crate) fn tap(&self, name: &str) -> broadcast::Receiver<ChannelMessage> {
        self.sender(name).subscribe()
    }

    /// Inject a raw payload as if sent by another tab.
    pub(crate) fn post_raw(&self, name: &str, payload: &str) {
        let _ = self
            .sender(name)
            .send(ChannelMessage { origin: Uuid::nil(), payload: payload.to_owned() });
    }
}

// =============================================================================
// CHANNEL
// =============================================================================

/// One tab's endpoint on a named channel.
pub struct AuthChannel {
    id: Uuid,
    name: String,
    sender: broadcast::Sender<ChannelMessage>,
    handler: Arc<Mutex<Option<EventHandler>>>,
    listener: OnceLock<JoinHandle<()>>,
}

impl AuthChannel {
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fire-and-forget to every other tab on this channel.
    pub fn announce(&self, event: AuthEvent) {
        tracing::debug!(channel = %self.name, tab = %self.id, %event, "announcing auth event");
        // No other tab listening is not an error.
        let _ = self
            .sender
            .send(ChannelMessage { origin: self.id, payload: event.as_str().to_owned() });
    }

    /// Install the active handler, replacing any previous one.
    ///
    /// The first call subscribes and spawns the delivery task, so it must run
    /// inside a tokio runtime. Events announced before that are not replayed.
    pub fn on_receive<F>(&self, handler: F)
    where
        F: Fn(AuthEvent) + Send + Sync + 'static,
    {
        *self.handler.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(handler));
        self.listener.get_or_init(|| self.spawn_listener());
    }

    fn spawn_listener(&self) -> JoinHandle<()> {
        let mut rx = self.sender.subscribe();
        let handler = Arc::clone(&self.handler);
        let own_id = self.id;
        let name = self.name.clone();

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(msg) => {
                        if msg.origin == own_id {
                            continue;
                        }
                        let event = match msg.payload.parse::<AuthEvent>() {
                            Ok(event) => event,
                            Err(e) => {
                                tracing::debug!(channel = %name, error = %e, "ignoring message");
                                continue;
                            }
                        };
                        let current = handler
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .clone();
                        if let Some(h) = current {
                            h(event);
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(channel = %name, skipped, "auth channel receiver lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

impl Drop for AuthChannel {
    fn drop(&mut self) {
        if let Some(task) = self.listener.get() {
            task.abort();
        }
    }
}

// =============================================================================
// NOTIFIER
// =============================================================================

/// Per-tab, lazily opened handle on the auth channel.
pub struct Notifier {
    hub: CrossTabHub,
    name: String,
    channel: OnceLock<AuthChannel>,
}

impl Notifier {
    #[must_use]
    pub fn new(hub: CrossTabHub, name: impl Into<String>) -> Self {
        Self { hub, name: name.into(), channel: OnceLock::new() }
    }

    fn channel(&self) -> &AuthChannel {
        self.channel.get_or_init(|| {
            tracing::debug!(channel = %self.name, "opening auth channel");
            self.hub.open(&self.name)
        })
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.channel.get().is_some()
    }

    /// Tab id used to tag outgoing messages.
    #[must_use]
    pub fn tab_id(&self) -> Uuid {
        self.channel().id()
    }

    pub fn announce(&self, event: AuthEvent) {
        self.channel().announce(event);
    }

    pub fn on_receive<F>(&self, handler: F)
    where
        F: Fn(AuthEvent) + Send + Sync + 'static,
    {
        self.channel().on_receive(handler);
    }
}

#[cfg(test)]
#[path = "notifier_test.rs"]
mod tests;
