//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! An auth provider owns one [`AuthEventBus`] and publishes an
//! [`AuthEvent`] for every session change. Consumers hold a receiver from
//! [`AuthEventBus::subscribe`]; dropping the receiver unsubscribes.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use pdfmate_core::account::Session;
use pdfmate_core::types::Timestamp;

// ---------------------------------------------------------------------------
// AuthEvent
// ---------------------------------------------------------------------------

/// What happened to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEventKind {
    /// Emitted once on startup with whatever session was restored.
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
    /// A password-recovery link was followed.
    PasswordRecovery,
}

/// A session-changed event.
///
/// Constructed via [`AuthEvent::new`] and enriched with
/// [`with_session`](AuthEvent::with_session).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthEvent {
    pub kind: AuthEventKind,

    /// Session after the change; `None` for sign-out.
    pub session: Option<Session>,

    /// When the event was created (UTC).
    pub timestamp: Timestamp,
}

impl AuthEvent {
    pub fn new(kind: AuthEventKind) -> Self {
        Self {
            kind,
            session: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    /// Whether this event leaves the app with a usable session.
    pub fn establishes_session(&self) -> bool {
        self.session.is_some()
            && matches!(
                self.kind,
                AuthEventKind::InitialSession
                    | AuthEventKind::SignedIn
                    | AuthEventKind::TokenRefreshed
                    | AuthEventKind::UserUpdated
            )
    }
}

// ---------------------------------------------------------------------------
// AuthEventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 64;

/// In-process fan-out event bus.
///
/// # Usage
///
/// ```rust
/// use pdfmate_events::bus::{AuthEvent, AuthEventBus, AuthEventKind};
///
/// let bus = AuthEventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(AuthEvent::new(AuthEventKind::SignedOut));
/// ```
pub struct AuthEventBus {
    sender: broadcast::Sender<AuthEvent>,
}

impl AuthEventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest events are dropped and slow
    /// receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no subscribers the event is dropped.
    pub fn publish(&self, event: AuthEvent) {
        tracing::debug!(kind = ?event.kind, "Publishing auth event");
        // A SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for AuthEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
