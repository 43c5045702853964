//! Observable auth state.
//!
//! [`SessionStore`] keeps the current [`AuthState`] in a
//! `tokio::sync::watch` channel. Readers take cheap snapshots or hold a
//! receiver to be woken on change; dropping the receiver unsubscribes.
//!
//! A profile never outlives its session: every setter keeps
//! `session == None => profile == None`, and a profile for any user other
//! than the session's is ignored.
//!
//! Every change is stamped with the time it was issued, and a change
//! older than the newest one applied is refused. A sign-in event still
//! queued behind a sign-out therefore cannot revive the user, and an old
//! event for one user cannot replace a newer session of another.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::watch;

use pdfmate_core::account::{AuthUser, Profile, Session};
use pdfmate_core::token::TokenSource;
use pdfmate_core::types::Timestamp;

/// Snapshot of who is signed in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    pub session: Option<Session>,
    pub profile: Option<Profile>,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_pro(&self) -> bool {
        self.profile.as_ref().is_some_and(Profile::is_pro)
    }

    pub fn is_admin(&self) -> bool {
        self.profile.as_ref().is_some_and(Profile::is_admin)
    }

    pub fn user(&self) -> Option<&AuthUser> {
        self.session.as_ref().map(|s| &s.user)
    }

    pub fn user_id(&self) -> Option<&str> {
        self.session.as_ref().map(Session::user_id)
    }
}

/// Shared holder of the current [`AuthState`].
pub struct SessionStore {
    state: watch::Sender<AuthState>,
    /// Issue time of the newest applied change, in nanoseconds since the
    /// epoch. Only touched inside `state`'s modify closures, so the watch
    /// lock orders it.
    latest: AtomicI64,
}

impl SessionStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(AuthState::default());
        Self {
            state,
            latest: AtomicI64::new(i64::MIN),
        }
    }

    /// Clone of the current state.
    pub fn current(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Store a session issued at `issued_at`.
    ///
    /// Refused when a newer change has already been applied. The profile
    /// is kept only if the user is the same. Returns whether the session
    /// was stored.
    pub(crate) fn set_session(&self, session: Session, issued_at: Timestamp) -> bool {
        let issued_at = nanos(issued_at);
        self.state.send_if_modified(|state| {
            if !self.advance(issued_at) {
                return false;
            }
            let same_user = state.user_id() == Some(session.user_id());
            if !same_user {
                state.profile = None;
            }
            state.session = Some(session);
            true
        })
    }

    /// Apply `profile` if it belongs to the signed-in user.
    ///
    /// Returns whether it was applied.
    pub(crate) fn set_profile(&self, profile: Profile) -> bool {
        self.state.send_if_modified(|state| {
            if state.user_id() != Some(profile.id.as_str()) {
                return false;
            }
            state.profile = Some(profile);
            true
        })
    }

    /// Drop session and profile as of `at`.
    ///
    /// Refused when a newer change has already been applied; returns
    /// whether the end was applied.
    pub(crate) fn end_session(&self, at: Timestamp) -> bool {
        let at = nanos(at);
        let mut applied = false;
        self.state.send_if_modified(|state| {
            if !self.advance(at) {
                return false;
            }
            applied = true;
            if state.session.is_none() && state.profile.is_none() {
                return false;
            }
            *state = AuthState::default();
            true
        });
        applied
    }

    fn advance(&self, at: i64) -> bool {
        if at < self.latest.load(Ordering::Relaxed) {
            return false;
        }
        self.latest.store(at, Ordering::Relaxed);
        true
    }
}

fn nanos(at: Timestamp) -> i64 {
    at.timestamp_nanos_opt().unwrap_or(i64::MAX)
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenSource for SessionStore {
    /// The access token of the current session, unless it has expired.
    async fn access_token(&self) -> Option<String> {
        let state = self.state.borrow();
        state
            .session
            .as_ref()
            .filter(|s| !s.is_expired_at(Utc::now()))
            .map(|s| s.access_token.clone())
    }
}
