//! App-wide session and profile holder.
//!
//! [`SessionHolder`] is the single source of truth for "who is signed in".
//! A background listener consumes the provider's [`AuthEvent`] stream and
//! writes the session into the [`SessionStore`]; the profile is fetched
//! from the backend after every session change, with the local cache as a
//! same-user fallback when the backend is unreachable.
//!
//! Operations that get a session back from the provider store it at once,
//! so callers see it as soon as the call returns; the listener applies the
//! same session again when its event arrives and loads the profile.
//! The store refuses any change older than the newest one it applied, so
//! an event issued before a sign-out is dropped.
//!
//! Cache writes for a user are undone if that user is gone by the time the
//! write lands, so nothing survives a sign-out.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use pdfmate_client::{ApiClient, ClientConfig};
use pdfmate_core::account::{AuthUser, Profile, ProfileUpdate, Session};
use pdfmate_core::files::FileDescriptor;
use pdfmate_core::token::TokenSource;
use pdfmate_core::types::{Timestamp, UserId};
use pdfmate_events::{AuthEvent, AuthEventKind};

use crate::cache::{keys, LocalCache};
use crate::error::AuthError;
use crate::provider::{
    AuthProvider, Credentials, EmailAddress, OAuthProvider, SignUpOutcome, SignUpRequest,
};
use crate::store::{AuthState, SessionStore};

/// Shared session state plus the account operations that change it.
///
/// Created once at startup via [`SessionHolder::start`]; the returned
/// `Arc` can be cloned into every screen that needs it.
pub struct SessionHolder {
    provider: Arc<dyn AuthProvider>,
    api: ApiClient,
    store: Arc<SessionStore>,
    cache: LocalCache,
    cancel: CancellationToken,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl SessionHolder {
    /// Subscribe to `provider` and spawn the event listener.
    ///
    /// The subscription is taken before this returns, so events published
    /// afterwards are never missed. `api` should draw its bearer token from
    /// `store`.
    pub fn start(
        provider: Arc<dyn AuthProvider>,
        api: ApiClient,
        store: Arc<SessionStore>,
        cache: LocalCache,
    ) -> Arc<Self> {
        let events = provider.subscribe();
        let cancel = CancellationToken::new();

        let listener = Listener {
            api: api.clone(),
            store: Arc::clone(&store),
            cache: cache.clone(),
        };
        let handle = tokio::spawn(listener.run(events, cancel.clone()));

        Arc::new(Self {
            provider,
            api,
            store,
            cache,
            cancel,
            listener: Mutex::new(Some(handle)),
        })
    }

    /// Wire a fresh store, API client and listener together.
    pub fn connect(
        provider: Arc<dyn AuthProvider>,
        client_config: ClientConfig,
        cache: LocalCache,
    ) -> Arc<Self> {
        let store = Arc::new(SessionStore::new());
        let tokens: Arc<dyn TokenSource> = store.clone();
        let api = ApiClient::new(client_config, tokens);
        Self::start(provider, api, store, cache)
    }

    /// Stop the listener and wait for it to exit.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let handle = self.listener.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Session listener panicked");
            }
        }
        tracing::info!("Session holder shut down");
    }

    // ---- state ----

    pub fn state(&self) -> AuthState {
        self.store.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.store.subscribe()
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.store.current().user().cloned()
    }

    pub fn session(&self) -> Option<Session> {
        self.store.current().session
    }

    pub fn profile(&self) -> Option<Profile> {
        self.store.current().profile
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.current().is_authenticated()
    }

    pub fn is_pro(&self) -> bool {
        self.store.current().is_pro()
    }

    pub fn is_admin(&self) -> bool {
        self.store.current().is_admin()
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    // ---- auth operations ----

    /// Validate locally, then sign in. The profile follows via the listener.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let credentials = Credentials::new(email, password)?;
        let issued_at = Utc::now();
        let session = self.provider.sign_in_with_password(&credentials).await?;
        self.adopt(&session, issued_at);
        Ok(session)
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<SignUpOutcome, AuthError> {
        let request = SignUpRequest::new(email, password, name)?;
        let issued_at = Utc::now();
        let outcome = self.provider.sign_up(&request).await?;
        if let SignUpOutcome::SignedIn(session) = &outcome {
            self.adopt(session, issued_at);
        }
        Ok(outcome)
    }

    /// Sign out remotely, then clear local state and cache.
    ///
    /// Local state is cleared even when the remote call fails; that failure
    /// is still returned. Sessions issued before this call are refused
    /// afterwards, including ones whose events are still in flight.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let token = self.store.current().session.map(|s| s.access_token);
        let result = match token {
            Some(token) => self.provider.sign_out(&token).await,
            None => Ok(()),
        };

        self.store.end_session(Utc::now());
        self.cache.clear().await;
        tracing::info!(remote_ok = result.is_ok(), "Signed out");
        result
    }

    pub async fn reset_password(&self, email: &str) -> Result<(), AuthError> {
        let email = EmailAddress::new(email)?;
        self.provider.reset_password_for_email(&email).await
    }

    /// Replace the provider-side user metadata of the current session.
    pub async fn update_user_metadata(
        &self,
        metadata: serde_json::Value,
    ) -> Result<Session, AuthError> {
        let session = self.session().ok_or(AuthError::NoSession)?;
        let issued_at = Utc::now();
        let updated = self.provider.update_user_metadata(&session, metadata).await?;
        self.adopt(&updated, issued_at);
        Ok(updated)
    }

    /// Exchange the current refresh token for a new session.
    pub async fn refresh_session(&self) -> Result<Session, AuthError> {
        let refresh_token = self
            .session()
            .and_then(|s| s.refresh_token)
            .ok_or(AuthError::NoSession)?;
        let issued_at = Utc::now();
        let session = self.provider.refresh_session(&refresh_token).await?;
        self.adopt(&session, issued_at);
        Ok(session)
    }

    pub fn oauth_url(&self, provider: OAuthProvider) -> Result<String, AuthError> {
        self.provider.oauth_authorize_url(provider)
    }

    /// Store a session the provider just returned, unless a change newer
    /// than `issued_at` has superseded it.
    fn adopt(&self, session: &Session, issued_at: Timestamp) {
        if !self.store.set_session(session.clone(), issued_at) {
            tracing::debug!(user_id = %session.user.id, "Session superseded by a newer change");
        }
    }

    // ---- profile ----

    /// Re-fetch the profile. `Ok(None)` without touching the network when
    /// nobody is signed in.
    pub async fn refresh_profile(&self) -> Result<Option<Profile>, AuthError> {
        if !self.is_authenticated() {
            return Ok(None);
        }
        let profile = self.api.get_profile().await?;
        apply_profile(&self.store, &self.cache, &profile).await;
        Ok(Some(profile))
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Profile, AuthError> {
        if !self.is_authenticated() {
            return Err(AuthError::NoSession);
        }
        if update.is_empty() {
            return Err(AuthError::InvalidInput("Nothing to update".into()));
        }
        let profile = self.api.update_profile(update).await?;
        apply_profile(&self.store, &self.cache, &profile).await;
        Ok(profile)
    }

    /// Usage stats from the backend, falling back to the signed-in user's
    /// last cached copy.
    pub async fn stats(&self) -> Result<serde_json::Value, AuthError> {
        let user_id = self
            .state()
            .user_id()
            .map(str::to_owned)
            .ok_or(AuthError::NoSession)?;

        match self.api.get_stats().await {
            Ok(stats) => {
                let entry = CachedStats { user_id, stats };
                let owner = entry.user_id.as_str();
                cache_for_user(&self.store, &self.cache, owner, keys::STATS, &entry).await;
                Ok(entry.stats)
            }
            Err(e) => match self.cache.read::<CachedStats>(keys::STATS).await {
                Some(cached) if cached.user_id == user_id => {
                    tracing::warn!(
                        user_id = %user_id,
                        error = %e,
                        "Stats fetch failed, using cached copy"
                    );
                    Ok(cached.stats)
                }
                _ => Err(e.into()),
            },
        }
    }

    pub async fn record_recent_file(&self, file: FileDescriptor) {
        self.cache.push_recent_file(file).await;
    }

    pub async fn recent_files(&self) -> Vec<FileDescriptor> {
        self.cache.recent_files().await
    }
}

/// Stats as cached on disk, tagged with the user they belong to.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CachedStats {
    user_id: UserId,
    stats: serde_json::Value,
}

/// Store `profile` if it still matches the signed-in user, and cache it.
async fn apply_profile(store: &SessionStore, cache: &LocalCache, profile: &Profile) -> bool {
    if !store.set_profile(profile.clone()) {
        tracing::debug!(profile_id = %profile.id, "Ignoring profile for another user");
        return false;
    }
    cache_for_user(store, cache, &profile.id, keys::PROFILE, profile).await;
    true
}

/// Write `value` under `key` on behalf of `user_id`.
///
/// Sign-out clears the store before the cache, so checking the store after
/// the write catches a sign-out that raced it; the entry is removed again.
async fn cache_for_user<T: Serialize>(
    store: &SessionStore,
    cache: &LocalCache,
    user_id: &str,
    key: &str,
    value: &T,
) {
    cache.write(key, value).await;
    if store.current().user_id() != Some(user_id) {
        tracing::debug!(user_id, key, "User gone before cache write landed, removing entry");
        cache.remove(key).await;
    }
}

// ---------------------------------------------------------------------------
// Listener
// ---------------------------------------------------------------------------

/// State the background task needs. Holds no reference to the holder.
struct Listener {
    api: ApiClient,
    store: Arc<SessionStore>,
    cache: LocalCache,
}

impl Listener {
    async fn run(self, mut events: broadcast::Receiver<AuthEvent>, cancel: CancellationToken) {
        tracing::debug!("Session listener started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                received = events.recv() => match received {
                    Ok(event) => self.handle(event).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Session listener lagged, events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("Auth event stream closed");
                        break;
                    }
                },
            }
        }
        tracing::debug!("Session listener stopped");
    }

    async fn handle(&self, event: AuthEvent) {
        tracing::debug!(kind = ?event.kind, "Auth event");

        if event.establishes_session() {
            if let Some(session) = event.session {
                let user_id = session.user.id.clone();
                if self.store.set_session(session, event.timestamp) {
                    self.load_profile(&user_id).await;
                } else {
                    tracing::debug!(
                        user_id = %user_id,
                        kind = ?event.kind,
                        "Dropping session older than current state"
                    );
                }
            }
            return;
        }

        match event.kind {
            AuthEventKind::SignedOut => {
                if self.store.end_session(event.timestamp) {
                    self.cache.clear().await;
                }
            }
            AuthEventKind::InitialSession => {
                self.store.end_session(event.timestamp);
            }
            AuthEventKind::PasswordRecovery => {
                tracing::info!("Password recovery link opened");
            }
            kind => tracing::debug!(?kind, "Auth event without session ignored"),
        }
    }

    /// Fetch the profile for `user_id`, or fall back to the cached copy.
    async fn load_profile(&self, user_id: &str) {
        let error = match self.api.get_profile().await {
            Ok(profile) => {
                apply_profile(&self.store, &self.cache, &profile).await;
                return;
            }
            Err(e) => e,
        };

        match self.cache.read::<Profile>(keys::PROFILE).await {
            Some(cached) if cached.id == user_id => {
                tracing::warn!(user_id, error = %error, "Profile fetch failed, using cached profile");
                self.store.set_profile(cached);
            }
            _ => {
                tracing::warn!(user_id, error = %error, "Profile fetch failed, no cached profile");
            }
        }
    }
}
