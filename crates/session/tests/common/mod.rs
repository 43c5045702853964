//! Shared fixtures for session integration tests.
//!
//! - [`FakeServer`]: `axum` server on an ephemeral port that records every
//!   request and answers with scripted JSON per `"METHOD /path"`.
//! - [`FakeProvider`]: in-memory [`AuthProvider`] publishing the same
//!   events a real provider would.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use chrono::Utc;
use tokio::sync::broadcast;

use pdfmate_client::ClientConfig;
use pdfmate_core::account::{AuthUser, Session};
use pdfmate_events::{AuthEvent, AuthEventBus, AuthEventKind};
use pdfmate_session::{
    AuthError, AuthProvider, AuthState, Credentials, EmailAddress, LocalCache, OAuthProvider,
    SessionHolder, SignUpOutcome, SignUpRequest,
};

/// Upper bound for anything the listener does in the background.
pub const WAIT: Duration = Duration::from_secs(5);

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ---------------------------------------------------------------------------
// FakeServer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub apikey: Option<String>,
    pub authorization: Option<String>,
    pub body: serde_json::Value,
}

#[derive(Default)]
struct ServerState {
    requests: Mutex<Vec<Recorded>>,
    scripted: Mutex<HashMap<String, (u16, String)>>,
    delays: Mutex<HashMap<String, Duration>>,
}

pub struct FakeServer {
    pub url: String,
    state: Arc<ServerState>,
}

impl FakeServer {
    pub async fn start() -> Self {
        init_tracing();
        let state = Arc::new(ServerState::default());
        let app = Router::new().fallback(handle).with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake server crashed");
        });

        Self {
            url: format!("http://{addr}"),
            state,
        }
    }

    /// Script the response for `method path`. Unscripted requests get `200 {}`.
    pub fn respond(&self, method: &str, path: &str, status: u16, body: &str) {
        self.state
            .scripted
            .lock()
            .unwrap()
            .insert(format!("{method} {path}"), (status, body.to_string()));
    }

    /// Hold the response to `method path` for `delay` after recording it.
    pub fn delay(&self, method: &str, path: &str, delay: Duration) {
        self.state
            .delays
            .lock()
            .unwrap()
            .insert(format!("{method} {path}"), delay);
    }

    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.state
            .requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.state.requests.lock().unwrap().len()
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.url.clone())
    }
}

async fn handle(
    State(state): State<Arc<ServerState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let path = uri.path().to_string();
    state.requests.lock().unwrap().push(Recorded {
        method: method.clone(),
        path: path.clone(),
        query: uri.query().map(str::to_string),
        apikey: header_value("apikey"),
        authorization: header_value(header::AUTHORIZATION.as_str()),
        body: serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null),
    });

    let key = format!("{method} {path}");
    let delay = state.delays.lock().unwrap().get(&key).copied();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let scripted = state.scripted.lock().unwrap().get(&key).cloned();
    let (status, body) = scripted.unwrap_or((200, "{}".to_string()));
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

/// Backend profile JSON for `id` on the given tier.
pub fn profile_json(id: &str, name: &str, tier: &str) -> String {
    serde_json::json!({
        "id": id,
        "email": format!("{id}@example.com"),
        "name": name,
        "subscriptionTier": tier,
        "role": "user"
    })
    .to_string()
}

// ---------------------------------------------------------------------------
// FakeProvider
// ---------------------------------------------------------------------------

/// In-memory auth provider. The user id is the local part of the email.
#[derive(Default)]
pub struct FakeProvider {
    events: AuthEventBus,
    calls: Mutex<Vec<String>>,
    fail_sign_out: AtomicBool,
    pending_sign_up: AtomicBool,
}

impl FakeProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_sign_out(&self) {
        self.fail_sign_out.store(true, Ordering::SeqCst);
    }

    pub fn require_email_confirmation(&self) {
        self.pending_sign_up.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn publish(&self, event: AuthEvent) {
        self.events.publish(event);
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }
}

pub fn session_for(user_id: &str) -> Session {
    Session {
        access_token: format!("token-{user_id}"),
        refresh_token: Some(format!("refresh-{user_id}")),
        expires_at: Utc::now() + chrono::Duration::hours(1),
        user: AuthUser {
            id: user_id.to_string(),
            email: Some(format!("{user_id}@example.com")),
            metadata: serde_json::Value::Null,
        },
    }
}

fn user_id_of(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

#[async_trait]
impl AuthProvider for FakeProvider {
    async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        self.record("sign_in");
        let session = session_for(user_id_of(&credentials.email));
        self.events
            .publish(AuthEvent::new(AuthEventKind::SignedIn).with_session(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpOutcome, AuthError> {
        self.record("sign_up");
        let session = session_for(user_id_of(&request.email));
        if self.pending_sign_up.load(Ordering::SeqCst) {
            return Ok(SignUpOutcome::PendingVerification(session.user));
        }
        self.events
            .publish(AuthEvent::new(AuthEventKind::SignedIn).with_session(session.clone()));
        Ok(SignUpOutcome::SignedIn(session))
    }

    async fn sign_out(&self, _access_token: &str) -> Result<(), AuthError> {
        self.record("sign_out");
        self.events.publish(AuthEvent::new(AuthEventKind::SignedOut));
        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(AuthError::Rejected {
                status: 503,
                message: "Auth service unavailable".into(),
            });
        }
        Ok(())
    }

    async fn reset_password_for_email(&self, _email: &EmailAddress) -> Result<(), AuthError> {
        self.record("reset_password");
        Ok(())
    }

    async fn update_user_metadata(
        &self,
        session: &Session,
        metadata: serde_json::Value,
    ) -> Result<Session, AuthError> {
        self.record("update_user_metadata");
        let mut updated = session.clone();
        updated.user.metadata = metadata;
        self.events
            .publish(AuthEvent::new(AuthEventKind::UserUpdated).with_session(updated.clone()));
        Ok(updated)
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, AuthError> {
        self.record("refresh_session");
        let user_id = refresh_token
            .strip_prefix("refresh-")
            .ok_or(AuthError::NoSession)?;
        let mut session = session_for(user_id);
        session.access_token = format!("token-{user_id}-refreshed");
        self.events
            .publish(AuthEvent::new(AuthEventKind::TokenRefreshed).with_session(session.clone()));
        Ok(session)
    }

    fn oauth_authorize_url(&self, provider: OAuthProvider) -> Result<String, AuthError> {
        Ok(format!("https://auth.test/authorize?provider={}", provider.as_str()))
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Holder over `provider`, backed by `server` and a cache in `cache_dir`.
pub fn holder(
    provider: &Arc<FakeProvider>,
    server: &FakeServer,
    cache_dir: &std::path::Path,
) -> Arc<SessionHolder> {
    let provider: Arc<dyn AuthProvider> = provider.clone();
    SessionHolder::connect(provider, server.client_config(), LocalCache::new(cache_dir))
}

/// Wait until the holder's state satisfies `predicate`.
pub async fn wait_for_state(
    holder: &SessionHolder,
    predicate: impl FnMut(&AuthState) -> bool,
) -> AuthState {
    let mut rx = holder.subscribe();
    let state = tokio::time::timeout(WAIT, rx.wait_for(predicate))
        .await
        .expect("timed out waiting for auth state")
        .expect("session store dropped");
    state.clone()
}

/// Poll until `check` passes or [`WAIT`] elapses.
pub async fn eventually<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + WAIT;
    while !check().await {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met in time"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
