//! [`AuthProvider`] over a GoTrue-compatible REST auth service.
//!
//! Every request carries the public `apikey` header. Successful calls that
//! change the session publish on the provider's own [`AuthEventBus`].

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::broadcast;

use pdfmate_core::account::{AuthUser, Session};
use pdfmate_events::{AuthEvent, AuthEventBus, AuthEventKind};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::provider::{
    AuthProvider, Credentials, EmailAddress, OAuthProvider, SignUpOutcome, SignUpRequest,
};

/// Lifetime assumed when a token response carries neither `expires_at` nor
/// `expires_in`.
const FALLBACK_EXPIRY_SECS: i64 = 3600;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct UserDto {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: serde_json::Value,
}

impl From<UserDto> for AuthUser {
    fn from(dto: UserDto) -> Self {
        AuthUser {
            id: dto.id,
            email: dto.email,
            metadata: dto.user_metadata,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    /// Absolute expiry, unix seconds.
    #[serde(default)]
    expires_at: Option<i64>,
    /// Relative expiry, seconds from now.
    #[serde(default)]
    expires_in: Option<i64>,
    user: UserDto,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        let now = Utc::now();
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .or_else(|| self.expires_in.map(|secs| now + Duration::seconds(secs)))
            .unwrap_or_else(|| now + Duration::seconds(FALLBACK_EXPIRY_SECS));

        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// GoTrueProvider
// ---------------------------------------------------------------------------

/// GoTrue (Supabase-compatible) auth provider.
pub struct GoTrueProvider {
    client: reqwest::Client,
    config: AuthConfig,
    events: AuthEventBus,
}

impl GoTrueProvider {
    pub fn new(config: AuthConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(client: reqwest::Client, config: AuthConfig) -> Self {
        Self {
            client,
            config,
            events: AuthEventBus::default(),
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Publish the startup event with whatever session the app restored.
    ///
    /// Subscribers that attach after this call will not see it.
    pub fn publish_initial(&self, session: Option<Session>) {
        let mut event = AuthEvent::new(AuthEventKind::InitialSession);
        event.session = session;
        self.events.publish(event);
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.config.auth_url, path)
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.url(path))
            .timeout(self.config.request_timeout)
            .header("apikey", &self.config.anon_key)
    }

    async fn send_value(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<serde_json::Value, AuthError> {
        let response = ensure_success(request.send().await?).await?;
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| AuthError::UnexpectedResponse(e.to_string()))
    }

    async fn send_session(&self, request: reqwest::RequestBuilder) -> Result<Session, AuthError> {
        let value = self.send_value(request).await?;
        let token: TokenResponse = serde_json::from_value(value)
            .map_err(|e| AuthError::UnexpectedResponse(e.to_string()))?;
        Ok(token.into_session())
    }

    fn publish(&self, kind: AuthEventKind, session: &Session) {
        self.events
            .publish(AuthEvent::new(kind).with_session(session.clone()));
    }
}

#[async_trait]
impl AuthProvider for GoTrueProvider {
    async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let request = self
            .request(Method::POST, "/token")
            .query(&[("grant_type", "password")])
            .json(&json!({
                "email": credentials.email,
                "password": credentials.password,
            }));
        let session = self.send_session(request).await?;

        tracing::info!(user_id = %session.user.id, "Signed in");
        self.publish(AuthEventKind::SignedIn, &session);
        Ok(session)
    }

    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpOutcome, AuthError> {
        let http = self.request(Method::POST, "/signup").json(&json!({
            "email": request.email,
            "password": request.password,
            "data": { "name": request.name },
        }));
        let value = self.send_value(http).await?;

        if value.get("access_token").is_some() {
            let token: TokenResponse = serde_json::from_value(value)
                .map_err(|e| AuthError::UnexpectedResponse(e.to_string()))?;
            let session = token.into_session();
            tracing::info!(user_id = %session.user.id, "Signed up and signed in");
            self.publish(AuthEventKind::SignedIn, &session);
            return Ok(SignUpOutcome::SignedIn(session));
        }

        // Without a session the body is either the user itself or `{ user }`.
        let user_value = if value.get("user").is_some_and(serde_json::Value::is_object) {
            value["user"].clone()
        } else {
            value
        };
        let user: UserDto = serde_json::from_value(user_value)
            .map_err(|e| AuthError::UnexpectedResponse(e.to_string()))?;
        tracing::info!(user_id = %user.id, "Signed up, email confirmation pending");
        Ok(SignUpOutcome::PendingVerification(user.into()))
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let request = self
            .request(Method::POST, "/logout")
            .bearer_auth(access_token);
        let result = self.send_value(request).await.map(|_| ());

        if let Err(e) = &result {
            tracing::warn!(error = %e, "Remote sign-out failed");
        }
        self.events.publish(AuthEvent::new(AuthEventKind::SignedOut));
        result
    }

    async fn reset_password_for_email(&self, email: &EmailAddress) -> Result<(), AuthError> {
        let request = self
            .request(Method::POST, "/recover")
            .json(&json!({ "email": email.email }));
        self.send_value(request).await?;
        tracing::info!("Password reset email requested");
        Ok(())
    }

    async fn update_user_metadata(
        &self,
        session: &Session,
        metadata: serde_json::Value,
    ) -> Result<Session, AuthError> {
        let request = self
            .request(Method::PUT, "/user")
            .bearer_auth(&session.access_token)
            .json(&json!({ "data": metadata }));
        let value = self.send_value(request).await?;
        let user: UserDto = serde_json::from_value(value)
            .map_err(|e| AuthError::UnexpectedResponse(e.to_string()))?;

        let updated = Session {
            user: user.into(),
            ..session.clone()
        };
        self.publish(AuthEventKind::UserUpdated, &updated);
        Ok(updated)
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, AuthError> {
        let request = self
            .request(Method::POST, "/token")
            .query(&[("grant_type", "refresh_token")])
            .json(&json!({ "refresh_token": refresh_token }));
        let session = self.send_session(request).await?;

        tracing::debug!(user_id = %session.user.id, "Session refreshed");
        self.publish(AuthEventKind::TokenRefreshed, &session);
        Ok(session)
    }

    fn oauth_authorize_url(&self, provider: OAuthProvider) -> Result<String, AuthError> {
        let mut params = vec![("provider", provider.as_str())];
        if let Some(redirect) = self.config.redirect_url.as_deref() {
            params.push(("redirect_to", redirect));
        }
        reqwest::Url::parse_with_params(&self.url("/authorize"), &params)
            .map(String::from)
            .map_err(|e| AuthError::InvalidInput(format!("Invalid auth URL: {e}")))
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

/// Return the response unchanged on a 2xx status, otherwise
/// [`AuthError::Rejected`] with the provider's message.
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, AuthError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let path = response.url().path().to_string();
    let body = response.text().await.unwrap_or_default();
    let message = auth_error_message(status.as_u16(), &body);
    tracing::warn!(status = status.as_u16(), %path, error = %message, "Auth request rejected");

    Err(AuthError::Rejected {
        status: status.as_u16(),
        message,
    })
}

/// Pick the most specific message GoTrue put in an error body.
///
/// Tries `error_description`, `msg`, `message` and `error` in that order.
fn auth_error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| {
            ["error_description", "msg", "message", "error"]
                .iter()
                .find_map(|key| {
                    json.get(*key)
                        .and_then(|v| v.as_str())
                        .filter(|m| !m.trim().is_empty())
                        .map(str::to_string)
                })
        })
        .unwrap_or_else(|| format!("HTTP {status}"))
}
