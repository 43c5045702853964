//! The auth provider seam.
//!
//! An [`AuthProvider`] performs the remote auth calls and publishes an
//! [`AuthEvent`](pdfmate_events::AuthEvent) for every session change. The
//! session holder consumes those events; return values of the calls below
//! are informational only.

use async_trait::async_trait;
use tokio::sync::broadcast;
use validator::Validate;

use pdfmate_core::account::{AuthUser, Session};
use pdfmate_events::AuthEvent;

use crate::error::AuthError;

/// Email/password pair for sign-in.
#[derive(Debug, Clone, Validate)]
pub struct Credentials {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

impl Credentials {
    /// Trim the email and validate both fields.
    pub fn new(email: &str, password: &str) -> Result<Self, AuthError> {
        let credentials = Self {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        credentials.validate()?;
        Ok(credentials)
    }
}

/// Account details for sign-up.
#[derive(Debug, Clone, Validate)]
pub struct SignUpRequest {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
}

impl SignUpRequest {
    pub fn new(email: &str, password: &str, name: &str) -> Result<Self, AuthError> {
        let request = Self {
            email: email.trim().to_string(),
            password: password.to_string(),
            name: name.trim().to_string(),
        };
        request.validate()?;
        Ok(request)
    }
}

/// Email address on its own (password reset).
#[derive(Debug, Clone, Validate)]
pub struct EmailAddress {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
}

impl EmailAddress {
    pub fn new(email: &str) -> Result<Self, AuthError> {
        let address = Self {
            email: email.trim().to_string(),
        };
        address.validate()?;
        Ok(address)
    }
}

/// Result of a sign-up.
#[derive(Debug, Clone, PartialEq)]
pub enum SignUpOutcome {
    /// The account is usable immediately.
    SignedIn(Session),
    /// The account exists but the email must be confirmed first.
    PendingVerification(AuthUser),
}

/// Third-party identity providers supported for OAuth sign-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Google,
    Apple,
}

impl OAuthProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Apple => "apple",
        }
    }
}

/// Remote auth operations plus the session-changed event stream.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Publishes `SignedIn` on success.
    async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<Session, AuthError>;

    /// Publishes `SignedIn` when the account is usable immediately.
    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpOutcome, AuthError>;

    /// Publishes `SignedOut` whether or not the remote call succeeds.
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;

    async fn reset_password_for_email(&self, email: &EmailAddress) -> Result<(), AuthError>;

    /// Replace the provider-side user metadata. Publishes `UserUpdated`.
    async fn update_user_metadata(
        &self,
        session: &Session,
        metadata: serde_json::Value,
    ) -> Result<Session, AuthError>;

    /// Exchange a refresh token for a new session. Publishes `TokenRefreshed`.
    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, AuthError>;

    /// URL to open in a browser to start an OAuth sign-in.
    fn oauth_authorize_url(&self, provider: OAuthProvider) -> Result<String, AuthError>;

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}
