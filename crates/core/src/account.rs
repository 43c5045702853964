//! Session and profile model.
//!
//! A [`Session`] is owned by the auth provider; the app only ever holds a
//! read-only copy. A [`Profile`] is mirrored from the backend and cached
//! locally as a best-effort fallback, never as the source of truth.

use serde::{Deserialize, Serialize};

use crate::roles::{ROLE_ADMIN, ROLE_USER, TIER_ENTERPRISE, TIER_FREE, TIER_PRO};
use crate::types::{Timestamp, UserId};

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Identity attached to a session, as reported by the auth provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    pub email: Option<String>,
    /// Provider-side user metadata (display name etc.).
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// Authenticated identity plus bearer token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Timestamp,
    pub user: AuthUser,
}

impl Session {
    /// A session whose expiry is at or before `now` must not be used.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expires_at <= now
    }

    pub fn user_id(&self) -> &str {
        &self.user.id
    }
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// Subscription tier on the user profile. Unknown names and `null` decode
/// as `Free`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "Option<String>")]
pub enum SubscriptionTier {
    #[default]
    Free,
    Pro,
    Enterprise,
}

impl SubscriptionTier {
    pub fn from_name(name: &str) -> Self {
        match name {
            TIER_PRO => Self::Pro,
            TIER_ENTERPRISE => Self::Enterprise,
            _ => Self::Free,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Free => TIER_FREE,
            Self::Pro => TIER_PRO,
            Self::Enterprise => TIER_ENTERPRISE,
        }
    }
}

impl From<Option<String>> for SubscriptionTier {
    fn from(name: Option<String>) -> Self {
        name.as_deref().map(Self::from_name).unwrap_or_default()
    }
}

/// Account role on the user profile. Unknown names and `null` decode as
/// `User`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "Option<String>")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn from_name(name: &str) -> Self {
        match name {
            ROLE_ADMIN => Self::Admin,
            _ => Self::User,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => ROLE_USER,
            Self::Admin => ROLE_ADMIN,
        }
    }
}

impl From<Option<String>> for Role {
    fn from(name: Option<String>) -> Self {
        name.as_deref().map(Self::from_name).unwrap_or_default()
    }
}

/// User-editable account record mirrored from the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub subscription_tier: SubscriptionTier,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

impl Profile {
    /// Paid tiers (pro and enterprise) unlock the pro feature set.
    pub fn is_pro(&self) -> bool {
        matches!(
            self.subscription_tier,
            SubscriptionTier::Pro | SubscriptionTier::Enterprise
        )
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Partial profile update. Only fields that are `Some` are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.avatar_url.is_none()
    }
}
