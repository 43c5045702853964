//! Well-known role and subscription tier names.
//!
//! These must match the values the backend stores on the user profile.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";

pub const TIER_FREE: &str = "free";
pub const TIER_PRO: &str = "pro";
pub const TIER_ENTERPRISE: &str = "enterprise";
