//! Session and profile holder for the pdfmate client.
//!
//! - [`SessionHolder`]: app-wide "who is signed in" state, kept in sync
//!   with the auth provider's event stream.
//! - [`AuthProvider`]: seam over the remote auth service;
//!   [`GoTrueProvider`] is the REST implementation.
//! - [`SessionStore`]: observable state, also the API client's token source.
//! - [`LocalCache`]: best-effort JSON cache for offline starts.

pub mod cache;
pub mod config;
pub mod error;
pub mod gotrue;
pub mod holder;
pub mod provider;
pub mod store;

pub use cache::LocalCache;
pub use config::{AuthConfig, CacheConfig};
pub use error::AuthError;
pub use gotrue::GoTrueProvider;
pub use holder::SessionHolder;
pub use provider::{
    AuthProvider, Credentials, EmailAddress, OAuthProvider, SignUpOutcome, SignUpRequest,
};
pub use store::{AuthState, SessionStore};
