//! Auth session event bus.
//!
//! - [`AuthEventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`AuthEvent`]: the session-changed envelope emitted by auth providers.

pub mod bus;

pub use bus::{AuthEvent, AuthEventBus, AuthEventKind};
