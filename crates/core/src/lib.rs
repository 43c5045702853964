//! Shared domain types for the pdfmate client stack.
//!
//! - [`account`]: session and profile model with derived flags.
//! - [`options`]: per-operation option structs and the default merge.
//! - [`progress`]: coarse progress milestones.
//! - [`token`]: the [`TokenSource`](token::TokenSource) seam.

pub mod account;
pub mod error;
pub mod files;
pub mod options;
pub mod progress;
pub mod roles;
pub mod token;
pub mod types;
