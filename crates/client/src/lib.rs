//! REST client for the pdfmate backend.
//!
//! - [`ApiClient`]: one method per backend endpoint, bearer token from a
//!   [`TokenSource`](pdfmate_core::token::TokenSource).
//! - [`PdfService`]: upload-then-transform pipeline with progress milestones.
//! - [`ClientConfig`]: environment-driven configuration.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod result;
pub mod service;
pub mod upload;

pub use api::ApiClient;
pub use config::{ClientConfig, ConfigError};
pub use error::ApiError;
pub use result::OperationResult;
pub use service::{BatchUploadError, PdfService};
pub use upload::LocalFile;
