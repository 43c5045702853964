use pdfmate_client::ApiError;

/// Errors surfaced by sign-in, sign-up and the other session operations.
///
/// Remote rejections carry the provider's own message so the UI can show
/// it as-is. Nothing here is retried.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Rejected locally before any request (bad email, short password).
    #[error("{0}")]
    InvalidInput(String),

    /// The auth provider refused the request.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// The HTTP request itself failed.
    #[error("Auth request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The operation needs a signed-in user.
    #[error("Not signed in")]
    NoSession,

    /// A backend (profile) call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A 2xx auth response did not have the expected shape.
    #[error("Unexpected auth response: {0}")]
    UnexpectedResponse(String),
}

impl From<validator::ValidationErrors> for AuthError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AuthError::InvalidInput(first_message(&errors))
    }
}

/// First human-readable message, ordered by field name for stability.
fn first_message(errors: &validator::ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));
    fields
        .iter()
        .flat_map(|(_, errs)| errs.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| errors.to_string())
}
