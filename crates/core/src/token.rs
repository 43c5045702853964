//! Bearer-token seam between the operation client and the session holder.

use async_trait::async_trait;

/// Supplies the bearer token for authenticated backend requests.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Current access token, or `None` when signed out.
    async fn access_token(&self) -> Option<String>;
}

/// A fixed token, for tools and tests that bypass the session holder.
#[derive(Debug, Clone, Default)]
pub struct StaticToken(Option<String>);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> Option<String> {
        self.0.clone()
    }
}
