use std::path::PathBuf;
use std::time::Duration;

use pdfmate_client::config::{parse_var, required_var};
use pdfmate_client::ConfigError;

/// Default timeout for auth requests, in seconds.
const DEFAULT_AUTH_TIMEOUT_SECS: u64 = 30;

/// Default directory for the local JSON cache.
const DEFAULT_CACHE_DIR: &str = ".pdfmate-cache";

/// Auth provider configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Base URL of the auth service, without a trailing slash.
    pub auth_url: String,
    /// Public (anon) API key sent as the `apikey` header.
    pub anon_key: String,
    /// Where OAuth flows redirect back to, if anywhere.
    pub redirect_url: Option<String>,
    pub request_timeout: Duration,
}

impl AuthConfig {
    pub fn new(auth_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            auth_url: auth_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            redirect_url: None,
            request_timeout: Duration::from_secs(DEFAULT_AUTH_TIMEOUT_SECS),
        }
    }

    pub fn with_redirect_url(mut self, url: impl Into<String>) -> Self {
        self.redirect_url = Some(url.into());
        self
    }

    /// Load configuration from environment variables.
    ///
    /// | Env Var                        | Required | Default |
    /// |--------------------------------|----------|---------|
    /// | `PDFMATE_AUTH_URL`             | **yes**  | --      |
    /// | `PDFMATE_AUTH_ANON_KEY`        | **yes**  | --      |
    /// | `PDFMATE_AUTH_REDIRECT_URL`    | no       | --      |
    /// | `PDFMATE_AUTH_TIMEOUT_SECS`    | no       | `30`    |
    pub fn from_env() -> Result<Self, ConfigError> {
        let auth_url = required_var("PDFMATE_AUTH_URL")?;
        let anon_key = required_var("PDFMATE_AUTH_ANON_KEY")?;
        let redirect_url = required_var("PDFMATE_AUTH_REDIRECT_URL").ok();
        let timeout_secs = parse_var("PDFMATE_AUTH_TIMEOUT_SECS", DEFAULT_AUTH_TIMEOUT_SECS)?;

        let mut config = Self::new(auth_url, anon_key);
        config.redirect_url = redirect_url;
        config.request_timeout = Duration::from_secs(timeout_secs);
        Ok(config)
    }

    /// Load a `.env` file if present, then read the environment.
    pub fn from_dotenv() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }
}

/// Local cache configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub dir: PathBuf,
}

impl CacheConfig {
    /// | Env Var             | Required | Default          |
    /// |---------------------|----------|------------------|
    /// | `PDFMATE_CACHE_DIR` | no       | `.pdfmate-cache` |
    pub fn from_env() -> Self {
        let dir = required_var("PDFMATE_CACHE_DIR").unwrap_or_else(|_| DEFAULT_CACHE_DIR.into());
        Self { dir: dir.into() }
    }
}
