use std::time::Duration;

/// Default timeout for JSON requests, in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
/// Default timeout for multipart uploads, in seconds.
const DEFAULT_UPLOAD_TIMEOUT_SECS: u64 = 300;

/// Errors raised while reading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} must be a valid {expected}, got '{value}'")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Backend client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the REST backend, without a trailing slash.
    pub api_url: String,
    /// Timeout for JSON requests (default: `60`s).
    pub request_timeout: Duration,
    /// Timeout for multipart uploads (default: `300`s).
    pub upload_timeout: Duration,
}

impl ClientConfig {
    /// Configuration with default timeouts for the given backend URL.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: trim_base_url(api_url.into()),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            upload_timeout: Duration::from_secs(DEFAULT_UPLOAD_TIMEOUT_SECS),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// | Env Var                        | Required | Default |
    /// |--------------------------------|----------|---------|
    /// | `PDFMATE_API_URL`              | **yes**  | --      |
    /// | `PDFMATE_REQUEST_TIMEOUT_SECS` | no       | `60`    |
    /// | `PDFMATE_UPLOAD_TIMEOUT_SECS`  | no       | `300`   |
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = required_var("PDFMATE_API_URL")?;
        let request_timeout_secs =
            parse_var("PDFMATE_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?;
        let upload_timeout_secs =
            parse_var("PDFMATE_UPLOAD_TIMEOUT_SECS", DEFAULT_UPLOAD_TIMEOUT_SECS)?;

        Ok(Self {
            api_url: trim_base_url(api_url),
            request_timeout: Duration::from_secs(request_timeout_secs),
            upload_timeout: Duration::from_secs(upload_timeout_secs),
        })
    }

    /// Load a `.env` file if present, then read the environment.
    pub fn from_dotenv() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }
}

/// Read a required, non-empty environment variable.
pub fn required_var(var: &'static str) -> Result<String, ConfigError> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(ConfigError::Missing(var)),
    }
}

/// Read an optional `u64` environment variable, falling back to `default`.
pub fn parse_var(var: &'static str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(var) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            var,
            expected: "u64",
            value,
        }),
        Err(_) => Ok(default),
    }
}

pub(crate) fn trim_base_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
