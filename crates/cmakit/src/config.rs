//! Client configuration.

use crate::error::{Error, Result};
use std::fmt;

/// Default Management API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.contentful.com";

/// Environment variable holding the management token.
pub const TOKEN_ENV: &str = "CONTENTFUL_MANAGEMENT_TOKEN";

/// Environment variable overriding the API endpoint.
pub const BASE_URL_ENV: &str = "CONTENTFUL_BASE_URL";

/// Connection settings for the HTTP backend.
#[derive(Clone)]
pub struct ClientConfig {
    /// API base URL, without trailing slash
    pub base_url: String,
    /// Content Management API token
    pub token: String,
    /// Value of the `User-Agent` header
    pub user_agent: String,
}

impl ClientConfig {
    /// Create a config for the default endpoint.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: token.into(),
            user_agent: format!("cmakit/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Read the token and optional endpoint override from the environment.
    pub fn from_env() -> Result<Self> {
        let token = std::env::var(TOKEN_ENV)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| Error::Config(format!("{TOKEN_ENV} is not set")))?;

        let mut config = Self::new(token);
        if let Ok(base_url) = std::env::var(BASE_URL_ENV)
            && !base_url.trim().is_empty()
        {
            config = config.with_base_url(base_url);
        }
        Ok(config)
    }

    /// Override the API endpoint (useful for testing).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .finish()
    }
}
