use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Connection settings for the portal backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    /// Base URL of the backend, e.g. `http://localhost:8000`.
    pub base_url: String,
    /// Timeout for plain REST calls, in seconds. Streaming chat requests are
    /// exempt; their lifetime is bounded by the stream itself.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl PortalConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: default_timeout_secs(),
        }
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Read the backend location from the `PORTAL_API_URL` environment
    /// variable.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("PORTAL_API_URL")
            .context("PORTAL_API_URL environment variable is required")?;
        Ok(Self::new(base_url))
    }
}
