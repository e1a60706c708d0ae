pub mod client;
pub mod error;
pub mod provider;
pub mod wire;

pub use client::ArgusClient;
pub use error::{ArgusError, ArgusResult};
pub use provider::HttpBackend;

use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// The analysis endpoint runs an LLM crew and routinely takes minutes.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);

/// Configuration for the Argus backend
#[derive(Debug, Clone)]
pub struct ArgusConfig {
    pub base_url: String,
    /// Transport-level timeout; `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for ArgusConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

impl ArgusConfig {
    /// Reads `ARGUS_API_URL` and `ARGUS_HTTP_TIMEOUT_SECS` (`0` disables the timeout).
    pub fn from_env() -> ArgusResult<Self> {
        let base_url = std::env::var("ARGUS_API_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let timeout = match std::env::var("ARGUS_HTTP_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    ArgusError::Config(format!("ARGUS_HTTP_TIMEOUT_SECS is not a number: {}", raw))
                })?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            Err(_) => Some(DEFAULT_TIMEOUT),
        };

        Ok(Self { base_url, timeout })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}
