//! Remote endpoint configuration
//!
//! Sourced from the environment; a missing webhook URL is a queryable
//! condition (live mode disabled), never an error.

use std::env;
use std::time::Duration;

/// Environment variable holding the automation webhook URL
pub const WEBHOOK_URL_VAR: &str = "TRIAGE_WEBHOOK_URL";
/// Environment variable holding the incident-generation endpoint URL
pub const GENERATE_URL_VAR: &str = "TRIAGE_GENERATE_URL";
/// Environment variable holding the OpenAI API key
pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";
/// Environment variable holding the vector-index API key
pub const PINECONE_API_KEY_VAR: &str = "PINECONE_API_KEY";
/// Environment variable holding the vector-index host
pub const PINECONE_INDEX_HOST_VAR: &str = "PINECONE_INDEX_HOST";

/// Hard wall-clock bound on the remote trigger call
pub const DEFAULT_TRIGGER_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for the HTTP boundary
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Automation webhook endpoint; live mode is unavailable without it
    pub webhook_url: Option<String>,
    /// Incident-generation endpoint
    pub generate_url: Option<String>,
    /// OpenAI API key (direct generation and embeddings)
    pub openai_api_key: Option<String>,
    /// Vector-index API key (seeding)
    pub pinecone_api_key: Option<String>,
    /// Vector-index host (seeding)
    pub pinecone_index_host: Option<String>,
    /// Hard timeout for the trigger call
    pub trigger_timeout: Duration,
}

impl RemoteConfig {
    /// Empty configuration with the default timeout
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read configuration from the environment
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            webhook_url: non_empty_var(WEBHOOK_URL_VAR),
            generate_url: non_empty_var(GENERATE_URL_VAR),
            openai_api_key: non_empty_var(OPENAI_API_KEY_VAR),
            pinecone_api_key: non_empty_var(PINECONE_API_KEY_VAR),
            pinecone_index_host: non_empty_var(PINECONE_INDEX_HOST_VAR),
            trigger_timeout: DEFAULT_TRIGGER_TIMEOUT,
        }
    }

    /// With webhook URL
    #[inline]
    #[must_use]
    pub fn with_webhook_url(mut self, url: impl Into<String>) -> Self {
        self.webhook_url = Some(url.into());
        self
    }

    /// With generation endpoint URL
    #[inline]
    #[must_use]
    pub fn with_generate_url(mut self, url: impl Into<String>) -> Self {
        self.generate_url = Some(url.into());
        self
    }

    /// With OpenAI API key
    #[inline]
    #[must_use]
    pub fn with_openai_api_key(mut self, key: impl Into<String>) -> Self {
        self.openai_api_key = Some(key.into());
        self
    }

    /// With trigger timeout
    #[inline]
    #[must_use]
    pub fn with_trigger_timeout(mut self, timeout: Duration) -> Self {
        self.trigger_timeout = timeout;
        self
    }

    /// Pure check: can live mode be offered?
    #[inline]
    #[must_use]
    pub fn live_available(&self) -> bool {
        self.webhook_url.is_some()
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            generate_url: None,
            openai_api_key: None,
            pinecone_api_key: None,
            pinecone_index_host: None,
            trigger_timeout: DEFAULT_TRIGGER_TIMEOUT,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}
