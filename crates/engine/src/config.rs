//! Engine configuration.

use std::time::Duration;
use pathtrack_storage::DEFAULT_STORAGE_KEY;

/// Configuration for the progress engine and its sync scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Remote progress service URL
    pub endpoint: String,
    /// Quiet period before a mutation is pushed
    pub debounce: Duration,
    /// Per-request timeout for the remote service
    pub request_timeout: Duration,
    /// Local persistence key
    pub storage_key: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080/progress".to_string(),
            debounce: Duration::from_millis(1000),
            request_timeout: Duration::from_secs(30),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl EngineConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the remote endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the push debounce delay.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Set the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the local persistence key.
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_default() {
        let config = EngineConfig::default();
        assert_eq!(config.debounce, Duration::from_secs(1));
        assert_eq!(config.storage_key, "placement_prep_progress");
    }

    #[test]
    fn test_engine_config_builder() {
        let config = EngineConfig::new()
            .with_endpoint("https://sync.example.com/progress")
            .with_debounce(Duration::from_millis(250))
            .with_request_timeout(Duration::from_secs(5))
            .with_storage_key("other");

        assert_eq!(config.endpoint, "https://sync.example.com/progress");
        assert_eq!(config.debounce, Duration::from_millis(250));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.storage_key, "other");
    }
}
