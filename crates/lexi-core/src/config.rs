use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;
pub const DEFAULT_NOTIFICATION_MS: u64 = 3000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Client configuration, stored as `config.toml`.
///
/// Every field has a default so a partial (or missing) file is valid.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the backend that fronts the language and workspace services.
    pub api_base_url: String,
    /// Debounce window applied to both query modes.
    pub debounce_ms: u64,
    /// How long a transient notification stays visible.
    pub notification_ms: u64,
    /// Per-request timeout handed to the HTTP client.
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            notification_ms: DEFAULT_NOTIFICATION_MS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn notification_duration(&self) -> Duration {
        Duration::from_millis(self.notification_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
