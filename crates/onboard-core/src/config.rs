//! Connector configuration.
//!
//! Configuration is plain JSON (camelCase keys). Every field is optional in
//! the file and falls back to the documented default:
//!
//! ```json
//! {
//!   "requestTimeoutMs": 20000,
//!   "fallbackGateway": "192.168.4.1",
//!   "busyPolicy": "reject",
//!   "ephemeralMinSdk": 29,
//!   "bindProcess": true
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::path::Path;
use std::time::Duration;

use crate::capability::EPHEMERAL_MIN_SDK;
use crate::gateway::DEFAULT_FALLBACK_GATEWAY;

/// Default bound on an ephemeral network request.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 20_000;

/// Errors that can occur while loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    ReadError(String),
    /// Configuration data is invalid.
    InvalidData(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(msg) => write!(f, "Read error: {}", msg),
            ConfigError::InvalidData(msg) => write!(f, "Invalid data: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// What to do with a connection call that overlaps one in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusyPolicy {
    /// Fail the second call immediately with `Busy`.
    #[default]
    Reject,
    /// Queue the second call until the first settles.
    Wait,
}

/// Connector settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectorConfig {
    /// Bounded wait for an ephemeral network request, in milliseconds.
    pub request_timeout_ms: u64,

    /// Gateway reported when the active link has no lease data.
    pub fallback_gateway: Ipv4Addr,

    /// Handling of overlapping `connect`/`connect_saved` calls.
    pub busy_policy: BusyPolicy,

    /// Lowest SDK level offering ephemeral network requests.
    pub ephemeral_min_sdk: u32,

    /// Bind process traffic to ephemeral networks on success.
    pub bind_process: bool,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            fallback_gateway: DEFAULT_FALLBACK_GATEWAY,
            busy_policy: BusyPolicy::Reject,
            ephemeral_min_sdk: EPHEMERAL_MIN_SDK,
            bind_process: true,
        }
    }
}

impl ConnectorConfig {
    /// Parse configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::InvalidData(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidData(
                "requestTimeoutMs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
