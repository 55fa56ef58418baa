//! Onboarding data model.
//!
//! These types describe what flows between the caller, the connector and the
//! platform network stack:
//! - Credentials and per-call connection requests
//! - The single outcome produced by each connection attempt
//! - Saved profiles and lease data observed from the platform
//! - The failure taxonomy shared by every layer

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use thiserror::Error;

/// Maximum SSID length per IEEE 802.11.
pub const MAX_SSID_LEN: usize = 32;

/// Minimum WPA2 passphrase length.
pub const MIN_PASSPHRASE_LEN: usize = 8;

/// Maximum WPA2 passphrase length.
pub const MAX_PASSPHRASE_LEN: usize = 63;

/// Failure kinds reported by connection attempts.
///
/// Every platform fault is translated into one of these before it reaches
/// the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Malformed or missing input, detected before any platform call.
    #[error("invalid argument")]
    InvalidArgument,

    /// The platform could not establish the requested link.
    #[error("network unavailable")]
    NetworkUnavailable,

    /// The platform refused to register a persistent profile.
    #[error("configuration rejected")]
    ConfigurationRejected,

    /// No saved profile matches the requested SSID.
    #[error("saved network not found")]
    NotFound,

    /// Another connection attempt is already in flight.
    #[error("connection attempt already in progress")]
    Busy,

    /// The bounded wait for the platform expired.
    #[error("timed out waiting for network")]
    Timeout,

    /// No connection strategy applies on this OS version.
    #[error("platform unsupported")]
    PlatformUnsupported,
}

/// WiFi credentials for an onboarding hotspot.
///
/// The SSID is always in unquoted form. An empty or missing password
/// denotes an open network.
#[derive(Clone, PartialEq, Eq)]
pub struct NetworkCredential {
    /// Network name (1-32 bytes, unquoted).
    pub ssid: String,
    /// WPA2 passphrase, `None` or empty for open networks.
    pub password: Option<String>,
}

impl NetworkCredential {
    /// Credentials for a WPA2-secured network.
    pub fn new(ssid: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            ssid: ssid.into(),
            password: Some(password.into()),
        }
    }

    /// Credentials for an open network.
    pub fn open(ssid: impl Into<String>) -> Self {
        Self {
            ssid: ssid.into(),
            password: None,
        }
    }

    /// The passphrase, if this is a secured network.
    pub fn passphrase(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }

    /// Check if this is an open network (no password).
    pub fn is_open(&self) -> bool {
        self.passphrase().is_none()
    }

    /// Validate the credential before it is handed to the platform.
    pub fn validate(&self) -> Result<(), ErrorKind> {
        if self.ssid.is_empty() || self.ssid.len() > MAX_SSID_LEN || self.ssid.contains('"') {
            return Err(ErrorKind::InvalidArgument);
        }

        if let Some(pass) = self.passphrase() {
            if !(MIN_PASSPHRASE_LEN..=MAX_PASSPHRASE_LEN).contains(&pass.len()) {
                return Err(ErrorKind::InvalidArgument);
            }
        }

        Ok(())
    }
}

impl fmt::Debug for NetworkCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkCredential")
            .field("ssid", &self.ssid)
            .field("password", &self.passphrase().map(|_| "<redacted>"))
            .finish()
    }
}

/// Connection strategy variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StrategyKind {
    /// Transient network request, no saved profile (modern platforms).
    Ephemeral,
    /// Saved profile written to the OS store, then activated (legacy platforms).
    PersistentProfile,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Ephemeral => write!(f, "ephemeral"),
            StrategyKind::PersistentProfile => write!(f, "persistent-profile"),
        }
    }
}

/// Caller preference for strategy selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StrategyHint {
    /// Let the capability detector decide.
    #[default]
    Auto,
    /// Use this variant, or fail with `PlatformUnsupported`.
    Prefer(StrategyKind),
}

/// A single connection attempt. Consumed by one `connect` call.
#[derive(Debug, Clone)]
pub struct ConnectionRequest {
    pub credential: NetworkCredential,
    pub strategy_hint: StrategyHint,
}

impl ConnectionRequest {
    pub fn new(credential: NetworkCredential) -> Self {
        Self {
            credential,
            strategy_hint: StrategyHint::Auto,
        }
    }

    pub fn with_hint(mut self, hint: StrategyHint) -> Self {
        self.strategy_hint = hint;
        self
    }
}

/// Opaque handle of a platform network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkHandle(pub u64);

impl fmt::Display for NetworkHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "net#{}", self.0)
    }
}

/// Identifier of a registered platform network request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

/// Platform identifier of a saved network profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProfileId(pub i32);

/// Result of one connection attempt. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionOutcome {
    succeeded: bool,
    bound_handle: Option<NetworkHandle>,
    failure_reason: Option<ErrorKind>,
    strategy: Option<StrategyKind>,
}

impl ConnectionOutcome {
    /// A successful attempt, optionally carrying the new network's handle.
    pub fn success(handle: Option<NetworkHandle>) -> Self {
        Self {
            succeeded: true,
            bound_handle: handle,
            failure_reason: None,
            strategy: None,
        }
    }

    /// A failed attempt.
    pub fn failure(kind: ErrorKind) -> Self {
        Self {
            succeeded: false,
            bound_handle: None,
            failure_reason: Some(kind),
            strategy: None,
        }
    }

    /// Tag the outcome with the strategy that produced it.
    pub fn with_strategy(mut self, kind: StrategyKind) -> Self {
        self.strategy = Some(kind);
        self
    }

    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    pub fn bound_handle(&self) -> Option<NetworkHandle> {
        self.bound_handle
    }

    pub fn failure_reason(&self) -> Option<ErrorKind> {
        self.failure_reason
    }

    /// The strategy that produced this outcome, `None` if the attempt failed
    /// before a strategy was chosen.
    pub fn strategy(&self) -> Option<StrategyKind> {
        self.strategy
    }
}

/// A saved network profile, as seen by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedNetworkProfile {
    pub platform_id: ProfileId,
    /// Normalized (unquoted) SSID.
    pub ssid: String,
}

/// Raw DHCP lease data of the active link.
///
/// Addresses are stored the way the platform reports them: the first octet
/// on the wire is the least significant byte of the integer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DhcpInfo {
    pub gateway: u32,
    pub ip_address: u32,
    pub netmask: u32,
}

/// Gateway address of the active network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewayAddress {
    addr: Ipv4Addr,
    fallback: bool,
}

impl GatewayAddress {
    /// A gateway taken from lease data.
    pub fn resolved(addr: Ipv4Addr) -> Self {
        Self {
            addr,
            fallback: false,
        }
    }

    /// The configured fallback gateway.
    pub fn fallback(addr: Ipv4Addr) -> Self {
        Self {
            addr,
            fallback: true,
        }
    }

    pub fn octets(&self) -> [u8; 4] {
        self.addr.octets()
    }

    pub fn addr(&self) -> Ipv4Addr {
        self.addr
    }

    /// Whether lease data was missing and the fallback was returned.
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }
}

impl fmt::Display for GatewayAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_validation() {
        assert!(NetworkCredential::open("DeviceAP").validate().is_ok());
        assert!(NetworkCredential::new("DeviceAP", "").validate().is_ok());
        assert!(NetworkCredential::new("DeviceAP", "password123").validate().is_ok());

        assert_eq!(
            NetworkCredential::open("").validate(),
            Err(ErrorKind::InvalidArgument)
        );
        assert_eq!(
            NetworkCredential::open("a".repeat(33)).validate(),
            Err(ErrorKind::InvalidArgument)
        );
        assert_eq!(
            NetworkCredential::open("\"quoted\"").validate(),
            Err(ErrorKind::InvalidArgument)
        );
        assert_eq!(
            NetworkCredential::new("DeviceAP", "short").validate(),
            Err(ErrorKind::InvalidArgument)
        );
        assert_eq!(
            NetworkCredential::new("DeviceAP", "x".repeat(64)).validate(),
            Err(ErrorKind::InvalidArgument)
        );
    }

    #[test]
    fn test_empty_password_is_open() {
        assert!(NetworkCredential::new("DeviceAP", "").is_open());
        assert!(NetworkCredential::open("DeviceAP").is_open());
        assert!(!NetworkCredential::new("DeviceAP", "password123").is_open());
    }

    #[test]
    fn test_debug_redacts_password() {
        let cred = NetworkCredential::new("DeviceAP", "hunter2hunter2");
        let printed = format!("{:?}", cred);
        assert!(printed.contains("DeviceAP"));
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn test_outcome_constructors() {
        let ok = ConnectionOutcome::success(Some(NetworkHandle(7)))
            .with_strategy(StrategyKind::Ephemeral);
        assert!(ok.succeeded());
        assert_eq!(ok.bound_handle(), Some(NetworkHandle(7)));
        assert_eq!(ok.failure_reason(), None);
        assert_eq!(ok.strategy(), Some(StrategyKind::Ephemeral));

        let failed = ConnectionOutcome::failure(ErrorKind::NotFound);
        assert!(!failed.succeeded());
        assert_eq!(failed.bound_handle(), None);
        assert_eq!(failed.failure_reason(), Some(ErrorKind::NotFound));
        assert_eq!(failed.strategy(), None);
    }

    #[test]
    fn test_error_kind_serialization() {
        let json = serde_json::to_string(&ErrorKind::ConfigurationRejected).unwrap();
        assert_eq!(json, "\"CONFIGURATION_REJECTED\"");
    }
}
