//! Bridge message types.
//!
//! This module defines the JSON bodies exchanged with the onboarding bridge:
//! - Client → Bridge: ConnectRequest, ConnectSavedRequest
//! - Bridge → Client: OutcomeResponse, GatewayResponse, SavedResponse,
//!   CurrentSsidResponse, SavedListResponse
//!
//! Field names are camelCase on the wire.

use serde::{Deserialize, Serialize};

use onboard_core::{
    ConnectionOutcome, ConnectionRequest, ErrorKind, GatewayAddress, NetworkCredential,
    StrategyHint, StrategyKind,
};

fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

// ============================================================================
// Requests (Client → Bridge)
// ============================================================================

/// Request to join a network with fresh credentials.
///
/// # Example
/// ```json
/// { "ssid": "DeviceAP", "password": "password123", "strategy": "ephemeral" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectRequest {
    pub ssid: String,

    /// Empty or absent means an open network.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Force a strategy instead of letting the platform level decide.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<StrategyKind>,
}

impl ConnectRequest {
    /// Convert into a connector request.
    pub fn into_request(self) -> ConnectionRequest {
        let credential = NetworkCredential::new(self.ssid, self.password.unwrap_or_default());
        let hint = match self.strategy {
            Some(kind) => StrategyHint::Prefer(kind),
            None => StrategyHint::Auto,
        };
        ConnectionRequest::new(credential).with_hint(hint)
    }
}

/// Request to re-activate a saved network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectSavedRequest {
    pub ssid: String,
}

// ============================================================================
// Responses (Bridge → Client)
// ============================================================================

/// Result of a connection attempt.
///
/// # Example
/// ```json
/// {
///   "success": true,
///   "boundHandle": 100,
///   "strategy": "ephemeral",
///   "timestamp": "2024-01-17T10:30:00.000Z"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeResponse {
    pub success: bool,

    /// Network the bridge process is bound to, for ephemeral successes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bound_handle: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<StrategyKind>,

    /// Time the outcome was produced, ISO 8601.
    pub timestamp: String,
}

impl From<&ConnectionOutcome> for OutcomeResponse {
    fn from(outcome: &ConnectionOutcome) -> Self {
        Self {
            success: outcome.succeeded(),
            bound_handle: outcome.bound_handle().map(|h| h.0),
            error: outcome.failure_reason(),
            strategy: outcome.strategy(),
            timestamp: now_timestamp(),
        }
    }
}

/// Gateway of the current association.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayResponse {
    /// Dotted-quad address.
    pub gateway: String,
    /// True when no lease was available and the configured fallback is reported.
    pub fallback: bool,
}

impl From<&GatewayAddress> for GatewayResponse {
    fn from(address: &GatewayAddress) -> Self {
        Self {
            gateway: address.to_string(),
            fallback: address.is_fallback(),
        }
    }
}

/// Whether a single SSID has a saved profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedResponse {
    pub ssid: String,
    pub saved: bool,
}

/// The SSID of the active association, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentSsidResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssid: Option<String>,
}

/// All saved SSIDs, unquoted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedListResponse {
    pub ssids: Vec<String>,
}

// ============================================================================
// Unified Message Enum
// ============================================================================

/// Messages the bridge sends back to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BridgeResponse {
    Outcome(OutcomeResponse),
    Gateway(GatewayResponse),
    Saved(SavedResponse),
    SavedList(SavedListResponse),
    CurrentSsid(CurrentSsidResponse),
}
