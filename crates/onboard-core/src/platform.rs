//! Platform network stack abstraction.
//!
//! The active-network state and the saved-profile store belong to the OS.
//! This module describes the narrow operations the connector is allowed to
//! perform on them:
//! - `PlatformInfo`: OS version, for strategy selection
//! - `WifiManager`: saved profiles, association control, lease data
//! - `ConnectivityManager`: ephemeral network requests and process binding
//!
//! All methods are synchronous. Asynchronous platform events are delivered
//! through `NetworkCallback`, which the connector turns into futures.

use std::sync::Arc;
use thiserror::Error;

use crate::model::{DhcpInfo, NetworkHandle, ProfileId, RequestId};

/// Raw faults raised by the platform network stack.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    /// The platform refused the operation (duplicate, malformed, not permitted).
    #[error("rejected by platform: {0}")]
    Rejected(String),

    /// The service is not available (radio off, service not bound).
    #[error("platform service unavailable")]
    Unavailable,

    /// Any other platform failure.
    #[error("platform I/O error: {0}")]
    Io(String),
}

/// Key management of a saved profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyManagement {
    /// Open network.
    None,
    /// WPA/WPA2 pre-shared key.
    WpaPsk,
}

/// A profile as stored by the platform. SSID and key are quoted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WifiProfile {
    pub ssid: String,
    pub pre_shared_key: Option<String>,
    pub key_management: KeyManagement,
}

/// A profile entry returned by `configured_networks`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfiguredNetwork {
    pub network_id: ProfileId,
    /// Raw SSID, possibly quoted.
    pub ssid: String,
}

/// Association state of the WiFi interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    /// Raw SSID, possibly quoted, or `<unknown ssid>`.
    pub ssid: String,
    /// Profile id of the active association, negative when none.
    pub network_id: i32,
}

/// Specifier matching the onboarding network of an ephemeral request.
#[derive(Clone, PartialEq, Eq)]
pub struct NetworkSpecifier {
    pub ssid: String,
    /// WPA2 passphrase, `None` for an open network.
    pub wpa2_passphrase: Option<String>,
}

impl NetworkSpecifier {
    pub fn is_open(&self) -> bool {
        self.wpa2_passphrase.is_none()
    }
}

impl std::fmt::Debug for NetworkSpecifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkSpecifier")
            .field("ssid", &self.ssid)
            .field("open", &self.is_open())
            .finish()
    }
}

/// Transport a network request is constrained to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Wifi,
}

/// Ephemeral network request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkRequest {
    pub transport: Transport,
    pub specifier: NetworkSpecifier,
}

/// Receiver of asynchronous network request events.
///
/// Invoked by the platform on an arbitrary thread, possibly more than once.
pub trait NetworkCallback: Send + Sync {
    /// A network matching the request became available.
    fn on_available(&self, handle: NetworkHandle);

    /// No matching network could be established.
    fn on_unavailable(&self);
}

/// OS version information.
pub trait PlatformInfo: Send + Sync {
    /// API level of the running OS.
    fn sdk_level(&self) -> u32;
}

/// Saved-profile store and WiFi association control.
pub trait WifiManager: Send + Sync {
    /// List saved profiles.
    fn configured_networks(&self) -> Result<Vec<ConfiguredNetwork>, PlatformError>;

    /// Register a new saved profile.
    fn add_network(&self, profile: &WifiProfile) -> Result<ProfileId, PlatformError>;

    /// Replace the settings of an existing saved profile.
    fn update_network(&self, id: ProfileId, profile: &WifiProfile)
        -> Result<ProfileId, PlatformError>;

    /// Activate a saved profile. Returns the platform's acceptance flag.
    fn enable_network(&self, id: ProfileId, attempt_connect: bool) -> bool;

    /// Drop the current association. Returns the platform's acceptance flag.
    fn disconnect(&self) -> bool;

    /// Request reassociation. Returns the platform's acceptance flag.
    fn reconnect(&self) -> bool;

    /// Current association, if the interface reports one.
    fn connection_info(&self) -> Result<Option<ConnectionInfo>, PlatformError>;

    /// DHCP lease of the active link.
    fn dhcp_info(&self) -> Result<Option<DhcpInfo>, PlatformError>;
}

/// Ephemeral network requests and process-wide binding.
pub trait ConnectivityManager: Send + Sync {
    /// Register an ephemeral network request.
    fn request_network(
        &self,
        request: &NetworkRequest,
        callback: Arc<dyn NetworkCallback>,
    ) -> Result<RequestId, PlatformError>;

    /// Release a registered request and its callback. Unknown ids are ignored.
    fn unregister_network_callback(&self, id: RequestId);

    /// Bind all process traffic to `handle`, or restore the default route
    /// with `None`. Returns the platform's acceptance flag.
    fn bind_process_to_network(&self, handle: Option<NetworkHandle>) -> bool;
}

/// The platform objects shared by the connector components.
#[derive(Clone)]
pub struct Platform {
    pub info: Arc<dyn PlatformInfo>,
    pub wifi: Arc<dyn WifiManager>,
    pub connectivity: Arc<dyn ConnectivityManager>,
}

impl Platform {
    pub fn new(
        info: Arc<dyn PlatformInfo>,
        wifi: Arc<dyn WifiManager>,
        connectivity: Arc<dyn ConnectivityManager>,
    ) -> Self {
        Self {
            info,
            wifi,
            connectivity,
        }
    }

    /// Build a bundle from a single object implementing every platform trait.
    pub fn from_shared<P>(platform: Arc<P>) -> Self
    where
        P: PlatformInfo + WifiManager + ConnectivityManager + 'static,
    {
        Self {
            info: platform.clone(),
            wifi: platform.clone(),
            connectivity: platform,
        }
    }
}
