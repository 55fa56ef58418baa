//! In-memory simulated platform.
//!
//! Implements every platform trait over a small model of access points in
//! range, a saved-profile store and the active association. Used by tests
//! and by the bridge binary's demo mode.
//!
//! Network request callbacks are either delivered immediately from inside
//! `request_network` (`CallbackMode::Immediate`) or held until the test
//! delivers them by hand (`CallbackMode::Manual`).

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::model::{DhcpInfo, NetworkHandle, ProfileId, RequestId};
use crate::platform::{
    ConfiguredNetwork, ConnectionInfo, ConnectivityManager, KeyManagement, NetworkCallback,
    NetworkRequest, PlatformError, PlatformInfo, WifiManager, WifiProfile,
};
use crate::ssid;

/// How network request callbacks are delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackMode {
    Immediate,
    Manual,
}

/// An access point in range of the simulated radio.
#[derive(Debug, Clone)]
struct AccessPoint {
    passphrase: Option<String>,
    gateway: Ipv4Addr,
}

#[derive(Debug, Clone)]
struct StoredProfile {
    id: ProfileId,
    raw_ssid: String,
    pre_shared_key: Option<String>,
}

struct PendingRequest {
    request: NetworkRequest,
    callback: Arc<dyn NetworkCallback>,
}

/// Call counters, for asserting which platform operations ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimCounters {
    pub network_requests: usize,
    pub unregistered: usize,
    pub profiles_added: usize,
    pub profiles_updated: usize,
    pub enables: usize,
    pub disconnects: usize,
    pub reconnects: usize,
    pub binds: usize,
}

struct SimState {
    sdk_level: u32,
    callback_mode: CallbackMode,
    access_points: HashMap<String, AccessPoint>,
    profiles: Vec<StoredProfile>,
    next_profile_id: i32,
    enabled_profile: Option<ProfileId>,
    connection: Option<ConnectionInfo>,
    dhcp: Option<DhcpInfo>,
    pending: HashMap<RequestId, PendingRequest>,
    next_request_id: u64,
    next_handle: u64,
    bound: Option<NetworkHandle>,
    store_unavailable: bool,
    reject_profiles: bool,
    refuse_bind: bool,
    enable_override: Option<bool>,
    reconnect_override: Option<bool>,
    counters: SimCounters,
}

/// Simulated platform network stack.
pub struct SimulatedPlatform {
    state: Mutex<SimState>,
}

fn lease_from(addr: Ipv4Addr) -> u32 {
    u32::from_le_bytes(addr.octets())
}

impl SimulatedPlatform {
    /// Create a platform reporting `sdk_level`, with immediate callbacks.
    pub fn new(sdk_level: u32) -> Self {
        Self {
            state: Mutex::new(SimState {
                sdk_level,
                callback_mode: CallbackMode::Immediate,
                access_points: HashMap::new(),
                profiles: Vec::new(),
                next_profile_id: 0,
                enabled_profile: None,
                connection: None,
                dhcp: None,
                pending: HashMap::new(),
                next_request_id: 1,
                next_handle: 100,
                bound: None,
                store_unavailable: false,
                reject_profiles: false,
                refuse_bind: false,
                enable_override: None,
                reconnect_override: None,
                counters: SimCounters::default(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        // A panicking test thread must not wedge the remaining assertions.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_callback_mode(&self, mode: CallbackMode) {
        self.state().callback_mode = mode;
    }

    /// Put an access point in range. `None` passphrase means open.
    pub fn add_access_point(&self, ssid: &str, passphrase: Option<&str>, gateway: Ipv4Addr) {
        self.state().access_points.insert(
            ssid.to_string(),
            AccessPoint {
                passphrase: passphrase.map(String::from),
                gateway,
            },
        );
    }

    /// Seed the saved-profile store with a raw (possibly quoted) SSID.
    pub fn seed_raw_profile(&self, raw_ssid: &str) -> ProfileId {
        let mut state = self.state();
        let id = ProfileId(state.next_profile_id);
        state.next_profile_id += 1;
        state.profiles.push(StoredProfile {
            id,
            raw_ssid: raw_ssid.to_string(),
            pre_shared_key: None,
        });
        id
    }

    /// Report an association with a raw SSID, without lease data changes.
    pub fn set_raw_connection(&self, raw_ssid: &str) {
        self.state().connection = Some(ConnectionInfo {
            ssid: raw_ssid.to_string(),
            network_id: -1,
        });
    }

    pub fn set_dhcp(&self, dhcp: Option<DhcpInfo>) {
        self.state().dhcp = dhcp;
    }

    /// Make every store and association read fail.
    pub fn set_store_unavailable(&self, unavailable: bool) {
        self.state().store_unavailable = unavailable;
    }

    /// Make `add_network`/`update_network` reject every profile.
    pub fn set_reject_profiles(&self, reject: bool) {
        self.state().reject_profiles = reject;
    }

    pub fn set_refuse_bind(&self, refuse: bool) {
        self.state().refuse_bind = refuse;
    }

    /// Force the result of `enable_network`.
    pub fn set_enable_result(&self, result: Option<bool>) {
        self.state().enable_override = result;
    }

    /// Force the result of `reconnect`.
    pub fn set_reconnect_result(&self, result: Option<bool>) {
        self.state().reconnect_override = result;
    }

    pub fn counters(&self) -> SimCounters {
        self.state().counters.clone()
    }

    pub fn bound_network(&self) -> Option<NetworkHandle> {
        self.state().bound
    }

    /// Requests whose callback is still registered.
    pub fn pending_requests(&self) -> Vec<RequestId> {
        let mut ids: Vec<RequestId> = self.state().pending.keys().copied().collect();
        ids.sort_by_key(|id| id.0);
        ids
    }

    /// Pre-shared key stored for a saved SSID, still in platform quoting.
    pub fn stored_key(&self, ssid: &str) -> Option<String> {
        self.state()
            .profiles
            .iter()
            .find(|p| ssid::matches(&p.raw_ssid, ssid))
            .and_then(|p| p.pre_shared_key.clone())
    }

    /// Deliver `on_available` for a pending request. Returns the handle, or
    /// `None` if the request is no longer registered.
    pub fn deliver_available(&self, id: RequestId) -> Option<NetworkHandle> {
        let (callback, handle) = {
            let mut state = self.state();
            let pending = state.pending.get(&id)?;
            let callback = pending.callback.clone();
            let ssid = pending.request.specifier.ssid.clone();
            let handle = NetworkHandle(state.next_handle);
            state.next_handle += 1;
            state.associate(&ssid, -1);
            (callback, handle)
        };
        callback.on_available(handle);
        Some(handle)
    }

    /// Deliver `on_unavailable` for a pending request.
    pub fn deliver_unavailable(&self, id: RequestId) -> bool {
        let callback = match self.state().pending.get(&id) {
            Some(pending) => pending.callback.clone(),
            None => return false,
        };
        callback.on_unavailable();
        true
    }
}

impl SimState {
    fn matching_ap(&self, ssid: &str, passphrase: Option<&str>) -> Option<&AccessPoint> {
        self.access_points
            .get(ssid)
            .filter(|ap| ap.passphrase.as_deref() == passphrase)
    }

    fn associate(&mut self, ssid: &str, network_id: i32) {
        let gateway = self.access_points.get(ssid).map(|ap| ap.gateway);
        self.connection = Some(ConnectionInfo {
            ssid: ssid::quote(ssid),
            network_id,
        });
        self.dhcp = gateway.map(|gw| DhcpInfo {
            gateway: lease_from(gw),
            ip_address: lease_from(Ipv4Addr::new(
                gw.octets()[0],
                gw.octets()[1],
                gw.octets()[2],
                100,
            )),
            netmask: lease_from(Ipv4Addr::new(255, 255, 255, 0)),
        });
    }

    fn check_store(&self) -> Result<(), PlatformError> {
        if self.store_unavailable {
            Err(PlatformError::Unavailable)
        } else {
            Ok(())
        }
    }
}

impl PlatformInfo for SimulatedPlatform {
    fn sdk_level(&self) -> u32 {
        self.state().sdk_level
    }
}

impl WifiManager for SimulatedPlatform {
    fn configured_networks(&self) -> Result<Vec<ConfiguredNetwork>, PlatformError> {
        let state = self.state();
        state.check_store()?;
        Ok(state
            .profiles
            .iter()
            .map(|p| ConfiguredNetwork {
                network_id: p.id,
                ssid: p.raw_ssid.clone(),
            })
            .collect())
    }

    fn add_network(&self, profile: &WifiProfile) -> Result<ProfileId, PlatformError> {
        let mut state = self.state();
        state.check_store()?;
        if state.reject_profiles {
            return Err(PlatformError::Rejected("profile refused".to_string()));
        }
        if profile.key_management == KeyManagement::WpaPsk && profile.pre_shared_key.is_none() {
            return Err(PlatformError::Rejected("missing pre-shared key".to_string()));
        }

        let id = ProfileId(state.next_profile_id);
        state.next_profile_id += 1;
        state.profiles.push(StoredProfile {
            id,
            raw_ssid: profile.ssid.clone(),
            pre_shared_key: profile.pre_shared_key.clone(),
        });
        state.counters.profiles_added += 1;
        Ok(id)
    }

    fn update_network(
        &self,
        id: ProfileId,
        profile: &WifiProfile,
    ) -> Result<ProfileId, PlatformError> {
        let mut state = self.state();
        state.check_store()?;
        if state.reject_profiles {
            return Err(PlatformError::Rejected("profile refused".to_string()));
        }

        let stored = state
            .profiles
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| PlatformError::Rejected(format!("unknown profile {}", id.0)))?;
        stored.raw_ssid = profile.ssid.clone();
        stored.pre_shared_key = profile.pre_shared_key.clone();
        state.counters.profiles_updated += 1;
        Ok(id)
    }

    fn enable_network(&self, id: ProfileId, _attempt_connect: bool) -> bool {
        let mut state = self.state();
        state.counters.enables += 1;
        if let Some(result) = state.enable_override {
            return result;
        }
        if state.profiles.iter().any(|p| p.id == id) {
            state.enabled_profile = Some(id);
            true
        } else {
            false
        }
    }

    fn disconnect(&self) -> bool {
        let mut state = self.state();
        state.counters.disconnects += 1;
        state.connection = None;
        state.dhcp = None;
        true
    }

    fn reconnect(&self) -> bool {
        let mut state = self.state();
        state.counters.reconnects += 1;
        if let Some(result) = state.reconnect_override {
            return result;
        }

        let Some(id) = state.enabled_profile else {
            return false;
        };
        let Some(profile) = state.profiles.iter().find(|p| p.id == id).cloned() else {
            return false;
        };

        let ssid = ssid::normalize(&profile.raw_ssid);
        let key = profile.pre_shared_key.as_deref().map(ssid::unquote);
        if state.matching_ap(&ssid, key).is_some() {
            state.associate(&ssid, id.0);
            true
        } else {
            false
        }
    }

    fn connection_info(&self) -> Result<Option<ConnectionInfo>, PlatformError> {
        let state = self.state();
        state.check_store()?;
        Ok(state.connection.clone())
    }

    fn dhcp_info(&self) -> Result<Option<DhcpInfo>, PlatformError> {
        let state = self.state();
        state.check_store()?;
        Ok(state.dhcp)
    }
}

impl ConnectivityManager for SimulatedPlatform {
    fn request_network(
        &self,
        request: &NetworkRequest,
        callback: Arc<dyn NetworkCallback>,
    ) -> Result<RequestId, PlatformError> {
        let (id, mode, reachable) = {
            let mut state = self.state();
            let id = RequestId(state.next_request_id);
            state.next_request_id += 1;
            state.counters.network_requests += 1;
            let reachable = state
                .matching_ap(
                    &request.specifier.ssid,
                    request.specifier.wpa2_passphrase.as_deref(),
                )
                .is_some();
            state.pending.insert(
                id,
                PendingRequest {
                    request: request.clone(),
                    callback,
                },
            );
            (id, state.callback_mode, reachable)
        };

        if mode == CallbackMode::Immediate {
            if reachable {
                self.deliver_available(id);
            } else {
                self.deliver_unavailable(id);
            }
        }
        Ok(id)
    }

    fn unregister_network_callback(&self, id: RequestId) {
        let mut state = self.state();
        if state.pending.remove(&id).is_some() {
            state.counters.unregistered += 1;
        }
    }

    fn bind_process_to_network(&self, handle: Option<NetworkHandle>) -> bool {
        let mut state = self.state();
        state.counters.binds += 1;
        if state.refuse_bind && handle.is_some() {
            return false;
        }
        state.bound = handle;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{NetworkSpecifier, Transport};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingCallback {
        available: AtomicUsize,
        unavailable: AtomicUsize,
    }

    impl NetworkCallback for CountingCallback {
        fn on_available(&self, _handle: NetworkHandle) {
            self.available.fetch_add(1, Ordering::SeqCst);
        }

        fn on_unavailable(&self) {
            self.unavailable.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn request(ssid: &str, pass: Option<&str>) -> NetworkRequest {
        NetworkRequest {
            transport: Transport::Wifi,
            specifier: NetworkSpecifier {
                ssid: ssid.to_string(),
                wpa2_passphrase: pass.map(String::from),
            },
        }
    }

    #[test]
    fn test_immediate_delivery() {
        let sim = SimulatedPlatform::new(30);
        sim.add_access_point("DeviceAP", None, Ipv4Addr::new(192, 168, 4, 1));

        let cb = Arc::new(CountingCallback::default());
        sim.request_network(&request("DeviceAP", None), cb.clone())
            .unwrap();
        assert_eq!(cb.available.load(Ordering::SeqCst), 1);

        sim.request_network(&request("DeviceAP", Some("wrongpass")), cb.clone())
            .unwrap();
        assert_eq!(cb.unavailable.load(Ordering::SeqCst), 1);

        let conn = sim.connection_info().unwrap().unwrap();
        assert_eq!(conn.ssid, "\"DeviceAP\"");
        assert_eq!(
            sim.dhcp_info().unwrap().unwrap().gateway,
            0x0104A8C0
        );
    }

    #[test]
    fn test_manual_delivery_after_unregister() {
        let sim = SimulatedPlatform::new(30);
        sim.set_callback_mode(CallbackMode::Manual);

        let cb = Arc::new(CountingCallback::default());
        let id = sim.request_network(&request("DeviceAP", None), cb.clone())
            .unwrap();
        assert_eq!(sim.pending_requests(), vec![id]);

        sim.unregister_network_callback(id);
        assert!(sim.deliver_available(id).is_none());
        assert_eq!(cb.available.load(Ordering::SeqCst), 0);
        assert_eq!(sim.counters().unregistered, 1);
    }

    #[test]
    fn test_profile_activation() {
        let sim = SimulatedPlatform::new(23);
        sim.add_access_point("DeviceAP", Some("password123"), Ipv4Addr::new(192, 168, 4, 1));

        let id = sim
            .add_network(&WifiProfile {
                ssid: ssid::quote("DeviceAP"),
                pre_shared_key: Some(ssid::quote("password123")),
                key_management: KeyManagement::WpaPsk,
            })
            .unwrap();

        assert!(sim.disconnect());
        assert!(sim.enable_network(id, true));
        assert!(sim.reconnect());
        assert_eq!(
            sim.connection_info().unwrap().unwrap().ssid,
            "\"DeviceAP\""
        );
    }
}
