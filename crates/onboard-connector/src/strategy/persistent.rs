//! Persistent profile strategy.
//!
//! Writes a profile into the platform's saved-network store, then drops the
//! current association, activates the profile and asks for reassociation.
//! The network becomes the platform default route, so no process binding is
//! needed.
//!
//! A profile is never removed on failure. If activation fails after the
//! profile was registered, it stays in the store, matching how the platform
//! treats user-saved networks; a later `connect` for the same SSID updates
//! that entry instead of adding another.

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::{debug, info, warn};

use onboard_core::platform::{KeyManagement, WifiManager, WifiProfile};
use onboard_core::ssid;
use onboard_core::{
    ConnectionOutcome, ErrorKind, NetworkCredential, ProfileId, SavedNetworkRegistry, StrategyKind,
};

use super::ConnectionStrategy;

/// Drop the current association, activate `id` and request reassociation.
///
/// Succeeds only if the platform accepted both the activation and the
/// reconnection request.
pub(crate) fn activate_profile(wifi: &dyn WifiManager, id: ProfileId) -> bool {
    if !wifi.disconnect() {
        debug!("Platform refused to drop the current association");
    }
    let enabled = wifi.enable_network(id, true);
    let reconnected = wifi.reconnect();
    debug!(
        "Profile {:?}: enable accepted={}, reconnect accepted={}",
        id, enabled, reconnected
    );
    enabled && reconnected
}

/// Connects by writing and activating a saved profile.
pub struct PersistentProfileStrategy {
    wifi: Arc<dyn WifiManager>,
    registry: SavedNetworkRegistry,
}

impl PersistentProfileStrategy {
    pub fn new(wifi: Arc<dyn WifiManager>) -> Self {
        let registry = SavedNetworkRegistry::new(wifi.clone());
        Self { wifi, registry }
    }

    /// Build the platform profile for a credential.
    pub fn build_profile(credential: &NetworkCredential) -> WifiProfile {
        match credential.passphrase() {
            Some(pass) => WifiProfile {
                ssid: ssid::quote(&credential.ssid),
                pre_shared_key: Some(ssid::quote(pass)),
                key_management: KeyManagement::WpaPsk,
            },
            None => WifiProfile {
                ssid: ssid::quote(&credential.ssid),
                pre_shared_key: None,
                key_management: KeyManagement::None,
            },
        }
    }

    fn run(&self, credential: &NetworkCredential) -> ConnectionOutcome {
        let profile = Self::build_profile(credential);

        let registered = match self.registry.matching_profile(&credential.ssid) {
            Some(existing) => {
                debug!(
                    "Updating saved profile {:?} for '{}'",
                    existing.platform_id, credential.ssid
                );
                self.wifi.update_network(existing.platform_id, &profile)
            }
            None => {
                debug!("Adding saved profile for '{}'", credential.ssid);
                self.wifi.add_network(&profile)
            }
        };

        let id = match registered {
            Ok(id) => id,
            Err(e) => {
                warn!("Profile for '{}' rejected: {}", credential.ssid, e);
                return ConnectionOutcome::failure(ErrorKind::ConfigurationRejected);
            }
        };

        if activate_profile(self.wifi.as_ref(), id) {
            info!("Activated saved profile for '{}'", credential.ssid);
            ConnectionOutcome::success(None)
        } else {
            info!("Activation of '{}' was not accepted", credential.ssid);
            ConnectionOutcome::failure(ErrorKind::NetworkUnavailable)
        }
    }
}

impl ConnectionStrategy for PersistentProfileStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::PersistentProfile
    }

    fn requires_binding(&self) -> bool {
        false
    }

    fn connect<'a>(&'a self, credential: &'a NetworkCredential) -> BoxFuture<'a, ConnectionOutcome> {
        let outcome = self.run(credential).with_strategy(StrategyKind::PersistentProfile);
        futures::future::ready(outcome).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onboard_core::sim::SimulatedPlatform;
    use std::net::Ipv4Addr;

    const GATEWAY: Ipv4Addr = Ipv4Addr::new(192, 168, 4, 1);

    #[test]
    fn test_build_profile() {
        let open = PersistentProfileStrategy::build_profile(&NetworkCredential::new("DeviceAP", ""));
        assert_eq!(open.ssid, "\"DeviceAP\"");
        assert_eq!(open.key_management, KeyManagement::None);
        assert_eq!(open.pre_shared_key, None);

        let secured =
            PersistentProfileStrategy::build_profile(&NetworkCredential::new("DeviceAP", "password123"));
        assert_eq!(secured.key_management, KeyManagement::WpaPsk);
        assert_eq!(secured.pre_shared_key.as_deref(), Some("\"password123\""));
    }

    #[tokio::test]
    async fn test_connect_saves_and_activates() {
        let sim = Arc::new(SimulatedPlatform::new(23));
        sim.add_access_point("DeviceAP", Some("password123"), GATEWAY);
        let strategy = PersistentProfileStrategy::new(sim.clone());

        let outcome = strategy
            .connect(&NetworkCredential::new("DeviceAP", "password123"))
            .await;

        assert!(outcome.succeeded());
        assert_eq!(outcome.bound_handle(), None);
        assert_eq!(outcome.strategy(), Some(StrategyKind::PersistentProfile));
        assert_eq!(sim.stored_key("DeviceAP").as_deref(), Some("\"password123\""));

        let counters = sim.counters();
        assert_eq!(counters.profiles_added, 1);
        assert_eq!(counters.disconnects, 1);
        assert_eq!(counters.enables, 1);
        assert_eq!(counters.reconnects, 1);
    }

    #[tokio::test]
    async fn test_repeated_connect_updates_profile() {
        let sim = Arc::new(SimulatedPlatform::new(23));
        sim.add_access_point("DeviceAP", None, GATEWAY);
        let strategy = PersistentProfileStrategy::new(sim.clone());

        strategy.connect(&NetworkCredential::open("DeviceAP")).await;
        strategy.connect(&NetworkCredential::open("DeviceAP")).await;

        let counters = sim.counters();
        assert_eq!(counters.profiles_added, 1);
        assert_eq!(counters.profiles_updated, 1);
    }

    #[tokio::test]
    async fn test_rejected_profile() {
        let sim = Arc::new(SimulatedPlatform::new(23));
        sim.set_reject_profiles(true);
        let strategy = PersistentProfileStrategy::new(sim.clone());

        let outcome = strategy.connect(&NetworkCredential::open("DeviceAP")).await;

        assert_eq!(outcome.failure_reason(), Some(ErrorKind::ConfigurationRejected));
        assert_eq!(sim.counters().disconnects, 0);
    }

    #[tokio::test]
    async fn test_activation_failure_keeps_profile() {
        let sim = Arc::new(SimulatedPlatform::new(23));
        let strategy = PersistentProfileStrategy::new(sim.clone());

        let outcome = strategy.connect(&NetworkCredential::open("OutOfRange")).await;

        assert_eq!(outcome.failure_reason(), Some(ErrorKind::NetworkUnavailable));
        let registry = SavedNetworkRegistry::new(sim.clone());
        assert!(registry.is_saved("OutOfRange"));
    }
}
