//! Saved network registry.
//!
//! Read-only view over the platform's saved-profile store. The store is
//! owned by the OS and may change between calls, so nothing is cached: every
//! query reads the platform afresh. All comparisons use normalized
//! (unquoted) SSIDs.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::model::SavedNetworkProfile;
use crate::platform::{ConfiguredNetwork, WifiManager};
use crate::ssid::{self, UNKNOWN_SSID};

/// Membership and lookup queries over saved network profiles.
#[derive(Clone)]
pub struct SavedNetworkRegistry {
    wifi: Arc<dyn WifiManager>,
}

impl SavedNetworkRegistry {
    pub fn new(wifi: Arc<dyn WifiManager>) -> Self {
        Self { wifi }
    }

    /// Check if a profile for `ssid` is saved.
    pub fn is_saved(&self, ssid: &str) -> bool {
        self.matching_profile(ssid).is_some()
    }

    /// Find the saved profile for `ssid`.
    ///
    /// When the store holds several entries for the same SSID, the first
    /// one reported by the platform wins.
    pub fn matching_profile(&self, ssid: &str) -> Option<SavedNetworkProfile> {
        let wanted = ssid::unquote(ssid);
        if wanted.is_empty() {
            return None;
        }

        self.configured()
            .into_iter()
            .map(|net| SavedNetworkProfile {
                platform_id: net.network_id,
                ssid: ssid::normalize(&net.ssid),
            })
            .find(|profile| profile.ssid == wanted)
    }

    /// List saved SSIDs in platform order.
    ///
    /// Entries with an empty normalized SSID are skipped, and each SSID is
    /// listed once.
    pub fn list_ssids(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.configured()
            .iter()
            .map(|net| ssid::normalize(&net.ssid))
            .filter(|s| !s.is_empty())
            .filter(|s| seen.insert(s.clone()))
            .collect()
    }

    /// SSID of the current association.
    ///
    /// Returns `None` when the platform reports no association, which is
    /// distinct from an associated network with an empty SSID.
    pub fn current_ssid(&self) -> Option<String> {
        match self.wifi.connection_info() {
            Ok(Some(info)) if info.ssid != UNKNOWN_SSID => Some(ssid::normalize(&info.ssid)),
            Ok(_) => None,
            Err(e) => {
                warn!("Failed to read connection info: {}", e);
                None
            }
        }
    }

    fn configured(&self) -> Vec<ConfiguredNetwork> {
        match self.wifi.configured_networks() {
            Ok(networks) => {
                debug!("Platform reports {} saved networks", networks.len());
                networks
            }
            Err(e) => {
                warn!("Failed to read saved networks: {}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProfileId;
    use crate::sim::SimulatedPlatform;
    use pretty_assertions::assert_eq;

    fn registry_with(entries: &[&str]) -> (Arc<SimulatedPlatform>, SavedNetworkRegistry) {
        let sim = Arc::new(SimulatedPlatform::new(29));
        for raw in entries {
            sim.seed_raw_profile(raw);
        }
        let registry = SavedNetworkRegistry::new(sim.clone());
        (sim, registry)
    }

    #[test]
    fn test_list_normalizes_and_skips_empty() {
        let (_, registry) = registry_with(&["\"HomeNet\"", "Bare", "\"\"", "\"DeviceAP\""]);

        assert_eq!(
            registry.list_ssids(),
            vec!["HomeNet".to_string(), "Bare".to_string(), "DeviceAP".to_string()]
        );
    }

    #[test]
    fn test_list_deduplicates() {
        let (_, registry) = registry_with(&["\"HomeNet\"", "HomeNet", "\"Other\""]);

        assert_eq!(
            registry.list_ssids(),
            vec!["HomeNet".to_string(), "Other".to_string()]
        );
    }

    #[test]
    fn test_matching_profile_uses_unquoted_ssid() {
        let (_, registry) = registry_with(&["\"HomeNet\"", "\"DeviceAP\""]);

        let profile = registry.matching_profile("DeviceAP").unwrap();
        assert_eq!(profile.ssid, "DeviceAP");
        assert_eq!(profile.platform_id, ProfileId(1));

        assert!(registry.is_saved("HomeNet"));
        assert!(!registry.is_saved("Missing"));
        assert!(!registry.is_saved(""));
    }

    #[test]
    fn test_current_ssid_strips_quotes() {
        let (sim, registry) = registry_with(&[]);

        assert_eq!(registry.current_ssid(), None);

        sim.set_raw_connection("\"DeviceAP\"");
        assert_eq!(registry.current_ssid(), Some("DeviceAP".to_string()));

        sim.set_raw_connection(UNKNOWN_SSID);
        assert_eq!(registry.current_ssid(), None);

        sim.set_raw_connection("\"\"");
        assert_eq!(registry.current_ssid(), Some(String::new()));
    }

    #[test]
    fn test_platform_failure_degrades_to_empty() {
        let (sim, registry) = registry_with(&["\"HomeNet\""]);
        sim.set_store_unavailable(true);

        assert!(registry.list_ssids().is_empty());
        assert!(!registry.is_saved("HomeNet"));
        assert_eq!(registry.current_ssid(), None);
    }
}
