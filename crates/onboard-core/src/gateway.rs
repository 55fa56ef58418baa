//! Gateway address resolution.
//!
//! The platform reports the DHCP gateway as a `u32` whose least significant
//! byte is the first octet on the wire (`192.168.0.1` is stored as
//! `0x0100A8C0`). Reading the integer in little-endian order yields the
//! octets in the order a human reads them, independent of host endianness.
//!
//! When lease data is missing, zero, or cannot be read, the configured
//! fallback address is returned instead. Resolution never fails.

use std::net::Ipv4Addr;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::model::GatewayAddress;
use crate::platform::WifiManager;

/// Conventional soft-AP address of onboarding hotspots.
pub const DEFAULT_FALLBACK_GATEWAY: Ipv4Addr = Ipv4Addr::new(192, 168, 4, 1);

/// Convert a platform lease integer into an IPv4 address.
pub fn lease_to_ipv4(raw: u32) -> Ipv4Addr {
    Ipv4Addr::from(raw.to_le_bytes())
}

/// Computes the default gateway of the active link.
#[derive(Clone)]
pub struct GatewayResolver {
    wifi: Arc<dyn WifiManager>,
    fallback: Ipv4Addr,
}

impl GatewayResolver {
    pub fn new(wifi: Arc<dyn WifiManager>, fallback: Ipv4Addr) -> Self {
        Self { wifi, fallback }
    }

    /// The address returned when lease data is unavailable.
    pub fn fallback(&self) -> Ipv4Addr {
        self.fallback
    }

    /// Resolve the gateway. Recomputed on every call.
    pub fn resolve_gateway(&self) -> GatewayAddress {
        match self.wifi.dhcp_info() {
            Ok(Some(lease)) if lease.gateway != 0 => {
                let addr = lease_to_ipv4(lease.gateway);
                debug!("Gateway from lease: {}", addr);
                GatewayAddress::resolved(addr)
            }
            Ok(_) => {
                debug!("No lease data, using fallback gateway {}", self.fallback);
                GatewayAddress::fallback(self.fallback)
            }
            Err(e) => {
                warn!("Failed to read lease data ({}), using fallback gateway {}", e, self.fallback);
                GatewayAddress::fallback(self.fallback)
            }
        }
    }
}
