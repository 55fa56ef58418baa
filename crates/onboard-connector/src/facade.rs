//! Provisioning facade.
//!
//! Single entry point for the surrounding application layer:
//! - `connect` / `connect_saved` run connection attempts, one at a time
//! - `get_gateway_ip`, `is_wifi_saved`, `get_current_wifi_ssid` and
//!   `get_saved_wifi_list` are read-only queries that never fail
//!
//! Connection attempts are single-flight. Depending on `BusyPolicy`, an
//! overlapping call either fails with `Busy` or waits for the first one to
//! settle. When an ephemeral connection succeeds, process binding is applied
//! before `connect` returns.
//!
//! Dropping a `connect` future cancels the attempt: the platform callback is
//! released and no outcome is produced.

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use onboard_core::{
    BusyPolicy, CapabilityDetector, ConnectionOutcome, ConnectionRequest, ConnectorConfig,
    ErrorKind, GatewayAddress, GatewayResolver, NetworkCredential, NetworkHandle, Platform,
    SavedNetworkRegistry, StrategyKind,
};
use onboard_core::platform::WifiManager;

use crate::binder::{BindError, NetworkBinder};
use crate::strategy::{
    activate_profile, ConnectionStrategy, EphemeralRequestStrategy, PersistentProfileStrategy,
};

/// Orchestrates strategy selection, connection, binding and queries.
pub struct ProvisioningFacade {
    config: ConnectorConfig,
    detector: CapabilityDetector,
    strategies: Vec<Arc<dyn ConnectionStrategy>>,
    binder: NetworkBinder,
    registry: SavedNetworkRegistry,
    gateway: GatewayResolver,
    wifi: Arc<dyn WifiManager>,
    /// Held for the whole of a `connect` / `connect_saved` call.
    in_flight: Mutex<()>,
}

impl ProvisioningFacade {
    /// Create a facade with the built-in strategies.
    pub fn new(platform: Platform, config: ConnectorConfig) -> Self {
        let strategies: Vec<Arc<dyn ConnectionStrategy>> = vec![
            Arc::new(EphemeralRequestStrategy::new(
                platform.connectivity.clone(),
                config.request_timeout(),
            )),
            Arc::new(PersistentProfileStrategy::new(platform.wifi.clone())),
        ];
        Self::with_strategies(platform, config, strategies)
    }

    /// Create a facade with a custom set of strategies.
    pub fn with_strategies(
        platform: Platform,
        config: ConnectorConfig,
        strategies: Vec<Arc<dyn ConnectionStrategy>>,
    ) -> Self {
        Self {
            detector: CapabilityDetector::new(platform.info.clone(), config.ephemeral_min_sdk),
            binder: NetworkBinder::new(platform.connectivity.clone()),
            registry: SavedNetworkRegistry::new(platform.wifi.clone()),
            gateway: GatewayResolver::new(platform.wifi.clone(), config.fallback_gateway),
            wifi: platform.wifi,
            strategies,
            config,
            in_flight: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    /// Connect to a network, letting the platform capability pick the strategy.
    pub async fn connect(&self, credential: NetworkCredential) -> ConnectionOutcome {
        self.connect_request(ConnectionRequest::new(credential)).await
    }

    /// Connect with an explicit strategy hint.
    pub async fn connect_request(&self, request: ConnectionRequest) -> ConnectionOutcome {
        if let Err(kind) = request.credential.validate() {
            warn!("Rejecting connect for {:?}: {}", request.credential, kind);
            return ConnectionOutcome::failure(kind);
        }

        let Some(_guard) = self.acquire().await else {
            return ConnectionOutcome::failure(ErrorKind::Busy);
        };

        let kind = match self.detector.resolve(request.strategy_hint) {
            Ok(kind) => kind,
            Err(kind) => {
                warn!("No strategy for hint {:?}: {}", request.strategy_hint, kind);
                return ConnectionOutcome::failure(kind);
            }
        };
        let Some(strategy) = self.strategy(kind) else {
            warn!("Strategy {} is not registered", kind);
            return ConnectionOutcome::failure(ErrorKind::PlatformUnsupported);
        };

        info!("Connecting to '{}' using {} strategy", request.credential.ssid, kind);
        let outcome = strategy.connect(&request.credential).await;
        if !outcome.succeeded() {
            return outcome;
        }

        if !strategy.requires_binding() {
            self.release_stale_binding();
        } else if self.config.bind_process {
            if let Some(handle) = outcome.bound_handle() {
                if let Err(e) = self.binder.bind(handle) {
                    error!("Connected to '{}' but {}", request.credential.ssid, e);
                    return ConnectionOutcome::failure(ErrorKind::NetworkUnavailable)
                        .with_strategy(kind);
                }
            }
        }

        outcome
    }

    /// Reconnect to a previously saved network.
    pub async fn connect_saved(&self, ssid: &str) -> ConnectionOutcome {
        let Some(_guard) = self.acquire().await else {
            return ConnectionOutcome::failure(ErrorKind::Busy);
        };

        let Some(profile) = self.registry.matching_profile(ssid) else {
            info!("No saved profile for '{}'", ssid);
            return ConnectionOutcome::failure(ErrorKind::NotFound);
        };

        info!("Activating saved profile {:?} for '{}'", profile.platform_id, profile.ssid);
        if activate_profile(self.wifi.as_ref(), profile.platform_id) {
            self.release_stale_binding();
            ConnectionOutcome::success(None)
        } else {
            ConnectionOutcome::failure(ErrorKind::NetworkUnavailable)
        }
    }

    /// Run `connect` on a background task that can be cancelled.
    pub fn spawn_connect(self: &Arc<Self>, credential: NetworkCredential) -> PendingConnect {
        let facade = Arc::clone(self);
        PendingConnect {
            handle: tokio::spawn(async move { facade.connect(credential).await }),
        }
    }

    /// Gateway of the active network, as a dotted quad.
    pub fn get_gateway_ip(&self) -> String {
        self.gateway.resolve_gateway().to_string()
    }

    /// Gateway of the active network, including whether the fallback was used.
    pub fn get_gateway(&self) -> GatewayAddress {
        self.gateway.resolve_gateway()
    }

    pub fn is_wifi_saved(&self, ssid: &str) -> bool {
        self.registry.is_saved(ssid)
    }

    pub fn get_current_wifi_ssid(&self) -> Option<String> {
        self.registry.current_ssid()
    }

    pub fn get_saved_wifi_list(&self) -> Vec<String> {
        self.registry.list_ssids()
    }

    /// Restore the process default route after an ephemeral connection.
    pub fn release_binding(&self) -> Result<(), BindError> {
        self.binder.release()
    }

    /// The network process traffic is currently bound to.
    pub fn bound_network(&self) -> Option<NetworkHandle> {
        self.binder.bound()
    }

    fn strategy(&self, kind: StrategyKind) -> Option<Arc<dyn ConnectionStrategy>> {
        self.strategies.iter().find(|s| s.kind() == kind).cloned()
    }

    async fn acquire(&self) -> Option<MutexGuard<'_, ()>> {
        match self.config.busy_policy {
            BusyPolicy::Reject => match self.in_flight.try_lock() {
                Ok(guard) => Some(guard),
                Err(_) => {
                    warn!("Connection attempt already in progress");
                    None
                }
            },
            BusyPolicy::Wait => {
                debug!("Waiting for any in-flight connection attempt");
                Some(self.in_flight.lock().await)
            }
        }
    }

    /// A network reached through the platform default route does not need
    /// the earlier ephemeral binding, which would otherwise keep capturing
    /// process traffic.
    fn release_stale_binding(&self) {
        if let Err(e) = self.binder.release() {
            warn!("Could not release previous binding: {}", e);
        }
    }
}

/// A `connect` running on a background task.
pub struct PendingConnect {
    handle: JoinHandle<ConnectionOutcome>,
}

impl PendingConnect {
    /// Cancel the attempt. The platform callback is released and the attempt
    /// produces no outcome.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the outcome. Returns `None` if the attempt was cancelled.
    pub async fn outcome(self) -> Option<ConnectionOutcome> {
        match self.handle.await {
            Ok(outcome) => Some(outcome),
            Err(e) if e.is_cancelled() => {
                debug!("Connection attempt cancelled");
                None
            }
            Err(e) => {
                error!("Connection task failed: {}", e);
                None
            }
        }
    }
}
