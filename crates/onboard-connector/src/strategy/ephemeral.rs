//! Ephemeral network request strategy.
//!
//! Issues a WiFi-only network request matching the SSID (and WPA2
//! passphrase, if any) and waits for the platform to report availability.
//!
//! The platform callback is bridged to a oneshot channel, so only the first
//! event is ever observed. The registration is held by a guard that
//! unregisters the callback when the attempt settles, times out, or the
//! future is dropped (cancellation).

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use onboard_core::platform::{
    ConnectivityManager, NetworkCallback, NetworkRequest, NetworkSpecifier, Transport,
};
use onboard_core::{
    ConnectionOutcome, ErrorKind, NetworkCredential, NetworkHandle, RequestId, StrategyKind,
};

use super::ConnectionStrategy;

/// First event reported for a network request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestEvent {
    Available(NetworkHandle),
    Unavailable,
}

/// Platform callback forwarding the first event into a oneshot channel.
struct OneShotCallback {
    tx: Mutex<Option<oneshot::Sender<RequestEvent>>>,
}

impl OneShotCallback {
    fn new(tx: oneshot::Sender<RequestEvent>) -> Self {
        Self {
            tx: Mutex::new(Some(tx)),
        }
    }

    fn deliver(&self, event: RequestEvent) {
        let tx = self.tx.lock().unwrap_or_else(|e| e.into_inner()).take();
        match tx {
            // The receiver may already be gone (timeout or cancellation).
            Some(tx) => {
                let _ = tx.send(event);
            }
            None => debug!("Ignoring repeated network event {:?}", event),
        }
    }
}

impl NetworkCallback for OneShotCallback {
    fn on_available(&self, handle: NetworkHandle) {
        self.deliver(RequestEvent::Available(handle));
    }

    fn on_unavailable(&self) {
        self.deliver(RequestEvent::Unavailable);
    }
}

/// Keeps a network request registered until dropped.
struct Registration {
    connectivity: Arc<dyn ConnectivityManager>,
    id: RequestId,
}

impl Drop for Registration {
    fn drop(&mut self) {
        debug!("Releasing network request {:?}", self.id);
        self.connectivity.unregister_network_callback(self.id);
    }
}

/// Connects through a transient platform network request.
pub struct EphemeralRequestStrategy {
    connectivity: Arc<dyn ConnectivityManager>,
    timeout: Duration,
}

impl EphemeralRequestStrategy {
    pub fn new(connectivity: Arc<dyn ConnectivityManager>, timeout: Duration) -> Self {
        Self {
            connectivity,
            timeout,
        }
    }

    /// Build the WiFi request for a credential.
    ///
    /// An empty password yields an open-network specifier.
    pub fn build_request(credential: &NetworkCredential) -> NetworkRequest {
        NetworkRequest {
            transport: Transport::Wifi,
            specifier: NetworkSpecifier {
                ssid: credential.ssid.clone(),
                wpa2_passphrase: credential.passphrase().map(String::from),
            },
        }
    }

    async fn run(&self, credential: &NetworkCredential) -> ConnectionOutcome {
        let request = Self::build_request(credential);
        let (tx, rx) = oneshot::channel();
        let callback = Arc::new(OneShotCallback::new(tx));

        debug!(
            "Requesting ephemeral network '{}' (open: {})",
            credential.ssid,
            request.specifier.is_open()
        );
        let id = match self.connectivity.request_network(&request, callback) {
            Ok(id) => id,
            Err(e) => {
                warn!("Network request for '{}' failed: {}", credential.ssid, e);
                return ConnectionOutcome::failure(ErrorKind::NetworkUnavailable);
            }
        };
        let registration = Registration {
            connectivity: self.connectivity.clone(),
            id,
        };

        let outcome = match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(RequestEvent::Available(handle))) => {
                info!("Network '{}' available as {}", credential.ssid, handle);
                ConnectionOutcome::success(Some(handle))
            }
            Ok(Ok(RequestEvent::Unavailable)) => {
                info!("Network '{}' unavailable", credential.ssid);
                ConnectionOutcome::failure(ErrorKind::NetworkUnavailable)
            }
            Ok(Err(_)) => {
                warn!("Platform dropped the callback for '{}'", credential.ssid);
                ConnectionOutcome::failure(ErrorKind::NetworkUnavailable)
            }
            Err(_) => {
                warn!(
                    "No answer for '{}' within {:?}, giving up",
                    credential.ssid, self.timeout
                );
                ConnectionOutcome::failure(ErrorKind::Timeout)
            }
        };

        drop(registration);
        outcome
    }
}

impl ConnectionStrategy for EphemeralRequestStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Ephemeral
    }

    fn requires_binding(&self) -> bool {
        true
    }

    fn connect<'a>(&'a self, credential: &'a NetworkCredential) -> BoxFuture<'a, ConnectionOutcome> {
        async move { self.run(credential).await.with_strategy(StrategyKind::Ephemeral) }.boxed()
    }
}
