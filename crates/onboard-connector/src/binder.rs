//! Process-wide network binding.
//!
//! Ephemeral networks are not the platform's default route, so after an
//! ephemeral connection succeeds the process must bind its traffic to the
//! new network for device calls to reach it.
//!
//! **Binding is global.** Every outbound connection the process opens after
//! `bind` goes over the bound network, not only the caller's, until
//! `release` restores the default route or another network is bound.

use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::{debug, info, warn};

use onboard_core::platform::ConnectivityManager;
use onboard_core::NetworkHandle;

/// Errors that can occur while changing the process binding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// The platform refused to bind the process to the network.
    #[error("platform refused to bind process to {0}")]
    Refused(NetworkHandle),

    /// The platform refused to restore the default route.
    #[error("platform refused to restore the default route")]
    RestoreRefused,
}

/// Binds process traffic to a network handle.
pub struct NetworkBinder {
    connectivity: Arc<dyn ConnectivityManager>,
    bound: Mutex<Option<NetworkHandle>>,
}

impl NetworkBinder {
    pub fn new(connectivity: Arc<dyn ConnectivityManager>) -> Self {
        Self {
            connectivity,
            bound: Mutex::new(None),
        }
    }

    /// Route all subsequent process traffic over `handle`.
    pub fn bind(&self, handle: NetworkHandle) -> Result<(), BindError> {
        let mut bound = self.bound.lock().unwrap_or_else(|e| e.into_inner());
        if !self.connectivity.bind_process_to_network(Some(handle)) {
            warn!("Platform refused to bind process to {}", handle);
            return Err(BindError::Refused(handle));
        }
        if let Some(previous) = bound.replace(handle) {
            debug!("Rebinding process from {} to {}", previous, handle);
        }
        info!("Process traffic bound to {}", handle);
        Ok(())
    }

    /// Restore the default route. No-op when nothing is bound.
    pub fn release(&self) -> Result<(), BindError> {
        let mut bound = self.bound.lock().unwrap_or_else(|e| e.into_inner());
        let Some(handle) = *bound else {
            return Ok(());
        };
        if !self.connectivity.bind_process_to_network(None) {
            warn!("Platform refused to unbind process from {}", handle);
            return Err(BindError::RestoreRefused);
        }
        *bound = None;
        info!("Process traffic restored to the default route");
        Ok(())
    }

    /// The network the process is currently bound to.
    pub fn bound(&self) -> Option<NetworkHandle> {
        *self.bound.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onboard_core::sim::SimulatedPlatform;

    #[test]
    fn test_bind_and_release() {
        let sim = Arc::new(SimulatedPlatform::new(30));
        let binder = NetworkBinder::new(sim.clone());

        binder.bind(NetworkHandle(5)).unwrap();
        assert_eq!(binder.bound(), Some(NetworkHandle(5)));
        assert_eq!(sim.bound_network(), Some(NetworkHandle(5)));

        binder.release().unwrap();
        assert_eq!(binder.bound(), None);
        assert_eq!(sim.bound_network(), None);
    }

    #[test]
    fn test_release_without_binding_is_noop() {
        let sim = Arc::new(SimulatedPlatform::new(30));
        let binder = NetworkBinder::new(sim.clone());

        binder.release().unwrap();
        assert_eq!(sim.counters().binds, 0);
    }

    #[test]
    fn test_refused_bind() {
        let sim = Arc::new(SimulatedPlatform::new(30));
        sim.set_refuse_bind(true);
        let binder = NetworkBinder::new(sim.clone());

        assert_eq!(
            binder.bind(NetworkHandle(9)),
            Err(BindError::Refused(NetworkHandle(9)))
        );
        assert_eq!(binder.bound(), None);
    }
}
