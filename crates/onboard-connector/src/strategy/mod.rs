//! Connection strategies.
//!
//! A strategy performs the actual connection attempt on one platform
//! generation. The capability detector picks which one runs; strategies
//! themselves never check the OS version.
//!
//! - [`EphemeralRequestStrategy`]: transient network request, no saved profile
//! - [`PersistentProfileStrategy`]: saved profile, then select and activate it
//!
//! A new platform generation is supported by adding a `StrategyKind` variant
//! and a strategy implementing [`ConnectionStrategy`].

mod ephemeral;
mod persistent;

pub use ephemeral::EphemeralRequestStrategy;
pub use persistent::PersistentProfileStrategy;

pub(crate) use persistent::activate_profile;

use futures::future::BoxFuture;
use onboard_core::{ConnectionOutcome, NetworkCredential, StrategyKind};

/// A way of connecting to an onboarding network.
///
/// Implementations convert every platform fault into a failure outcome;
/// `connect` never panics on platform errors and resolves exactly once.
pub trait ConnectionStrategy: Send + Sync {
    /// The variant this strategy implements.
    fn kind(&self) -> StrategyKind;

    /// Whether a successful outcome must be bound process-wide before
    /// traffic can reach the new network.
    fn requires_binding(&self) -> bool;

    /// Attempt a connection. The credential has already been validated.
    fn connect<'a>(&'a self, credential: &'a NetworkCredential) -> BoxFuture<'a, ConnectionOutcome>;
}
