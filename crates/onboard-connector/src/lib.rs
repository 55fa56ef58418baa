//! # onboard-connector
//!
//! WiFi onboarding connector on the tokio runtime.
//!
//! This crate provides:
//! - Connection strategies (ephemeral request, persistent profile)
//! - Process-wide network binding
//! - The provisioning facade: single-flight connects with bounded waits,
//!   cancellation, and the read-only queries of the core crate

pub mod binder;
pub mod facade;
pub mod strategy;

pub use binder::{BindError, NetworkBinder};
pub use facade::{PendingConnect, ProvisioningFacade};
pub use onboard_core::{
    ConnectionOutcome, ConnectorConfig, ErrorKind, NetworkCredential, Platform, StrategyKind,
};
pub use strategy::{ConnectionStrategy, EphemeralRequestStrategy, PersistentProfileStrategy};
