//! # onboard-core
//!
//! Core types and read-only queries for WiFi onboarding.
//!
//! This crate provides:
//! - Data model types (credentials, outcomes, saved profiles, gateway)
//! - Platform network stack traits
//! - SSID quoting used by platform profile stores
//! - Saved network registry and gateway resolution
//! - Capability-based strategy selection
//! - Connector configuration
//!
//! This crate is intentionally runtime-agnostic and contains no async code.
//! The `sim` feature adds an in-memory platform for tests and demos.

pub mod capability;
pub mod config;
pub mod gateway;
pub mod model;
pub mod platform;
pub mod registry;
#[cfg(any(test, feature = "sim"))]
pub mod sim;
pub mod ssid;

pub use capability::CapabilityDetector;
pub use config::{BusyPolicy, ConfigError, ConnectorConfig};
pub use gateway::GatewayResolver;
pub use model::*;
pub use platform::{Platform, PlatformError};
pub use registry::SavedNetworkRegistry;
