//! Strategy selection by platform capability.
//!
//! All OS-version branching lives here so strategies never re-check it.

use std::sync::Arc;

use crate::model::{ErrorKind, StrategyHint, StrategyKind};
use crate::platform::PlatformInfo;

/// First SDK level offering ephemeral network requests.
pub const EPHEMERAL_MIN_SDK: u32 = 29;

/// Picks the connection strategy available on the running platform.
#[derive(Clone)]
pub struct CapabilityDetector {
    info: Arc<dyn PlatformInfo>,
    ephemeral_min_sdk: u32,
}

impl CapabilityDetector {
    pub fn new(info: Arc<dyn PlatformInfo>, ephemeral_min_sdk: u32) -> Self {
        Self {
            info,
            ephemeral_min_sdk,
        }
    }

    /// Select the strategy for this platform. Always returns a variant.
    pub fn select_strategy(&self) -> StrategyKind {
        if self.info.sdk_level() >= self.ephemeral_min_sdk {
            StrategyKind::Ephemeral
        } else {
            StrategyKind::PersistentProfile
        }
    }

    /// Check whether `kind` can run on this platform.
    ///
    /// Saved profiles are writable on every supported level; ephemeral
    /// requests need a recent OS.
    pub fn supports(&self, kind: StrategyKind) -> bool {
        match kind {
            StrategyKind::Ephemeral => self.info.sdk_level() >= self.ephemeral_min_sdk,
            StrategyKind::PersistentProfile => true,
        }
    }

    /// Resolve a caller hint into a concrete strategy.
    pub fn resolve(&self, hint: StrategyHint) -> Result<StrategyKind, ErrorKind> {
        match hint {
            StrategyHint::Auto => Ok(self.select_strategy()),
            StrategyHint::Prefer(kind) if self.supports(kind) => Ok(kind),
            StrategyHint::Prefer(_) => Err(ErrorKind::PlatformUnsupported),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSdk(u32);

    impl PlatformInfo for FixedSdk {
        fn sdk_level(&self) -> u32 {
            self.0
        }
    }

    fn detector(sdk: u32) -> CapabilityDetector {
        CapabilityDetector::new(Arc::new(FixedSdk(sdk)), EPHEMERAL_MIN_SDK)
    }

    #[test]
    fn test_select_by_sdk_level() {
        assert_eq!(detector(28).select_strategy(), StrategyKind::PersistentProfile);
        assert_eq!(detector(29).select_strategy(), StrategyKind::Ephemeral);
        assert_eq!(detector(34).select_strategy(), StrategyKind::Ephemeral);
    }

    #[test]
    fn test_resolve_hint() {
        let legacy = detector(23);
        assert_eq!(
            legacy.resolve(StrategyHint::Auto),
            Ok(StrategyKind::PersistentProfile)
        );
        assert_eq!(
            legacy.resolve(StrategyHint::Prefer(StrategyKind::Ephemeral)),
            Err(ErrorKind::PlatformUnsupported)
        );

        let modern = detector(33);
        assert_eq!(
            modern.resolve(StrategyHint::Prefer(StrategyKind::PersistentProfile)),
            Ok(StrategyKind::PersistentProfile)
        );
    }
}
