//! Local-segment browsing adapters.
//!
//! The real service browser lives inside the platform companion apps
//! (the macOS/iOS network framework, Avahi on Linux desktops); those
//! front ends inject their own [`LocalDiscoveryPort`] implementation
//! when they embed this library.  The headless daemon has no browser of
//! its own and ships this stand-in so the discovery use case degrades to
//! wide-area-only results.

use std::time::Duration;

use async_trait::async_trait;

use brainyx_core::Beacon;

use crate::application::discover_gateways::{LocalBrowseError, LocalDiscoveryPort};

/// Stand-in for hosts without a platform service browser.
pub struct UnsupportedLocalDiscovery;

#[async_trait]
impl LocalDiscoveryPort for UnsupportedLocalDiscovery {
    async fn browse(&self, _budget: Duration) -> Result<Vec<Beacon>, LocalBrowseError> {
        Err(LocalBrowseError::Unavailable(
            "no platform service browser on this host".to_string(),
        ))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
