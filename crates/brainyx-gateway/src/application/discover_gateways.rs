//! DiscoverGatewaysUseCase: merged two-tier gateway discovery.
//!
//! Companion apps call `discover()` and get back one deduplicated beacon
//! list, regardless of how each gateway was found.  The use case fans out
//! to two injected ports:
//!
//! - [`LocalDiscoveryPort`] – the platform's local-segment service
//!   browser (Bonjour/mDNS style).  External collaborator; adapters
//!   translate raw browse results into [`Beacon`]s via the endpoint
//!   identity functions.
//! - [`WideAreaDiscoveryPort`] – the tailnet DNS probing engine in the
//!   infrastructure layer.
//!
//! Both paths run concurrently under the caller's single timeout budget.
//! Either path failing contributes an empty set — a partially-unreachable
//! network must never block a client's ability to see whatever it can
//! see — and the merge gives local results precedence on id collisions.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use brainyx_core::{merge_beacons, Beacon};

/// Error type for the local service browser port.
#[derive(Debug, Error)]
pub enum LocalBrowseError {
    /// The platform has no usable service browser (headless host, browsing
    /// disabled, missing daemon).
    #[error("local service browser unavailable: {0}")]
    Unavailable(String),
}

/// The platform's local-segment service browser.
///
/// Implementations resolve browse results to connectable addresses and
/// label each beacon with the stable id from
/// [`brainyx_core::identity::stable_id`], with `source = Local`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LocalDiscoveryPort: Send + Sync {
    async fn browse(&self, budget: Duration) -> Result<Vec<Beacon>, LocalBrowseError>;
}

/// The wide-area fallback: reconstructs beacons from tailnet DNS records.
///
/// Total by contract — failures degrade to an empty list inside the
/// implementation (see the engine's failure policy), so the use case
/// never has a wide-area error path to handle.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WideAreaDiscoveryPort: Send + Sync {
    async fn discover(&self, budget: Duration) -> Vec<Beacon>;
}

/// Merged two-tier discovery.
pub struct DiscoverGatewaysUseCase {
    local: Arc<dyn LocalDiscoveryPort>,
    wide_area: Arc<dyn WideAreaDiscoveryPort>,
}

impl DiscoverGatewaysUseCase {
    pub fn new(local: Arc<dyn LocalDiscoveryPort>, wide_area: Arc<dyn WideAreaDiscoveryPort>) -> Self {
        Self { local, wide_area }
    }

    /// Runs both discovery paths concurrently and merges the results.
    ///
    /// Always returns a (possibly empty) list; per-path failures are
    /// logged and treated as "nothing found on that path".
    pub async fn discover(&self, budget: Duration) -> Vec<Beacon> {
        let (local, wide_area) =
            tokio::join!(self.local.browse(budget), self.wide_area.discover(budget));

        let local = match local {
            Ok(beacons) => beacons,
            Err(e) => {
                warn!("local discovery skipped: {e}");
                Vec::new()
            }
        };

        debug!(
            "discovery pass: {} local, {} wide-area before merge",
            local.len(),
            wide_area.len()
        );
        merge_beacons(local, wide_area)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
