//! Discovered gateway beacons and the cross-source merge rule.
//!
//! A `Beacon` is the normalized record a discovery pass hands to the UI:
//! everything a companion app needs to display a gateway and connect to
//! it.  Beacons are transient — they are owned by the discovery call that
//! produced them and never persisted.
//!
//! # Why two sources? (for beginners)
//!
//! Local-segment browsing only sees gateways on the same broadcast
//! domain.  When the client is on a different physical network but joined
//! to the same tailnet, wide-area probing reconstructs an equivalent
//! beacon from DNS records.  Both paths can find the same gateway, so
//! every beacon carries the stable identity key from
//! [`crate::identity::stable_id`] and the merge rule below deduplicates
//! on it.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Which discovery path produced a beacon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BeaconSource {
    /// Local-segment service browsing.
    Local,
    /// Wide-area DNS probing over the tailnet.
    WideArea,
}

/// One discovered gateway instance, ready for display and connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beacon {
    /// Stable identity key, used for deduplication across sources.
    pub id: String,
    /// Human-readable, escape-decoded name.
    pub display_name: String,
    /// Transport address for pairing/connection.
    pub host: String,
    pub port: u16,
    /// Application-level port, when distinct from the transport port.
    pub gateway_port: u16,
    /// Tailnet DNS name, when resolved via the wide-area path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tailnet_dns: Option<String>,
    /// Advertised path to the remote CLI binary.  Informational only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cli_path: Option<String>,
    pub source: BeaconSource,
}

/// Merges local and wide-area discovery results into one deduplicated
/// list.
///
/// Local results come first and always win a collision: local browsing is
/// higher-confidence than reconstruction from DNS records, so a wide-area
/// beacon with an id already present locally is dropped.  Within one
/// source the first occurrence wins.  Relative order is preserved.
pub fn merge_beacons(local: Vec<Beacon>, wide_area: Vec<Beacon>) -> Vec<Beacon> {
    let mut seen = HashSet::with_capacity(local.len() + wide_area.len());
    let mut merged = Vec::with_capacity(local.len() + wide_area.len());

    for beacon in local.into_iter().chain(wide_area) {
        if seen.insert(beacon.id.clone()) {
            merged.push(beacon);
        } else {
            debug!(
                "dropping duplicate beacon {} from {:?}",
                beacon.id, beacon.source
            );
        }
    }

    merged
}

// ── Tests ─────────────────────────────────────────────────────────────────────
