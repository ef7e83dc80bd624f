//! Integration tests for wide-area gateway discovery.
//!
//! # Purpose
//!
//! These tests exercise the `WideAreaDiscoveryEngine` through its
//! *public* API exactly the way the daemon wires it, but with canned
//! collaborators instead of the real `tailscale`/`dig` binaries.  They
//! verify:
//!
//! - The happy path: a tailnet peer advertising PTR/SRV/TXT records is
//!   reconstructed into one complete beacon, with the escaped
//!   `displayName` decoded.
//! - The failure policy: slow peers are cut off by the budget and simply
//!   excluded; completed probes still come back.
//! - The merge rule: a wide-area beacon loses to a local beacon with the
//!   same stable id.
//!
//! # What do the fixtures encode?
//!
//! The record shapes mirror real `dig +short` answers against a peer's
//! own resolver:
//!
//! ```text
//! dig @100.123.224.76 +short _brainyx-gw._tcp.brainyx.internal PTR
//!   → steipetacstudio-gateway._brainyx-gw._tcp.brainyx.internal.
//! dig @100.123.224.76 +short _brainyx-gw._tcp.brainyx.internal SRV
//!   → 0 0 18789 steipetacstudio.brainyx.internal.
//! dig @100.123.224.76 +short _brainyx-gw._tcp.brainyx.internal TXT
//!   → "displayName=Peter\226\128\153s Mac Studio (Brainyx)" "gatewayPort=18789" ...
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use brainyx_core::{Beacon, BeaconSource};
use brainyx_gateway::application::discover_gateways::{
    DiscoverGatewaysUseCase, LocalBrowseError, LocalDiscoveryPort, WideAreaDiscoveryPort,
};
use brainyx_gateway::infrastructure::network::wide_area::{
    QueryError, QueryRunner, StatusError, StatusReader, WideAreaConfig, WideAreaDiscoveryEngine,
};

const STATUS_JSON: &str = r#"{
  "Self": { "TailscaleIPs": ["100.69.232.64"] },
  "Peer": {
    "peer-1": { "TailscaleIPs": ["100.123.224.76"] }
  }
}"#;

// ── Canned collaborators ──────────────────────────────────────────────────────

struct FixtureStatus(&'static str);

#[async_trait]
impl StatusReader for FixtureStatus {
    async fn read_status(&self) -> Result<String, StatusError> {
        Ok(self.0.to_string())
    }
}

struct FailingStatus;

#[async_trait]
impl StatusReader for FailingStatus {
    async fn read_status(&self) -> Result<String, StatusError> {
        Err(StatusError::Unavailable("tailscale binary missing".into()))
    }
}

/// Answers exactly like the gateway peer at `100.123.224.76` would.
struct FixtureQueries;

#[async_trait]
impl QueryRunner for FixtureQueries {
    async fn run_query(&self, args: &[String], _timeout_ms: u64) -> Result<String, QueryError> {
        let record_type = args.last().map(String::as_str).unwrap_or_default();
        let nameserver = args
            .iter()
            .find(|a| a.starts_with('@'))
            .map(String::as_str)
            .unwrap_or_default();

        Ok(match record_type {
            "PTR" if nameserver == "@100.123.224.76" => {
                "steipetacstudio-gateway._brainyx-gw._tcp.brainyx.internal.\n".to_string()
            }
            "SRV" => "0 0 18789 steipetacstudio.brainyx.internal.".to_string(),
            "TXT" => concat!(
                "\"displayName=Peter\\226\\128\\153s Mac Studio (Brainyx)\" ",
                "\"gatewayPort=18789\" ",
                "\"tailnetDns=peters-mac-studio-1.sheep-coho.ts.net\" ",
                "\"cliPath=/Users/steipete/brainyx/src/entry.ts\""
            )
            .to_string(),
            _ => String::new(),
        })
    }
}

fn engine_with(status: impl StatusReader + 'static, queries: impl QueryRunner + 'static) -> WideAreaDiscoveryEngine {
    WideAreaDiscoveryEngine::new(Arc::new(status), Arc::new(queries), WideAreaConfig::default())
}

// ── Wide-area reconstruction ──────────────────────────────────────────────────

/// Tests the complete reconstruction path: status → PTR → SRV → TXT →
/// one beacon with decoded metadata.
#[tokio::test]
async fn test_discovers_beacon_from_tailnet_dns_sd_fallback() {
    let engine = engine_with(FixtureStatus(STATUS_JSON), FixtureQueries);

    let beacons = engine.discover(Duration::from_secs(2)).await;

    assert_eq!(beacons.len(), 1);
    let beacon = &beacons[0];
    assert_eq!(beacon.display_name, "Peter\u{2019}s Mac Studio (Brainyx)");
    assert_eq!(beacon.host, "100.123.224.76");
    assert_eq!(beacon.port, 18789);
    assert_eq!(beacon.gateway_port, 18789);
    assert_eq!(
        beacon.tailnet_dns.as_deref(),
        Some("peters-mac-studio-1.sheep-coho.ts.net")
    );
    assert_eq!(
        beacon.cli_path.as_deref(),
        Some("/Users/steipete/brainyx/src/entry.ts")
    );
    assert_eq!(beacon.source, BeaconSource::WideArea);
    assert_eq!(
        beacon.id,
        "_brainyx-gw._tcp|brainyx.internal.|steipetacstudio-gateway"
    );
}

/// Tests that a failing status read degrades to an empty result instead
/// of an error — discovery must fall back silently to local-only.
#[tokio::test]
async fn test_status_failure_returns_empty_list() {
    let engine = engine_with(FailingStatus, FixtureQueries);
    let beacons = engine.discover(Duration::from_secs(2)).await;
    assert!(beacons.is_empty());
}

/// Tests that the local node's own addresses are never probed: a status
/// document whose only peer address equals a `Self` address yields no
/// candidates and therefore no beacons.
#[tokio::test]
async fn test_own_addresses_are_not_probed() {
    const SELF_ONLY: &str = r#"{
      "Self": { "TailscaleIPs": ["100.123.224.76"] },
      "Peer": {
        "peer-1": { "TailscaleIPs": ["100.123.224.76"] }
      }
    }"#;

    let engine = engine_with(FixtureStatus(SELF_ONLY), FixtureQueries);
    assert!(engine.discover(Duration::from_secs(2)).await.is_empty());
}

// ── Budget enforcement ────────────────────────────────────────────────────────

/// Answers like the fixture for one peer but hangs forever for the
/// other, simulating an unreachable resolver.
struct OneSlowPeer;

#[async_trait]
impl QueryRunner for OneSlowPeer {
    async fn run_query(&self, args: &[String], _timeout_ms: u64) -> Result<String, QueryError> {
        let nameserver = args
            .iter()
            .find(|a| a.starts_with('@'))
            .map(String::as_str)
            .unwrap_or_default();
        if nameserver == "@100.99.99.99" {
            // Never answers inside any reasonable test budget.
            tokio::time::sleep(Duration::from_secs(600)).await;
            return Ok(String::new());
        }
        FixtureQueries.run_query(args, _timeout_ms).await
    }
}

/// Tests that exceeding the discovery budget abandons in-flight probes
/// and returns the beacons that completed — partial results are valid,
/// not an error.
#[tokio::test]
async fn test_budget_elapsed_returns_completed_probes_only() {
    const TWO_PEERS: &str = r#"{
      "Self": { "TailscaleIPs": ["100.69.232.64"] },
      "Peer": {
        "fast": { "TailscaleIPs": ["100.123.224.76"] },
        "slow": { "TailscaleIPs": ["100.99.99.99"] }
      }
    }"#;

    let engine = engine_with(FixtureStatus(TWO_PEERS), OneSlowPeer);
    let beacons = engine.discover(Duration::from_millis(500)).await;

    assert_eq!(beacons.len(), 1, "only the fast peer can complete in time");
    assert_eq!(beacons[0].host, "100.123.224.76");
}

// ── Merge precedence through the use case ─────────────────────────────────────

struct FixtureLocal(Vec<Beacon>);

#[async_trait]
impl LocalDiscoveryPort for FixtureLocal {
    async fn browse(&self, _budget: Duration) -> Result<Vec<Beacon>, LocalBrowseError> {
        Ok(self.0.clone())
    }
}

/// Tests that a beacon found by both paths appears exactly once in the
/// merged list, and that the survivor is the local-source one.
#[tokio::test]
async fn test_local_beacon_wins_over_wide_area_duplicate() {
    let local_beacon = Beacon {
        id: "_brainyx-gw._tcp|brainyx.internal.|steipetacstudio-gateway".to_string(),
        display_name: "Peter\u{2019}s Mac Studio (Brainyx)".to_string(),
        host: "192.168.1.20".to_string(),
        port: 18789,
        gateway_port: 18789,
        tailnet_dns: None,
        cli_path: None,
        source: BeaconSource::Local,
    };

    let engine = engine_with(FixtureStatus(STATUS_JSON), FixtureQueries);
    let use_case = DiscoverGatewaysUseCase::new(
        Arc::new(FixtureLocal(vec![local_beacon.clone()])),
        Arc::new(engine),
    );

    let beacons = use_case.discover(Duration::from_secs(2)).await;

    assert_eq!(beacons.len(), 1);
    assert_eq!(beacons[0].source, BeaconSource::Local);
    assert_eq!(beacons[0].host, "192.168.1.20");
}
