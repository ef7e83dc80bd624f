//! Wide-area gateway discovery over the tailnet.
//!
//! Local-segment browsing cannot see a gateway on a different physical
//! network.  When both machines are joined to the same tailnet, every
//! gateway is still reachable — and every tailnet node runs its own DNS
//! resolver — so the engine reconstructs beacons from standard DNS
//! records instead:
//!
//! 1. Read the tailnet status document and collect every peer address
//!    (excluding this node's own).
//! 2. Ask each peer's resolver for a **PTR** record on
//!    `_brainyx-gw._tcp.<domain>`.  A target ending in
//!    `._brainyx-gw._tcp.<domain>.` identifies that peer as a gateway;
//!    peers with empty or irrelevant answers are discarded.
//! 3. For identified gateways, fetch the **SRV** record for the
//!    advertised port and the **TXT** record for metadata
//!    (`displayName`, `gatewayPort`, `tailnetDns`, `cliPath`).
//! 4. Assemble one beacon per gateway peer and deduplicate by stable id.
//!
//! Per-peer probes are independent, stateless reads: they run
//! concurrently in a bounded task set under one caller-supplied budget,
//! and any individual failure or timeout excludes only that peer.
//! Partial results are valid results.  If the status read itself fails
//! (tailscale disabled, binary missing), the engine logs and returns an
//! empty list so discovery falls back silently to local-only results.
//!
//! The engine never touches DNS or process facilities directly — it
//! talks to a [`StatusReader`] and a [`QueryRunner`], so tests drive it
//! with canned text fixtures.
//!
//! Record-format note: parsing expects `dig +short` output (one answer
//! per line, TXT as double-quoted segments).  Deployments on platforms
//! with a different `dig` build should verify the formatting before
//! trusting wide-area results.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use brainyx_core::identity::{self, escapes, RawEndpoint};
use brainyx_core::{Beacon, BeaconSource};

use crate::application::discover_gateways::WideAreaDiscoveryPort;

/// Error type for the tailnet status feed.
#[derive(Debug, Error)]
pub enum StatusError {
    /// The status document could not be produced at all (feature
    /// disabled, binary missing, daemon not running).
    #[error("tailnet status unavailable: {0}")]
    Unavailable(String),
}

/// Error type for a single DNS query run.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("query could not be spawned: {0}")]
    Spawn(String),
    #[error("query timed out after {timeout_ms}ms")]
    TimedOut { timeout_ms: u64 },
    #[error("query exited with status {status}: {stderr}")]
    Failed { status: i32, stderr: String },
}

/// Produces the tailnet status document as a JSON string.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatusReader: Send + Sync {
    async fn read_status(&self) -> Result<String, StatusError>;
}

/// Runs one DNS query and returns its raw text output (empty string on
/// no-answer).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueryRunner: Send + Sync {
    async fn run_query(&self, args: &[String], timeout_ms: u64) -> Result<String, QueryError>;
}

/// Engine tuning, resolved once from [`GatewayConfig`] at startup.
///
/// [`GatewayConfig`]: crate::infrastructure::storage::config::GatewayConfig
#[derive(Debug, Clone)]
pub struct WideAreaConfig {
    /// Wide-area domain suffix the gateways register under.
    pub domain: String,
    /// DNS-SD service type of gateway beacons.
    pub service_type: String,
    /// Per-query time budget handed to the query runner.
    pub per_query_timeout_ms: u64,
    /// Upper bound on concurrently probed peers.
    pub max_concurrent_probes: usize,
}

impl Default for WideAreaConfig {
    fn default() -> Self {
        Self {
            domain: "brainyx.internal".to_string(),
            service_type: "_brainyx-gw._tcp".to_string(),
            per_query_timeout_ms: 2_000,
            max_concurrent_probes: 8,
        }
    }
}

// ── Tailnet status document ───────────────────────────────────────────────────

/// The slice of `tailscale status --json` this engine consumes.  All
/// other fields are ignored.
#[derive(Debug, Deserialize)]
struct TailnetStatus {
    #[serde(rename = "Self", default)]
    self_node: Option<TailnetNode>,
    #[serde(rename = "Peer", default)]
    peers: HashMap<String, TailnetNode>,
}

#[derive(Debug, Default, Deserialize)]
struct TailnetNode {
    #[serde(rename = "TailscaleIPs", default)]
    tailscale_ips: Vec<String>,
}

/// The wide-area discovery engine.
pub struct WideAreaDiscoveryEngine {
    status: Arc<dyn StatusReader>,
    queries: Arc<dyn QueryRunner>,
    config: WideAreaConfig,
}

impl WideAreaDiscoveryEngine {
    pub fn new(
        status: Arc<dyn StatusReader>,
        queries: Arc<dyn QueryRunner>,
        config: WideAreaConfig,
    ) -> Self {
        Self {
            status,
            queries,
            config,
        }
    }

    async fn run(&self, budget: Duration) -> Vec<Beacon> {
        let status_json = match self.status.read_status().await {
            Ok(json) => json,
            Err(e) => {
                warn!("wide-area discovery skipped: {e}");
                return Vec::new();
            }
        };

        let candidates = match candidate_addresses(&status_json) {
            Ok(addrs) => addrs,
            Err(e) => {
                warn!("could not parse tailnet status: {e}");
                return Vec::new();
            }
        };
        debug!("probing {} tailnet peer(s)", candidates.len());

        // Probes push into a shared vector so that an exhausted budget
        // still yields every beacon that finished in time.
        let completed: Arc<Mutex<Vec<Beacon>>> = Arc::new(Mutex::new(Vec::new()));
        let limiter = Arc::new(Semaphore::new(self.config.max_concurrent_probes.max(1)));
        let mut probes = JoinSet::new();

        for addr in candidates {
            let queries = Arc::clone(&self.queries);
            let config = self.config.clone();
            let completed = Arc::clone(&completed);
            let limiter = Arc::clone(&limiter);
            probes.spawn(async move {
                let Ok(_permit) = limiter.acquire_owned().await else {
                    return;
                };
                if let Some(beacon) = probe_peer(queries.as_ref(), &config, &addr).await {
                    if let Ok(mut list) = completed.lock() {
                        list.push(beacon);
                    }
                }
            });
        }

        let all_done = tokio::time::timeout(budget, async {
            while probes.join_next().await.is_some() {}
        })
        .await;
        if all_done.is_err() {
            probes.abort_all();
            debug!("wide-area budget elapsed; returning completed probes only");
        }

        let mut beacons = match completed.lock() {
            Ok(mut list) => std::mem::take(&mut *list),
            Err(_) => Vec::new(),
        };

        // Completion order depends on peer latency; sort for a stable
        // result, then drop same-instance duplicates.
        beacons.sort_by(|a, b| a.id.cmp(&b.id).then_with(|| a.host.cmp(&b.host)));
        let mut seen = HashSet::new();
        beacons.retain(|b| seen.insert(b.id.clone()));
        beacons
    }
}

#[async_trait]
impl WideAreaDiscoveryPort for WideAreaDiscoveryEngine {
    async fn discover(&self, budget: Duration) -> Vec<Beacon> {
        self.run(budget).await
    }
}

// ── Probe pipeline ────────────────────────────────────────────────────────────

/// Parses the status document into the list of peer addresses to probe,
/// excluding this node's own addresses.
fn candidate_addresses(status_json: &str) -> Result<Vec<String>, serde_json::Error> {
    let status: TailnetStatus = serde_json::from_str(status_json)?;

    let own: HashSet<String> = status
        .self_node
        .map(|node| node.tailscale_ips.into_iter().collect())
        .unwrap_or_default();

    let mut addrs: Vec<String> = status
        .peers
        .into_values()
        .flat_map(|peer| peer.tailscale_ips)
        .filter(|addr| !own.contains(addr))
        .collect();
    addrs.sort();
    addrs.dedup();
    Ok(addrs)
}

/// Probes one peer: PTR to identify it as a gateway, then SRV and TXT to
/// assemble the beacon.  Returns `None` whenever the peer should simply
/// be excluded from this pass.
async fn probe_peer(
    queries: &dyn QueryRunner,
    config: &WideAreaConfig,
    addr: &str,
) -> Option<Beacon> {
    let service_name = format!("{}.{}", config.service_type, config.domain);

    let ptr = query_short(queries, config, addr, &service_name, "PTR").await?;
    let instance = gateway_instance(&ptr, config)?;
    debug!("peer {addr} advertises gateway instance {instance}");

    let srv = query_short(queries, config, addr, &service_name, "SRV").await;
    let srv_port = srv.as_deref().and_then(parse_srv_port);

    let txt = query_short(queries, config, addr, &service_name, "TXT").await;
    let metadata = txt.as_deref().map(parse_txt_metadata).unwrap_or_default();
    let txt_port: Option<u16> = metadata.get("gatewayPort").and_then(|v| v.parse().ok());

    // SRV is authoritative for the transport port; TXT fills the gaps.
    // A peer advertising neither port is unconnectable and excluded.
    let port = srv_port.or(txt_port)?;
    let gateway_port = txt_port.or(srv_port).unwrap_or(port);

    let endpoint = RawEndpoint::service(
        instance.clone(),
        config.service_type.clone(),
        format!("{}.", config.domain),
    );
    let display_name = metadata
        .get("displayName")
        .map(|name| escapes::decode(name))
        .unwrap_or_else(|| escapes::normalize_name(&instance));

    Some(Beacon {
        id: identity::stable_id(&endpoint),
        display_name,
        host: addr.to_string(),
        port,
        gateway_port,
        tailnet_dns: metadata.get("tailnetDns").cloned(),
        cli_path: metadata.get("cliPath").cloned(),
        source: BeaconSource::WideArea,
    })
}

/// Runs one `+short` query against `addr`'s resolver.  Returns `None`
/// for failures and empty answers alike — both exclude the peer.
async fn query_short(
    queries: &dyn QueryRunner,
    config: &WideAreaConfig,
    addr: &str,
    name: &str,
    record_type: &str,
) -> Option<String> {
    let args = vec![
        format!("@{addr}"),
        "+short".to_string(),
        name.to_string(),
        record_type.to_string(),
    ];
    match queries.run_query(&args, config.per_query_timeout_ms).await {
        Ok(output) => {
            let trimmed = output.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Err(e) => {
            debug!("{record_type} query to {addr} failed: {e}");
            None
        }
    }
}

/// Extracts the service instance name from a PTR answer whose target
/// ends in `._brainyx-gw._tcp.<domain>.`; irrelevant answers yield
/// `None`.
fn gateway_instance(ptr_answer: &str, config: &WideAreaConfig) -> Option<String> {
    let suffix = format!(".{}.{}.", config.service_type, config.domain);
    ptr_answer
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_suffix(suffix.as_str()))
        .map(str::to_string)
}

/// Pulls the port out of an SRV answer: `priority weight port target`,
/// so the 3rd whitespace-separated field.
fn parse_srv_port(srv_answer: &str) -> Option<u16> {
    srv_answer
        .lines()
        .next()?
        .split_whitespace()
        .nth(2)?
        .parse()
        .ok()
}

/// Parses a TXT answer into a key/value map.  Each double-quoted segment
/// is an independent `key=value` token; segments without `=` and
/// duplicate keys beyond the first are ignored.
fn parse_txt_metadata(txt_answer: &str) -> HashMap<String, String> {
    let mut metadata = HashMap::new();
    let mut in_quote = false;
    let mut current = String::new();

    for c in txt_answer.chars() {
        if c == '"' {
            if in_quote {
                if let Some((key, value)) = current.split_once('=') {
                    metadata
                        .entry(key.to_string())
                        .or_insert_with(|| value.to_string());
                }
                current.clear();
            }
            in_quote = !in_quote;
        } else if in_quote {
            current.push(c);
        }
    }
    metadata
}

// ── Tests ─────────────────────────────────────────────────────────────────────
