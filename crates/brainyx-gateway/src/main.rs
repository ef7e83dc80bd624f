//! Brainyx gateway daemon — entry point.
//!
//! Wires together the configuration, the wide-area discovery engine and
//! its tailscale/dig collaborators, and the merged discovery use case,
//! then runs periodic discovery passes until shutdown.  Pairing and RBAC
//! are exposed through the library surface (`application::pairing`,
//! `brainyx_core::rbac`) to the channel adapters that embed it.
//!
//! # Usage
//!
//! ```text
//! brainyx-gateway [OPTIONS]
//!
//! Options:
//!   --interval-secs <SECS>  Seconds between discovery passes [default: 30]
//!   --once                  Run a single discovery pass and exit
//!   --profile <NAME>        Profile name for service-manager namespacing
//! ```
//!
//! Configuration comes from the platform config file plus `BRAINYX_*`
//! environment overrides, resolved once at startup (see
//! `infrastructure::storage::config`).  Log level is overridden by
//! `RUST_LOG`.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ resolve_config()            -- file + env, one immutable value
//!  └─ DiscoverGatewaysUseCase
//!       ├─ UnsupportedLocalDiscovery   (platform apps inject the real browser)
//!       └─ WideAreaDiscoveryEngine
//!            ├─ TailscaleStatusReader  (tailscale status --json)
//!            └─ DigQueryRunner         (dig @peer ... PTR/SRV/TXT)
//! ```

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use brainyx_gateway::application::discover_gateways::DiscoverGatewaysUseCase;
use brainyx_gateway::infrastructure::network::dig::DigQueryRunner;
use brainyx_gateway::infrastructure::network::local::UnsupportedLocalDiscovery;
use brainyx_gateway::infrastructure::network::tailnet::TailscaleStatusReader;
use brainyx_gateway::infrastructure::network::wide_area::{WideAreaConfig, WideAreaDiscoveryEngine};
use brainyx_gateway::infrastructure::service_env::ServiceEnvironment;
use brainyx_gateway::infrastructure::storage::config::resolve_config;

/// Brainyx gateway daemon.
///
/// Discovers reachable gateways over the local segment and the tailnet
/// and logs what it finds; companion apps use the same library surface
/// to present the list, pair, and authorize operations.
#[derive(Debug, Parser)]
#[command(
    name = "brainyx-gateway",
    about = "Brainyx gateway daemon — discovery, pairing, and access control",
    version
)]
struct Cli {
    /// Seconds between discovery passes.
    #[arg(long, default_value_t = 30)]
    interval_secs: u64,

    /// Run a single discovery pass and exit.
    #[arg(long)]
    once: bool,

    /// Profile name, for running several supervised instances side by
    /// side.
    #[arg(long)]
    profile: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = resolve_config().context("failed to resolve gateway configuration")?;

    info!("Brainyx gateway starting");

    let service_env = ServiceEnvironment::gateway(cli.profile.as_deref());
    for (name, value) in service_env.env_pairs() {
        debug!("service env {name}={value}");
    }

    // ── Discovery wiring ──────────────────────────────────────────────────────
    let engine = WideAreaDiscoveryEngine::new(
        Arc::new(TailscaleStatusReader::new()),
        Arc::new(DigQueryRunner::new()),
        WideAreaConfig::from(&config.discovery),
    );
    let discovery =
        DiscoverGatewaysUseCase::new(Arc::new(UnsupportedLocalDiscovery), Arc::new(engine));
    let budget = config.discovery.budget();

    // ── Ctrl-C / SIGTERM handler ──────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            running_clone.store(false, Ordering::Relaxed);
        }
    });

    info!(
        "gateway advertises app port {} on {}",
        config.gateway.gateway_port, config.gateway.bind_address
    );
    info!(
        "discovering gateways under {} every {}s",
        config.discovery.wide_area_domain, cli.interval_secs
    );

    while running.load(Ordering::Relaxed) {
        let beacons = discovery.discover(budget).await;
        if beacons.is_empty() {
            info!("no gateways discovered this pass");
        }
        for beacon in &beacons {
            info!(
                "gateway {} at {}:{} (app port {}, via {:?})",
                beacon.display_name, beacon.host, beacon.port, beacon.gateway_port, beacon.source
            );
        }

        if cli.once {
            break;
        }

        // Sleep in short slices so shutdown stays responsive.
        let mut remaining = cli.interval_secs.max(1) * 10;
        while remaining > 0 && running.load(Ordering::Relaxed) {
            tokio::time::sleep(Duration::from_millis(100)).await;
            remaining -= 1;
        }
    }

    info!("Brainyx gateway stopped");
    Ok(())
}
