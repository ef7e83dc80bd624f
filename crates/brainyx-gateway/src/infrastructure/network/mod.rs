//! Network infrastructure for the gateway daemon.
//!
//! # Sub-modules
//!
//! - **`wide_area`** – The wide-area discovery engine: reads the tailnet
//!   peer directory and probes each peer with PTR/SRV/TXT lookups to
//!   reconstruct the beacons local browsing would have produced.
//!
//! - **`tailnet`** – `StatusReader` implementation over the `tailscale`
//!   CLI (`tailscale status --json`).
//!
//! - **`dig`** – `QueryRunner` implementation over the `dig` binary.
//!
//! - **`local`** – Local-segment browsing adapters.  The real browser
//!   lives in the platform companion apps; the daemon ships the
//!   unsupported-host stand-in.

pub mod dig;
pub mod local;
pub mod tailnet;
pub mod wide_area;
