//! Storage infrastructure for the gateway daemon.
//!
//! Currently just configuration persistence; beacons are transient and
//! pairing requests live only in memory, so there is nothing else to
//! store.

pub mod config;
