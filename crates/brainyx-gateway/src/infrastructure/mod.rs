//! Infrastructure layer for the gateway daemon.
//!
//! Contains OS-facing adapters: the wide-area discovery engine and its
//! tailscale/dig process collaborators, file-system configuration, and
//! the service-manager environment contract.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `brainyx_core`, but MUST NOT be imported by the `application` or
//! domain layers.

pub mod network;
pub mod service_env;
pub mod storage;
