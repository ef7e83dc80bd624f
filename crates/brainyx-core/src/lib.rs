//! # brainyx-core
//!
//! Shared library for the Brainyx gateway containing endpoint identity
//! normalization, the discovered-beacon domain model, and the role-based
//! access-control policy.
//!
//! This crate is used by the gateway daemon and by every companion app
//! front end (menu-bar app, mobile app, CLI).
//! It has zero dependencies on OS APIs, network sockets, or the file system.
//!
//! # Architecture overview (for beginners)
//!
//! Brainyx is a personal-assistant gateway: companion apps first *discover*
//! a gateway on the network, then *pair* with it once, and from then on every
//! command they send is *authorized* against the paired session's role.
//!
//! This crate (`brainyx-core`) is the shared foundation.  It defines:
//!
//! - **`identity`** – How a raw service-discovery record becomes a stable,
//!   source-independent key.  Local-segment browsing and wide-area DNS
//!   probing can both find the same gateway; the stable id is what lets the
//!   two results be recognised as one instance.
//!
//! - **`domain`** – The `Beacon` value type: a normalized, discovered
//!   gateway instance ready for display and connection, plus the merge rule
//!   that deduplicates beacons across discovery sources.
//!
//! - **`rbac`** – The three-tier role hierarchy (`viewer < editor < admin`)
//!   and the tool allow-list filter applied to every authenticated request.

// Declare the three top-level modules.  Rust will look for each in a
// subdirectory with the same name (e.g., src/identity/mod.rs).
pub mod domain;
pub mod identity;
pub mod rbac;

// Re-export the most-used types at the crate root so callers can write
// `brainyx_core::Beacon` instead of `brainyx_core::domain::beacon::Beacon`.
pub use domain::beacon::{merge_beacons, Beacon, BeaconSource};
pub use identity::{pretty_description, stable_id, RawEndpoint};
pub use rbac::{filter_tools_by_role, has_permission, resolve_user_role, Role, Session};
