//! Application layer use cases for the gateway daemon.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (pure business rules, here in `brainyx-core`) and the infrastructure
//! (OS/network/process adapters).
//!
//! Use cases in this layer:
//!
//! - **Orchestrate** domain objects to fulfil a user goal (e.g., "show me
//!   every reachable gateway, however it was found").
//! - **Depend on abstractions** (traits) rather than concrete
//!   implementations, so the infrastructure can be swapped without
//!   changing this code.
//! - **Contain no OS calls, no network I/O, no file system access**.
//!
//! # Sub-modules
//!
//! - **`discover_gateways`** – Runs local-segment browsing and wide-area
//!   probing through their injected ports and merges the results into one
//!   deduplicated beacon list.
//!
//! - **`pairing`** – Gates first contact from an unrecognized client
//!   identity: issues pairing codes, tracks pending requests, validates
//!   approval, and renders the owner-facing instruction message.

pub mod discover_gateways;
pub mod pairing;
