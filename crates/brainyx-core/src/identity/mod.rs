//! Endpoint identity: stable keys and display labels for discovered
//! endpoints.
//!
//! Discovery produces raw endpoint descriptions from two different
//! sources — the platform's local-segment service browser and wide-area
//! DNS probing over the tailnet.  Both can see the same gateway, and the
//! raw descriptions they produce differ in escaping and whitespace.  The
//! functions here turn any raw description into:
//!
//! 1. A **stable id** used to deduplicate beacons across sources.
//! 2. A **pretty description** suitable for UI display.
//!
//! Both are total functions: there is no malformed input, only input that
//! decodes to itself.

use std::fmt;

pub mod escapes;

pub use escapes::{decode, normalize_name};

/// A raw endpoint description as supplied by a discovery source.
///
/// Named service records (the common case for local browsing) carry the
/// DNS-SD triple of instance name, service type, and domain.  Anything
/// else — typically a bare host and port from manual configuration — is a
/// `HostPort`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawEndpoint {
    /// A DNS-SD service record: `name`, `service_type`, `domain`.
    Service {
        name: String,
        service_type: String,
        domain: String,
    },
    /// A bare transport address with no service record attached.
    HostPort { host: String, port: u16 },
}

impl RawEndpoint {
    pub fn service(
        name: impl Into<String>,
        service_type: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self::Service {
            name: name.into(),
            service_type: service_type.into(),
            domain: domain.into(),
        }
    }

    pub fn host_port(host: impl Into<String>, port: u16) -> Self {
        Self::HostPort {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for RawEndpoint {
    /// The default textual rendering: `name.type.domain` for service
    /// records, `host:port` otherwise.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Service {
                name,
                service_type,
                domain,
            } => write!(f, "{name}.{service_type}.{domain}"),
            Self::HostPort { host, port } => write!(f, "{host}:{port}"),
        }
    }
}

/// Produces the stable, source-independent identity key for an endpoint.
///
/// Service records key on `type|domain|normalized-name`, so the same
/// instance found via local browsing and via wide-area probing maps to
/// the same id regardless of how its name was escaped.  Non-service
/// endpoints have no escaping scheme; their key is the default rendering
/// verbatim.
pub fn stable_id(endpoint: &RawEndpoint) -> String {
    match endpoint {
        RawEndpoint::Service {
            name,
            service_type,
            domain,
        } => format!("{service_type}|{domain}|{}", escapes::normalize_name(name)),
        RawEndpoint::HostPort { .. } => endpoint.to_string(),
    }
}

/// Produces a human-readable label for an endpoint.
///
/// Always escape-decodes the default rendering, for every endpoint kind —
/// display strings must never show `\032` to the user.
pub fn pretty_description(endpoint: &RawEndpoint) -> String {
    escapes::decode(&endpoint.to_string())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
