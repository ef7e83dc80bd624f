//! PairingAuthority: gates first contact from an unrecognized client.
//!
//! When a message arrives on a channel from an identity the gateway does
//! not recognise, the channel adapter asks the authority for a pairing
//! code and replies with the instruction message.  The owner relays the
//! code to the approval command out-of-band; on approval the requester
//! gets a [`Session`] with its assigned role.
//!
//! # Request lifecycle
//!
//! ```text
//! request_pairing ──► Pending ──► Approved   (terminal, success)
//!                        │
//!                        ├──────► Expired    (terminal, TTL elapsed)
//!                        ├──────► Denied     (terminal, owner rejected)
//!                        └──────► superseded (a new request for the same
//!                                 channel/requester replaces this one)
//! ```
//!
//! At most one pending request exists per `(channel, requester)` pair.
//! The pending table is the only mutable shared state in the discovery/
//! pairing core; an internal async mutex serializes the read-modify-write
//! operations so concurrent `request_pairing`/`approve` calls cannot
//! interleave on the same record.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use rand::Rng;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use brainyx_core::{Role, Session};

/// How long a pairing code stays valid.
pub const DEFAULT_CODE_TTL: Duration = Duration::from_secs(600);

/// Code alphabet: uppercase alphanumerics without the ambiguous
/// `0/O/1/I`, so codes survive being read out loud.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const CODE_LEN: usize = 8;

/// Error type for pairing operations.  Every variant is user-actionable:
/// the requester re-initiates pairing and the flow starts over.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PairingError {
    #[error("no pending pairing request matches that code")]
    NotFound,
    #[error("pairing code expired; ask the requester to start pairing again")]
    Expired,
    #[error("pairing request was denied by the owner")]
    Denied,
}

/// Lifecycle state of a pairing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingStatus {
    Pending,
    Approved,
    Expired,
    Denied,
}

/// One pairing request tracked by the authority.
#[derive(Debug, Clone)]
pub struct PairingRequest {
    pub id: Uuid,
    /// Short human-relayed code; compared case-insensitively.
    pub code: String,
    /// Origin channel/transport requesting pairing.
    pub channel: String,
    /// Opaque identifier of the requester on that channel.
    pub requester_id: String,
    pub status: PairingStatus,
    pub created_at: Instant,
    pub expires_at: Instant,
}

/// How to render the daemon's CLI invocation in user-facing messages.
///
/// The actual program form depends on how the owner reaches the daemon —
/// a global install is just `brainyx`, a named profile prefixes
/// `--profile <name>`.  Message rendering delegates here so the pairing
/// core never guesses at argv conventions.
#[derive(Debug, Clone)]
pub struct CliCommandFormat {
    program: String,
    profile: Option<String>,
}

impl CliCommandFormat {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            profile: None,
        }
    }

    pub fn with_profile(program: impl Into<String>, profile: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            profile: Some(profile.into()),
        }
    }

    /// Renders `rest` as a full invocation of the daemon CLI.
    pub fn format(&self, rest: &str) -> String {
        match &self.profile {
            Some(profile) => format!("{} --profile {} {}", self.program, profile, rest),
            None => format!("{} {}", self.program, rest),
        }
    }
}

impl Default for CliCommandFormat {
    fn default() -> Self {
        Self::new("brainyx")
    }
}

type PairingKey = (String, String); // (channel, requester_id)

/// Issues pairing codes and tracks pending requests.
pub struct PairingAuthority {
    command: CliCommandFormat,
    ttl: Duration,
    requests: Mutex<HashMap<PairingKey, PairingRequest>>,
}

impl PairingAuthority {
    pub fn new(command: CliCommandFormat) -> Self {
        Self::with_ttl(command, DEFAULT_CODE_TTL)
    }

    pub fn with_ttl(command: CliCommandFormat, ttl: Duration) -> Self {
        Self {
            command,
            ttl,
            requests: Mutex::new(HashMap::new()),
        }
    }

    /// Issues a fresh pairing code for `(channel, requester_id)`.
    ///
    /// Any prior pending request for the same identity is superseded —
    /// its code stops matching immediately.  The new code is distinct
    /// from every other currently-pending code.
    pub async fn request_pairing(&self, channel: &str, requester_id: &str) -> PairingRequest {
        let mut table = self.requests.lock().await;
        let now = Instant::now();
        expire_overdue(&mut table, now);

        let code = loop {
            let candidate = generate_code();
            let taken = table.values().any(|r| {
                r.status == PairingStatus::Pending && r.code.eq_ignore_ascii_case(&candidate)
            });
            if !taken {
                break candidate;
            }
        };

        let request = PairingRequest {
            id: Uuid::new_v4(),
            code,
            channel: channel.to_string(),
            requester_id: requester_id.to_string(),
            status: PairingStatus::Pending,
            created_at: now,
            expires_at: now + self.ttl,
        };

        let key = (channel.to_string(), requester_id.to_string());
        if let Some(prev) = table.insert(key, request.clone()) {
            if prev.status == PairingStatus::Pending {
                debug!("superseding pending pairing request for {channel}/{requester_id}");
            }
        }
        info!("pairing requested on {channel} by {requester_id}");
        request
    }

    /// Approves the pending request matching `code` (case-insensitive)
    /// and returns the new session.
    ///
    /// # Errors
    ///
    /// - [`PairingError::Expired`] if the match exists but its TTL has
    ///   elapsed; the request transitions to `Expired` as a side effect
    ///   and the code is not retryable.
    /// - [`PairingError::Denied`] if the owner already rejected the code.
    /// - [`PairingError::NotFound`] otherwise.
    pub async fn approve(&self, code: &str, role: Option<Role>) -> Result<Session, PairingError> {
        let mut table = self.requests.lock().await;
        let now = Instant::now();

        // Prefer a pending match; terminal entries only shape the error.
        let mut terminal = None;
        for request in table.values_mut() {
            if !request.code.eq_ignore_ascii_case(code) {
                continue;
            }
            match request.status {
                PairingStatus::Pending => {
                    if now > request.expires_at {
                        request.status = PairingStatus::Expired;
                        return Err(PairingError::Expired);
                    }
                    request.status = PairingStatus::Approved;
                    let session = Session {
                        identity: request.requester_id.clone(),
                        role: role.unwrap_or(Role::Viewer),
                    };
                    info!(
                        "pairing approved for {}/{} as {:?}",
                        request.channel, request.requester_id, session.role
                    );
                    return Ok(session);
                }
                status => terminal = Some(status),
            }
        }

        match terminal {
            Some(PairingStatus::Expired) => Err(PairingError::Expired),
            Some(PairingStatus::Denied) => Err(PairingError::Denied),
            _ => Err(PairingError::NotFound),
        }
    }

    /// Explicitly rejects the pending request matching `code`.  Terminal.
    pub async fn deny(&self, code: &str) -> Result<(), PairingError> {
        let mut table = self.requests.lock().await;
        let now = Instant::now();

        for request in table.values_mut() {
            if request.status != PairingStatus::Pending || !request.code.eq_ignore_ascii_case(code)
            {
                continue;
            }
            if now > request.expires_at {
                request.status = PairingStatus::Expired;
                return Err(PairingError::Expired);
            }
            request.status = PairingStatus::Denied;
            info!(
                "pairing denied for {}/{}",
                request.channel, request.requester_id
            );
            return Ok(());
        }
        Err(PairingError::NotFound)
    }

    /// Snapshot of currently-pending requests, for the owner-facing list
    /// surface.
    pub async fn pending_requests(&self) -> Vec<PairingRequest> {
        let mut table = self.requests.lock().await;
        expire_overdue(&mut table, Instant::now());
        let mut pending: Vec<PairingRequest> = table
            .values()
            .filter(|r| r.status == PairingStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        pending
    }

    /// Renders the fixed user-facing reply sent back on the requesting
    /// channel: what happened, the code, and the exact approval command
    /// the owner must run.
    pub fn build_instruction_message(&self, channel: &str, id_line: &str, code: &str) -> String {
        let approve = self
            .command
            .format(&format!("pairing approve {channel} {code}"));
        [
            "Brainyx: access not configured.".to_string(),
            String::new(),
            id_line.to_string(),
            String::new(),
            format!("Pairing code: {code}"),
            String::new(),
            "Ask the bot owner to approve with:".to_string(),
            approve,
        ]
        .join("\n")
    }
}

fn expire_overdue(table: &mut HashMap<PairingKey, PairingRequest>, now: Instant) {
    for request in table.values_mut() {
        if request.status == PairingStatus::Pending && now > request.expires_at {
            request.status = PairingStatus::Expired;
        }
    }
}

fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
