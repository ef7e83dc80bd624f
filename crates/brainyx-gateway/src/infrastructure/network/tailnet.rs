//! `StatusReader` implementation over the `tailscale` CLI.
//!
//! Requires the `tailscale` binary on PATH and a running tailscaled.
//! The engine treats every failure here as "wide-area discovery
//! unavailable", so a host without tailscale simply falls back to
//! local-only discovery.

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::wide_area::{StatusError, StatusReader};

/// Reads the tailnet status document by running
/// `tailscale status --json`.
pub struct TailscaleStatusReader {
    binary: String,
}

impl TailscaleStatusReader {
    pub fn new() -> Self {
        Self {
            binary: "tailscale".to_string(),
        }
    }

    /// Overrides the binary path, for hosts where `tailscale` is not on
    /// PATH.
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for TailscaleStatusReader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StatusReader for TailscaleStatusReader {
    async fn read_status(&self) -> Result<String, StatusError> {
        let output = Command::new(&self.binary)
            .args(["status", "--json"])
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| StatusError::Unavailable(format!("failed to run {}: {e}", self.binary)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StatusError::Unavailable(format!(
                "{} status exited with {}: {}",
                self.binary,
                output.status,
                stderr.trim()
            )));
        }

        debug!("read tailnet status ({} bytes)", output.stdout.len());
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
