//! `QueryRunner` implementation over the `dig` binary.
//!
//! Each call runs a single query and returns its raw stdout.  The
//! per-query budget is enforced here with `tokio::time::timeout` and the
//! child is killed on drop, so an unresponsive peer resolver can never
//! outlive the discovery pass that asked about it.

use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::trace;

use super::wide_area::{QueryError, QueryRunner};

/// Runs DNS queries by spawning `dig`.
pub struct DigQueryRunner {
    binary: String,
}

impl DigQueryRunner {
    pub fn new() -> Self {
        Self {
            binary: "dig".to_string(),
        }
    }

    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for DigQueryRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueryRunner for DigQueryRunner {
    async fn run_query(&self, args: &[String], timeout_ms: u64) -> Result<String, QueryError> {
        trace!("dig {}", args.join(" "));

        let mut command = Command::new(&self.binary);
        command.args(args).kill_on_drop(true);

        let output = tokio::time::timeout(Duration::from_millis(timeout_ms), command.output())
            .await
            .map_err(|_| QueryError::TimedOut { timeout_ms })?
            .map_err(|e| QueryError::Spawn(format!("{}: {e}", self.binary)))?;

        if !output.status.success() {
            return Err(QueryError::Failed {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
