//! Service-manager environment contract.
//!
//! The gateway does not talk to launchd, systemd, or Task Scheduler
//! itself — the OS-specific service-manager integrations do.  What the
//! core owns is the fixed set of environment variables those
//! integrations consume: the service label/unit/task names, the log
//! prefix, and the service-kind marker.  [`ServiceEnvironment`] resolves
//! the values (profile-suffixed where applicable) and emits them as
//! name/value pairs for injection into the supervisor's environment.

/// launchd agent label consumed by the macOS integration.
pub const ENV_LAUNCHD_LABEL: &str = "BRAINYX_LAUNCHD_LABEL";
/// systemd unit name consumed by the Linux integration.
pub const ENV_SYSTEMD_UNIT: &str = "BRAINYX_SYSTEMD_UNIT";
/// Scheduled-task name consumed by the Windows integration.
pub const ENV_WINDOWS_TASK_NAME: &str = "BRAINYX_WINDOWS_TASK_NAME";
/// Name of the wrapper script the Windows task invokes.
pub const ENV_TASK_SCRIPT_NAME: &str = "BRAINYX_TASK_SCRIPT_NAME";
/// Prefix for the service's log files.
pub const ENV_LOG_PREFIX: &str = "BRAINYX_LOG_PREFIX";
/// Marker distinguishing Brainyx-managed services from stale entries.
pub const ENV_SERVICE_MARKER: &str = "BRAINYX_SERVICE_MARKER";
/// Which Brainyx service this is (`gateway` for this daemon).
pub const ENV_SERVICE_KIND: &str = "BRAINYX_SERVICE_KIND";

const GATEWAY_SERVICE_KIND: &str = "gateway";
const GATEWAY_SERVICE_MARKER: &str = "brainyx-gateway";
const GATEWAY_TASK_SCRIPT_NAME: &str = "brainyx-gateway-task.cmd";
const GATEWAY_LOG_PREFIX: &str = "gateway";

/// Resolved service-manager names for one gateway instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEnvironment {
    pub launchd_label: String,
    pub systemd_unit: String,
    pub windows_task_name: String,
    pub task_script_name: String,
    pub log_prefix: String,
    pub service_marker: String,
    pub service_kind: String,
}

impl ServiceEnvironment {
    /// Resolves the environment for the gateway service, optionally
    /// namespaced by a profile so several instances can be supervised
    /// side by side.
    pub fn gateway(profile: Option<&str>) -> Self {
        let (launchd_label, systemd_unit, windows_task_name) = match profile {
            Some(profile) => (
                format!("com.brainyx.gateway.{profile}"),
                format!("brainyx-gateway-{profile}.service"),
                format!("Brainyx Gateway ({profile})"),
            ),
            None => (
                "com.brainyx.gateway".to_string(),
                "brainyx-gateway.service".to_string(),
                "Brainyx Gateway".to_string(),
            ),
        };

        Self {
            launchd_label,
            systemd_unit,
            windows_task_name,
            task_script_name: GATEWAY_TASK_SCRIPT_NAME.to_string(),
            log_prefix: GATEWAY_LOG_PREFIX.to_string(),
            service_marker: GATEWAY_SERVICE_MARKER.to_string(),
            service_kind: GATEWAY_SERVICE_KIND.to_string(),
        }
    }

    /// The full variable set, ready to inject into a supervisor's
    /// environment.
    pub fn env_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            (ENV_LAUNCHD_LABEL, self.launchd_label.clone()),
            (ENV_SYSTEMD_UNIT, self.systemd_unit.clone()),
            (ENV_WINDOWS_TASK_NAME, self.windows_task_name.clone()),
            (ENV_TASK_SCRIPT_NAME, self.task_script_name.clone()),
            (ENV_LOG_PREFIX, self.log_prefix.clone()),
            (ENV_SERVICE_MARKER, self.service_marker.clone()),
            (ENV_SERVICE_KIND, self.service_kind.clone()),
        ]
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
