//! TOML-based configuration for the gateway daemon.
//!
//! Reads and writes `GatewayConfig` from the platform-appropriate state
//! directory:
//! - Windows:  `%APPDATA%\Brainyx\config.toml`
//! - Linux:    `~/.config/brainyx/config.toml`
//! - macOS:    `~/Library/Application Support/Brainyx/config.toml`
//!
//! `BRAINYX_STATE_DIR` overrides the directory wholesale.
//!
//! # One resolution step
//!
//! Components never read environment variables themselves.  The binary
//! calls [`resolve_config`] exactly once at startup; it loads the file
//! (or defaults), layers the `BRAINYX_*` overrides on top, and hands the
//! resulting immutable value to discovery and pairing.  Tests exercise
//! the override layer through [`apply_env_overrides_from`], which takes
//! the lookup as a parameter instead of touching the process
//! environment.
//!
//! # Serde default values
//!
//! Fields annotated with `#[serde(default = "some_fn")]` use the return
//! value of `some_fn()` when the field is absent from the TOML file, so
//! the daemon works on first run and when upgrading from an older config
//! file that is missing newer fields.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::pairing::CliCommandFormat;
use crate::infrastructure::network::wide_area::WideAreaConfig;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level daemon configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct GatewayConfig {
    #[serde(default)]
    pub gateway: GatewaySection,
    #[serde(default)]
    pub discovery: DiscoverySection,
    #[serde(default)]
    pub pairing: PairingSection,
}

/// General gateway behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GatewaySection {
    /// IP address to bind the gateway listener to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Application-level port advertised in beacons.
    #[serde(default = "default_gateway_port")]
    pub gateway_port: u16,
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Discovery tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscoverySection {
    /// Wide-area domain suffix gateways register under.
    #[serde(default = "default_wide_area_domain")]
    pub wide_area_domain: String,
    /// DNS-SD service type of gateway beacons.
    #[serde(default = "default_service_type")]
    pub service_type: String,
    /// Overall budget for one discovery pass, in milliseconds.
    #[serde(default = "default_discovery_budget_ms")]
    pub discovery_budget_ms: u64,
    /// Per-query budget handed to the DNS runner, in milliseconds.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    /// Upper bound on concurrently probed tailnet peers.
    #[serde(default = "default_max_concurrent_probes")]
    pub max_concurrent_probes: usize,
}

/// Pairing handshake settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PairingSection {
    /// Pairing-code lifetime in seconds.
    #[serde(default = "default_code_ttl_secs")]
    pub code_ttl_secs: u64,
    /// Program name rendered in approval instructions.
    #[serde(default = "default_program")]
    pub program: String,
    /// Optional profile name prefixed as `--profile <name>` in rendered
    /// commands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_gateway_port() -> u16 {
    18789
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_wide_area_domain() -> String {
    "brainyx.internal".to_string()
}
fn default_service_type() -> String {
    "_brainyx-gw._tcp".to_string()
}
fn default_discovery_budget_ms() -> u64 {
    3_000
}
fn default_probe_timeout_ms() -> u64 {
    2_000
}
fn default_max_concurrent_probes() -> usize {
    8
}
fn default_code_ttl_secs() -> u64 {
    600
}
fn default_program() -> String {
    "brainyx".to_string()
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            gateway_port: default_gateway_port(),
            log_level: default_log_level(),
        }
    }
}

impl Default for DiscoverySection {
    fn default() -> Self {
        Self {
            wide_area_domain: default_wide_area_domain(),
            service_type: default_service_type(),
            discovery_budget_ms: default_discovery_budget_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
            max_concurrent_probes: default_max_concurrent_probes(),
        }
    }
}

impl Default for PairingSection {
    fn default() -> Self {
        Self {
            code_ttl_secs: default_code_ttl_secs(),
            program: default_program(),
            profile: None,
        }
    }
}

// ── Component views ───────────────────────────────────────────────────────────

impl DiscoverySection {
    pub fn budget(&self) -> Duration {
        Duration::from_millis(self.discovery_budget_ms)
    }
}

impl From<&DiscoverySection> for WideAreaConfig {
    fn from(section: &DiscoverySection) -> Self {
        Self {
            domain: section.wide_area_domain.clone(),
            service_type: section.service_type.clone(),
            per_query_timeout_ms: section.probe_timeout_ms,
            max_concurrent_probes: section.max_concurrent_probes,
        }
    }
}

impl PairingSection {
    pub fn code_ttl(&self) -> Duration {
        Duration::from_secs(self.code_ttl_secs)
    }

    pub fn command_format(&self) -> CliCommandFormat {
        match &self.profile {
            Some(profile) => CliCommandFormat::with_profile(self.program.clone(), profile.clone()),
            None => CliCommandFormat::new(self.program.clone()),
        }
    }
}

// ── Environment overrides ─────────────────────────────────────────────────────

/// Layers `BRAINYX_*` environment overrides onto `config`, reading
/// through `lookup` so tests can substitute a canned environment.
pub fn apply_env_overrides_from(
    config: &mut GatewayConfig,
    lookup: impl Fn(&str) -> Option<String>,
) {
    if let Some(domain) = lookup("BRAINYX_WIDE_AREA_DOMAIN") {
        config.discovery.wide_area_domain = domain;
    }
    if let Some(port) = lookup("BRAINYX_GATEWAY_PORT").and_then(|v| v.parse().ok()) {
        config.gateway.gateway_port = port;
    }
    if let Some(profile) = lookup("BRAINYX_PROFILE") {
        config.pairing.profile = Some(profile);
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the directory holding the config file.
///
/// `BRAINYX_STATE_DIR` wins when set; otherwise the platform default.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when neither the
/// override nor the platform base directory can be determined.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    if let Some(dir) = std::env::var_os("BRAINYX_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the config file.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `GatewayConfig` from disk, returning `GatewayConfig::default()`
/// if the file does not yet exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not
/// found", and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config() -> Result<GatewayConfig, ConfigError> {
    let path = config_file_path()?;

    match std::fs::read_to_string(&path) {
        Ok(content) => {
            let cfg: GatewayConfig = toml::from_str(&content)?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(GatewayConfig::default()),
        Err(e) => Err(ConfigError::Io { path, source: e }),
    }
}

/// Persists `config` to disk, creating the directory if needed.
pub fn save_config(config: &GatewayConfig) -> Result<(), ConfigError> {
    let path = config_file_path()?;

    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(&path, content).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(())
}

/// The single startup resolution step: file, then environment overrides.
pub fn resolve_config() -> Result<GatewayConfig, ConfigError> {
    let mut config = load_config()?;
    apply_env_overrides_from(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Resolves the platform config base directory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        // %APPDATA% e.g. C:\Users\<user>\AppData\Roaming
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("Brainyx"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("brainyx"))
    }

    #[cfg(target_os = "macos")]
    {
        // ~/Library/Application Support/Brainyx
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("Brainyx")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_has_expected_values() {
        let cfg = GatewayConfig::default();
        assert_eq!(cfg.gateway.gateway_port, 18789);
        assert_eq!(cfg.discovery.wide_area_domain, "brainyx.internal");
        assert_eq!(cfg.discovery.service_type, "_brainyx-gw._tcp");
        assert_eq!(cfg.pairing.code_ttl_secs, 600);
        assert_eq!(cfg.gateway.log_level, "info");
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let mut cfg = GatewayConfig::default();
        cfg.discovery.wide_area_domain = "example.internal".to_string();
        cfg.pairing.profile = Some("work".to_string());

        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let restored: GatewayConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(cfg, restored);
    }

    #[test]
    fn test_deserialize_empty_toml_uses_defaults() {
        let cfg: GatewayConfig = toml::from_str("").expect("deserialize empty");
        assert_eq!(cfg, GatewayConfig::default());
    }

    #[test]
    fn test_deserialize_partial_section_overrides_defaults() {
        let toml_str = r#"
[discovery]
wide_area_domain = "corp.internal"
"#;
        let cfg: GatewayConfig = toml::from_str(toml_str).expect("deserialize partial");
        assert_eq!(cfg.discovery.wide_area_domain, "corp.internal");
        // Unspecified fields keep their defaults
        assert_eq!(cfg.discovery.probe_timeout_ms, 2_000);
    }

    #[test]
    fn test_deserialize_invalid_toml_returns_parse_error() {
        let result: Result<GatewayConfig, toml::de::Error> = toml::from_str("[[[ not valid toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_env_overrides_apply_from_lookup() {
        // Arrange: a canned environment instead of process env vars.
        let mut cfg = GatewayConfig::default();
        let env = |key: &str| match key {
            "BRAINYX_WIDE_AREA_DOMAIN" => Some("lab.internal".to_string()),
            "BRAINYX_GATEWAY_PORT" => Some("19000".to_string()),
            "BRAINYX_PROFILE" => Some("lab".to_string()),
            _ => None,
        };

        // Act
        apply_env_overrides_from(&mut cfg, env);

        // Assert
        assert_eq!(cfg.discovery.wide_area_domain, "lab.internal");
        assert_eq!(cfg.gateway.gateway_port, 19000);
        assert_eq!(cfg.pairing.profile.as_deref(), Some("lab"));
    }

    #[test]
    fn test_env_overrides_ignore_unparseable_port() {
        let mut cfg = GatewayConfig::default();
        apply_env_overrides_from(&mut cfg, |key| {
            (key == "BRAINYX_GATEWAY_PORT").then(|| "not-a-port".to_string())
        });
        assert_eq!(cfg.gateway.gateway_port, 18789);
    }

    #[test]
    fn test_empty_lookup_changes_nothing() {
        let mut cfg = GatewayConfig::default();
        apply_env_overrides_from(&mut cfg, |_| None);
        assert_eq!(cfg, GatewayConfig::default());
    }

    #[test]
    fn test_discovery_section_converts_to_engine_config() {
        let section = DiscoverySection {
            wide_area_domain: "corp.internal".to_string(),
            service_type: "_brainyx-gw._tcp".to_string(),
            discovery_budget_ms: 5_000,
            probe_timeout_ms: 1_500,
            max_concurrent_probes: 4,
        };

        let engine_cfg = WideAreaConfig::from(&section);
        assert_eq!(engine_cfg.domain, "corp.internal");
        assert_eq!(engine_cfg.per_query_timeout_ms, 1_500);
        assert_eq!(engine_cfg.max_concurrent_probes, 4);
        assert_eq!(section.budget(), Duration::from_millis(5_000));
    }

    #[test]
    fn test_pairing_section_builds_command_format() {
        let mut section = PairingSection::default();
        assert_eq!(
            section.command_format().format("pairing approve telegram X"),
            "brainyx pairing approve telegram X"
        );

        section.profile = Some("work".to_string());
        assert_eq!(
            section.command_format().format("pairing approve telegram X"),
            "brainyx --profile work pairing approve telegram X"
        );
    }

    #[test]
    fn test_save_and_load_round_trip_via_state_dir_override() {
        // Arrange: point the state dir at a throwaway location.  This is
        // the only test in the crate that touches BRAINYX_STATE_DIR.
        let dir = std::env::temp_dir().join(format!("brainyx_test_{}", std::process::id()));
        std::env::set_var("BRAINYX_STATE_DIR", &dir);

        let mut cfg = GatewayConfig::default();
        cfg.gateway.gateway_port = 12345;
        cfg.gateway.log_level = "debug".to_string();

        // Act
        save_config(&cfg).expect("save");
        let loaded = load_config().expect("load");

        // Assert
        assert_eq!(loaded.gateway.gateway_port, 12345);
        assert_eq!(loaded.gateway.log_level, "debug");

        // Cleanup
        std::env::remove_var("BRAINYX_STATE_DIR");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_profile_none_is_omitted_from_toml() {
        let cfg = GatewayConfig::default();
        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        assert!(!toml_str.contains("profile"), "None profile must be omitted");
    }
}
