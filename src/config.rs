//! Launch configuration
//!
//! This module resolves the launcher's configuration from CLI flags and the
//! environment, and owns the defaults recovered from the launched stack
//! (application port, virtual-environment layout, interpreter locations).
//!
//! ## Configuration Sources
//! Endpoint tier values are loaded from:
//! 1. CLI flags (`--subdomain` / `--hostname`)
//! 2. `.env` file in the current directory or parent directories (if present)
//! 3. System environment variables
//!
//! CLI flags take precedence over environment values.

use crate::error::{LauncherError, LauncherResult};
use crate::traits::ProcessRole;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const DEFAULT_LOCAL_PORT: u16 = 5000;
pub const DEFAULT_RUNTIME_DIR: &str = "venv";
pub const DEFAULT_APP_SCRIPT: &str = "server.py";
pub const DEFAULT_TUNNEL_CMD: &str = "ngrok";
pub const DEFAULT_TUNNEL_DOMAIN: &str = "ngrok.io";
pub const DEFAULT_HEALTH_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_READINESS_DELAY_SECS: u64 = 10;

/// Environment fallbacks for the endpoint tier
pub const SUBDOMAIN_ENV: &str = "LIFTOFF_SUBDOMAIN";
pub const HOSTNAME_ENV: &str = "LIFTOFF_HOSTNAME";

/// Where the tunnel should expose the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointTier {
    /// Named subdomain under the provider's domain
    Subdomain(String),
    /// Fixed public hostname
    Hostname(String),
}

impl EndpointTier {
    /// Resolve the tier from CLI flags, falling back to the environment
    ///
    /// Loads `.env` first so operators can keep the tier out of their shell
    /// history. Exactly one of subdomain/hostname must be resolvable.
    pub fn resolve(
        cli_subdomain: Option<String>,
        cli_hostname: Option<String>,
    ) -> LauncherResult<Self> {
        let _ = dotenv::dotenv();
        let env_subdomain = std::env::var(SUBDOMAIN_ENV).ok();
        let env_hostname = std::env::var(HOSTNAME_ENV).ok();
        Self::resolve_from(cli_subdomain, cli_hostname, env_subdomain, env_hostname)
    }

    fn resolve_from(
        cli_subdomain: Option<String>,
        cli_hostname: Option<String>,
        env_subdomain: Option<String>,
        env_hostname: Option<String>,
    ) -> LauncherResult<Self> {
        match (cli_subdomain, cli_hostname) {
            (Some(_), Some(_)) => Err(LauncherError::config(
                "--subdomain and --hostname are mutually exclusive",
            )),
            (Some(name), None) => Ok(EndpointTier::Subdomain(name)),
            (None, Some(host)) => Ok(EndpointTier::Hostname(host)),
            // No CLI flag given; fall back to the environment
            (None, None) => match (env_subdomain, env_hostname) {
                (Some(_), Some(_)) => Err(LauncherError::config(format!(
                    "{SUBDOMAIN_ENV} and {HOSTNAME_ENV} are both set; unset one"
                ))),
                (Some(name), None) => Ok(EndpointTier::Subdomain(name)),
                (None, Some(host)) => Ok(EndpointTier::Hostname(host)),
                (None, None) => Err(LauncherError::config(format!(
                    "no endpoint tier configured; pass --subdomain or --hostname, \
                     or set {SUBDOMAIN_ENV} / {HOSTNAME_ENV}"
                ))),
            },
        }
    }
}

/// Readiness strategy for the application phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessMode {
    /// Poll the application's local TCP port until it accepts connections
    Probe,
    /// Sleep a fixed duration, then report ready
    Delay,
}

impl ReadinessMode {
    pub fn parse(value: &str) -> LauncherResult<Self> {
        match value {
            "probe" => Ok(ReadinessMode::Probe),
            "delay" => Ok(ReadinessMode::Delay),
            other => Err(LauncherError::config(format!(
                "unknown readiness mode '{other}' (expected 'probe' or 'delay')"
            ))),
        }
    }
}

/// Fully resolved configuration for one launch run
#[derive(Debug, Clone)]
pub struct LaunchConfig {
    pub local_port: u16,
    pub tier: EndpointTier,
    pub runtime_dir: PathBuf,
    pub app_cmd: Option<PathBuf>,
    pub app_script: String,
    pub tunnel_cmd: String,
    pub tunnel_domain: String,
    pub health_url: Option<Url>,
    pub health_timeout: Duration,
    pub readiness: ReadinessMode,
    pub readiness_delay: Duration,
    pub confirm: bool,
    pub oneshot: bool,
}

impl LaunchConfig {
    /// Check the runtime environment precondition
    ///
    /// The virtual environment must exist before anything is spawned. An
    /// explicit `--app-cmd` bypasses the check since the interpreter no
    /// longer comes from the runtime dir.
    pub fn validate_runtime_dir(&self) -> LauncherResult<()> {
        if self.app_cmd.is_some() {
            return Ok(());
        }
        if self.runtime_dir.is_dir() {
            return Ok(());
        }
        Err(LauncherError::precondition(
            self.runtime_dir.clone(),
            "create the virtual environment (python -m venv venv) or pass --app-cmd",
        ))
    }

    /// Resolve the program that runs the application
    ///
    /// Explicit `--app-cmd` wins; otherwise the interpreter is located
    /// inside the runtime dir, `Scripts/python.exe` first (Windows venv
    /// layout), then `bin/python`.
    pub fn resolve_app_program(&self) -> LauncherResult<PathBuf> {
        if let Some(cmd) = &self.app_cmd {
            return Ok(cmd.clone());
        }
        resolve_interpreter(&self.runtime_dir)
    }
}

fn resolve_interpreter(runtime_dir: &Path) -> LauncherResult<PathBuf> {
    let windows = runtime_dir.join("Scripts").join("python.exe");
    if windows.is_file() {
        return Ok(windows);
    }
    let unix = runtime_dir.join("bin").join("python");
    if unix.is_file() {
        return Ok(unix);
    }
    Err(LauncherError::launch(
        ProcessRole::AppServer,
        format!(
            "no interpreter under {} (looked for Scripts/python.exe and bin/python); \
             pass --app-cmd to use one outside the runtime dir",
            runtime_dir.display()
        ),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    #[test]
    fn test_tier_cli_beats_env() {
        let tier =
            EndpointTier::resolve_from(s("cli-name"), None, s("env-name"), s("env-host")).unwrap();
        assert_eq!(tier, EndpointTier::Subdomain("cli-name".to_string()));
    }

    #[test]
    fn test_tier_both_cli_flags_rejected() {
        let err = EndpointTier::resolve_from(s("a"), s("b"), None, None).unwrap_err();
        assert!(matches!(err, LauncherError::Config { .. }));
    }

    #[test]
    fn test_tier_env_fallback() {
        let tier = EndpointTier::resolve_from(None, None, None, s("demo.example.com")).unwrap();
        assert_eq!(tier, EndpointTier::Hostname("demo.example.com".to_string()));
    }

    #[test]
    fn test_tier_nothing_configured_rejected() {
        let err = EndpointTier::resolve_from(None, None, None, None).unwrap_err();
        assert!(matches!(err, LauncherError::Config { .. }));
    }

    #[test]
    fn test_readiness_mode_parse() {
        assert_eq!(ReadinessMode::parse("probe").unwrap(), ReadinessMode::Probe);
        assert_eq!(ReadinessMode::parse("delay").unwrap(), ReadinessMode::Delay);
        assert!(ReadinessMode::parse("eventually").is_err());
    }

    #[test]
    fn test_interpreter_resolution_prefers_windows_layout() {
        let dir = tempfile::tempdir().unwrap();
        let scripts = dir.path().join("Scripts");
        let bin = dir.path().join("bin");
        std::fs::create_dir_all(&scripts).unwrap();
        std::fs::create_dir_all(&bin).unwrap();
        std::fs::write(scripts.join("python.exe"), b"").unwrap();
        std::fs::write(bin.join("python"), b"").unwrap();

        let resolved = resolve_interpreter(dir.path()).unwrap();
        assert!(resolved.ends_with("Scripts/python.exe") || resolved.ends_with("python.exe"));
    }

    #[test]
    fn test_interpreter_resolution_unix_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        std::fs::write(bin.join("python"), b"").unwrap();

        let resolved = resolve_interpreter(dir.path()).unwrap();
        assert!(resolved.ends_with("bin/python") || resolved.ends_with("python"));
    }

    #[test]
    fn test_interpreter_missing_is_app_launch_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_interpreter(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            LauncherError::Launch {
                role: ProcessRole::AppServer,
                ..
            }
        ));
    }

    #[test]
    fn test_runtime_dir_check_skipped_with_explicit_cmd() {
        let config = LaunchConfig {
            local_port: DEFAULT_LOCAL_PORT,
            tier: EndpointTier::Subdomain("demo".to_string()),
            runtime_dir: PathBuf::from("definitely-not-present"),
            app_cmd: Some(PathBuf::from("/usr/bin/python3")),
            app_script: DEFAULT_APP_SCRIPT.to_string(),
            tunnel_cmd: DEFAULT_TUNNEL_CMD.to_string(),
            tunnel_domain: DEFAULT_TUNNEL_DOMAIN.to_string(),
            health_url: None,
            health_timeout: Duration::from_secs(DEFAULT_HEALTH_TIMEOUT_SECS),
            readiness: ReadinessMode::Probe,
            readiness_delay: Duration::from_secs(DEFAULT_READINESS_DELAY_SECS),
            confirm: false,
            oneshot: true,
        };
        assert!(config.validate_runtime_dir().is_ok());
    }
}
