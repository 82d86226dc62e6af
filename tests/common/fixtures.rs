//! Test fixtures and data for launcher tests
//!
//! This module provides consistent test data and fixtures used across all
//! test suites: launch configurations that never touch the network, health
//! reports for mock checkers, and on-disk runtime environments.

use chrono::Utc;
use liftoff::{
    EndpointTier, HealthReport, HealthVerdict, LaunchConfig, ProcessHandle, ProcessRole,
    ReadinessMode,
};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Standard test data and fixtures
pub struct TestFixtures;

impl TestFixtures {
    /// Standard configuration values
    pub const LOCAL_PORT: u16 = 5000;
    pub const SUBDOMAIN: &'static str = "demo";
    pub const HEALTH_URL: &'static str = "https://demo.ngrok.io/health";
    pub const APP_PID: u32 = 4101;
    pub const TUNNEL_PID: u32 = 4102;

    /// Launch config for mock-driven tests
    ///
    /// Uses an explicit app command so the runtime-dir precondition never
    /// consults the filesystem, and a short health timeout so nothing can
    /// stall a test for long.
    pub fn launch_config() -> LaunchConfig {
        LaunchConfig {
            local_port: Self::LOCAL_PORT,
            tier: EndpointTier::Subdomain(Self::SUBDOMAIN.to_string()),
            runtime_dir: PathBuf::from("venv"),
            app_cmd: Some(PathBuf::from("/usr/bin/python3")),
            app_script: "server.py".to_string(),
            tunnel_cmd: "ngrok".to_string(),
            tunnel_domain: "ngrok.io".to_string(),
            health_url: None,
            health_timeout: Duration::from_secs(2),
            readiness: ReadinessMode::Probe,
            readiness_delay: Duration::from_millis(10),
            confirm: false,
            oneshot: true,
        }
    }

    /// Launch config whose precondition is guaranteed to fail
    pub fn missing_runtime_config() -> LaunchConfig {
        let mut config = Self::launch_config();
        config.app_cmd = None;
        config.runtime_dir = PathBuf::from("definitely-not-a-real-venv-4137");
        config
    }

    pub fn healthy_report() -> HealthReport {
        Self::report(HealthVerdict::Healthy)
    }

    pub fn unhealthy_report(status: u16) -> HealthReport {
        Self::report(HealthVerdict::Unhealthy { status })
    }

    pub fn unreachable_report(reason: &str) -> HealthReport {
        Self::report(HealthVerdict::Unreachable {
            reason: reason.to_string(),
        })
    }

    fn report(verdict: HealthVerdict) -> HealthReport {
        HealthReport {
            url: Self::HEALTH_URL.to_string(),
            verdict,
            latency_ms: 7,
            checked_at: Utc::now(),
        }
    }

    pub fn handle_for(role: ProcessRole) -> ProcessHandle {
        let pid = match role {
            ProcessRole::AppServer => Self::APP_PID,
            ProcessRole::Tunnel => Self::TUNNEL_PID,
        };
        ProcessHandle::new(role, pid)
    }

    /// Write an executable shell script that ignores its arguments and
    /// stays alive, standing in for the app or tunnel binary
    #[cfg(unix)]
    pub fn fake_daemon(dir: &Path, name: &str) -> PathBuf {
        Self::fake_binary(dir, name, "#!/bin/sh\nexec sleep 600\n")
    }

    /// Write an executable shell script that exits on its own after about
    /// a second, standing in for a child that crashes under supervision
    #[cfg(unix)]
    pub fn fake_short_lived(dir: &Path, name: &str) -> PathBuf {
        Self::fake_binary(dir, name, "#!/bin/sh\nsleep 1\nexit 9\n")
    }

    #[cfg(unix)]
    fn fake_binary(dir: &Path, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }
}
