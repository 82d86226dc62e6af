//! Test helpers and builder patterns for launcher tests
//!
//! This module provides a builder over the mocked trait seams to reduce
//! test boilerplate, plus an in-process HTTP stack for tests that need a
//! real endpoint to check against.

use super::fixtures::TestFixtures;
use axum::{http::StatusCode, routing::get, Router};
use liftoff::{
    LaunchConfig, Launcher, MockHealthCheck, MockProcessRunner, MockReadinessProbe, ReadinessGate,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;

/// Type alias for a launcher with all seams mocked
pub type TestLauncher = Launcher<MockProcessRunner, MockReadinessProbe, MockHealthCheck>;

/// Builder pattern for creating test launchers with sensible defaults
pub struct LauncherBuilder {
    config: LaunchConfig,
    runner: MockProcessRunner,
    probe: MockReadinessProbe,
    health: MockHealthCheck,
}

impl LauncherBuilder {
    /// Create a new builder; the mocks start empty and the fallback
    /// behaviors are appended at build time
    pub fn new() -> Self {
        Self {
            config: TestFixtures::launch_config(),
            runner: MockProcessRunner::new(),
            probe: MockReadinessProbe::new(),
            health: MockHealthCheck::new(),
        }
    }

    /// Replace or adjust the launch config
    pub fn with_config<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut LaunchConfig),
    {
        setup(&mut self.config);
        self
    }

    /// Configure the process runner mock with a setup function
    pub fn with_runner<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut MockProcessRunner),
    {
        setup(&mut self.runner);
        self
    }

    /// Configure the readiness probe mock with a setup function
    pub fn with_probe<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut MockReadinessProbe),
    {
        setup(&mut self.probe);
        self
    }

    /// Configure the health check mock with a setup function
    pub fn with_health<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut MockHealthCheck),
    {
        setup(&mut self.health);
        self
    }

    /// Build the launcher with all configured mocks
    ///
    /// Mockall matches calls against expectations in insertion order, so
    /// the fallback behaviors are appended after whatever the test set up
    /// through `with_*`; they only absorb calls the test's own
    /// expectations do not claim.
    ///
    /// Barrier and readiness tuning is shrunk so never-ready scenarios
    /// finish in milliseconds.
    pub fn build(self) -> TestLauncher {
        let Self {
            config,
            mut runner,
            mut probe,
            mut health,
        } = self;

        // Catch-all successful behaviors; per-test expectations are
        // already registered ahead of these
        runner
            .expect_spawn()
            .returning(|spec| Ok(TestFixtures::handle_for(spec.role)))
            .times(0..);
        runner
            .expect_state()
            .returning(|_| Ok(liftoff::ProcessState::Running))
            .times(0..);
        runner.expect_terminate().returning(|_| Ok(())).times(0..);
        runner.expect_shutdown_all().returning(|| Ok(())).times(0..);

        probe
            .expect_describe()
            .returning(|| "test probe".to_string())
            .times(0..);
        probe.expect_probe().returning(|| true).times(0..);

        health
            .expect_check()
            .returning(TestFixtures::healthy_report)
            .times(0..);

        Launcher::new(config, runner, probe, health)
            .with_readiness_gate(ReadinessGate::new(3, Duration::from_millis(1)))
            .with_barrier(2, Duration::from_millis(1))
            .with_supervision_interval(Duration::from_millis(10))
    }
}

impl Default for LauncherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Serve a fixed status on `/health` from an ephemeral local port
///
/// Returns the bound address; the server task runs until the test ends.
pub async fn spawn_health_server(status: StatusCode) -> SocketAddr {
    let app = Router::new().route("/health", get(move || async move { status }));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("health server error: {e}");
        }
    });

    // Give the server a moment to start accepting
    tokio::time::sleep(Duration::from_millis(50)).await;
    addr
}

/// A local port that is guaranteed to refuse connections
pub async fn refused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}
