//! The launch orchestrator
//!
//! Drives one run through its phases: start the application and the
//! tunnel client, gate on application readiness, barrier until the
//! tunnel answers, issue the authoritative health check, then supervise
//! the children until shutdown. Generic over the process, readiness, and
//! health seams so the whole sequence is testable with mocks.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::LaunchConfig;
use crate::core::{PhaseMachine, RunOutcome, RunPhase, RunRecord};
use crate::error::{LauncherError, LauncherResult};
use crate::logging;
use crate::services::health::{HealthReport, HealthVerdict};
use crate::services::readiness::ReadinessGate;
use crate::services::tunnel::TunnelConfig;
use crate::traits::{
    HealthCheck, ProcessHandle, ProcessRole, ProcessRunner, ProcessSpec, ProcessState,
    ReadinessProbe,
};

const BARRIER_MAX_BACKOFF: Duration = Duration::from_secs(5);

/// Coordinates one launch run and the supervision that follows it
pub struct Launcher<P, R, H>
where
    P: ProcessRunner,
    R: ReadinessProbe,
    H: HealthCheck,
{
    // Configuration
    config: LaunchConfig,

    // Injected dependencies (mockable for testing)
    runner: P,
    probe: R,
    health: H,

    // Tuning for the readiness gate and tunnel barrier
    readiness_gate: ReadinessGate,
    barrier_attempts: u32,
    barrier_initial_backoff: Duration,
    supervision_interval: Duration,

    // Shutdown signal
    shutdown_tx: mpsc::Sender<()>,
    shutdown_rx: mpsc::Receiver<()>,
}

impl<P, R, H> Launcher<P, R, H>
where
    P: ProcessRunner + Send + Sync + 'static,
    R: ReadinessProbe + Send + Sync + 'static,
    H: HealthCheck + Send + Sync + 'static,
{
    /// Create a launcher with injected dependencies
    pub fn new(config: LaunchConfig, runner: P, probe: R, health: H) -> Self {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        Self {
            config,
            runner,
            probe,
            health,
            readiness_gate: ReadinessGate::default(),
            barrier_attempts: 8,
            barrier_initial_backoff: Duration::from_millis(500),
            supervision_interval: Duration::from_secs(2),
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Configure the readiness gate (fluent API)
    pub fn with_readiness_gate(mut self, gate: ReadinessGate) -> Self {
        self.readiness_gate = gate;
        self
    }

    /// Configure the tunnel barrier (fluent API)
    pub fn with_barrier(mut self, attempts: u32, initial_backoff: Duration) -> Self {
        self.barrier_attempts = attempts;
        self.barrier_initial_backoff = initial_backoff;
        self
    }

    /// Configure the supervision liveness interval (fluent API)
    pub fn with_supervision_interval(mut self, supervision_interval: Duration) -> Self {
        self.supervision_interval = supervision_interval;
        self
    }

    /// Sender for requesting graceful shutdown from outside (signal task)
    pub fn get_shutdown_sender(&self) -> mpsc::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Execute one launch run through all phases
    ///
    /// Failed runs are still `Ok`: the outcome inside the record says what
    /// went wrong and maps to the exit code. `Err` is reserved for internal
    /// faults such as a phase-order violation.
    pub async fn run(&mut self) -> LauncherResult<RunRecord> {
        let run_id = Uuid::new_v4();
        let started_at = chrono::Utc::now();
        let mut phases = PhaseMachine::new();
        let mut handles: Vec<ProcessHandle> = Vec::new();

        logging::log_startup("launcher", &format!("launch run {run_id}"));

        // Precondition: the runtime environment must exist before anything spawns
        if let Err(err) = self.config.validate_runtime_dir() {
            logging::log_error("launcher", "Runtime environment check", &err);
            phases.advance(RunPhase::Done)?;
            return Ok(Self::record(
                run_id,
                started_at,
                handles,
                phases,
                None,
                RunOutcome::PreconditionFailed {
                    reason: err.to_string(),
                },
            ));
        }

        phases.advance(RunPhase::StartingProcesses)?;
        let tunnel = self.tunnel_config();

        let app_spec = match self.app_spec() {
            Ok(spec) => spec,
            Err(err) => return self.fail_launch(run_id, started_at, handles, phases, err).await,
        };
        match self.runner.spawn(app_spec).await {
            Ok(handle) => handles.push(handle),
            Err(err) => return self.fail_launch(run_id, started_at, handles, phases, err).await,
        }
        match self.runner.spawn(tunnel.launch_spec()).await {
            Ok(handle) => handles.push(handle),
            Err(err) => return self.fail_launch(run_id, started_at, handles, phases, err).await,
        }

        phases.advance(RunPhase::AwaitingAppReadiness)?;
        self.readiness_gate.wait_ready(&self.probe).await;
        if let ProcessState::Exited { code } =
            self.runner.state(ProcessRole::AppServer).await?
        {
            let err = LauncherError::ProcessExited {
                role: ProcessRole::AppServer,
                code,
            };
            return self.fail_launch(run_id, started_at, handles, phases, err).await;
        }

        phases.advance(RunPhase::AwaitingTunnel)?;
        self.tunnel_barrier().await;
        if self.config.confirm {
            self.await_operator().await?;
        }

        phases.advance(RunPhase::CheckingHealth)?;
        let report = self.health.check().await;
        self.log_verdict(&report);
        let outcome = RunOutcome::from_verdict(&report.verdict);
        phases.advance(RunPhase::Done)?;

        if !outcome.is_success() {
            // A failed run never leaves children behind
            self.shutdown().await;
        }

        info!("🏁 Run {run_id} finished: {outcome}");
        Ok(Self::record(
            run_id,
            started_at,
            handles,
            phases,
            Some(report),
            outcome,
        ))
    }

    /// Watch the children until one exits or a shutdown signal arrives
    ///
    /// A child exiting on its own is a crash: the remaining children are
    /// stopped and `ProcessExited` is returned for the exit-code mapping.
    pub async fn supervise(&mut self) -> LauncherResult<()> {
        info!("👀 Supervising children (Ctrl+C to stop)");
        let mut liveness = interval(self.supervision_interval);
        liveness.tick().await;

        loop {
            tokio::select! {
                _ = liveness.tick() => {
                    for role in [ProcessRole::AppServer, ProcessRole::Tunnel] {
                        if let ProcessState::Exited { code } = self.runner.state(role).await? {
                            let err = LauncherError::ProcessExited { role, code };
                            logging::log_error("launcher", "Supervision", &err);
                            self.shutdown().await;
                            return Err(err);
                        }
                    }
                },

                Some(_) = self.shutdown_rx.recv() => {
                    logging::log_shutdown("launcher", "shutdown signal received");
                    self.shutdown().await;
                    return Ok(());
                }
            }
        }
    }

    /// Coordinated teardown of everything still running, best effort
    pub async fn shutdown(&self) {
        if let Err(e) = self.runner.shutdown_all().await {
            logging::log_error("launcher", "Child teardown", &e);
        }
    }

    fn tunnel_config(&self) -> TunnelConfig {
        TunnelConfig::new(
            self.config.local_port,
            self.config.tier.clone(),
            self.config.tunnel_cmd.as_str(),
            self.config.tunnel_domain.as_str(),
        )
    }

    fn app_spec(&self) -> LauncherResult<ProcessSpec> {
        let program = self.config.resolve_app_program()?;
        Ok(ProcessSpec::new(ProcessRole::AppServer, program)
            .with_arg(self.config.app_script.as_str()))
    }

    /// Automatic replacement for the old "press a key once the tunnel
    /// looks up" step: retry single health checks with capped attempts
    /// and backoff until one comes back healthy
    async fn tunnel_barrier(&self) -> bool {
        let mut backoff = self.barrier_initial_backoff;

        for attempt in 1..=self.barrier_attempts {
            let report = self.health.check().await;
            if report.is_healthy() {
                info!("✅ Tunnel answering after {attempt} barrier attempt(s)");
                return true;
            }
            debug!(
                "Barrier attempt {attempt}/{}: {} not healthy yet",
                self.barrier_attempts, report.url
            );
            if attempt < self.barrier_attempts {
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(BARRIER_MAX_BACKOFF);
            }
        }

        warn!(
            "⚠️ Tunnel barrier exhausted after {} attempts; proceeding to the authoritative check",
            self.barrier_attempts
        );
        false
    }

    /// Opt-in operator gate: wait for Enter before the authoritative check
    async fn await_operator(&self) -> LauncherResult<()> {
        use tokio::io::{AsyncBufReadExt, BufReader};

        info!("⏸️ Press Enter to run the health check...");
        let mut line = String::new();
        BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
        Ok(())
    }

    /// Verdict-specific logging so the operator knows which side to look at
    fn log_verdict(&self, report: &HealthReport) {
        match &report.verdict {
            HealthVerdict::Healthy => {
                logging::log_success(
                    "launcher",
                    &format!("Health check passed in {} ms: {}", report.latency_ms, report.url),
                );
            }
            HealthVerdict::Unhealthy { status } => {
                warn!(
                    "❌ {} answered {status}; the tunnel works, check the application logs",
                    report.url
                );
            }
            HealthVerdict::Unreachable { reason } => {
                warn!(
                    "❌ could not reach {} ({reason}); check the tunnel client and its session",
                    report.url
                );
            }
        }
    }

    async fn fail_launch(
        &self,
        run_id: Uuid,
        started_at: chrono::DateTime<chrono::Utc>,
        handles: Vec<ProcessHandle>,
        mut phases: PhaseMachine,
        err: LauncherError,
    ) -> LauncherResult<RunRecord> {
        logging::log_error("launcher", "Dependency startup", &err);
        // Anything already started comes down with the failed run
        self.shutdown().await;
        phases.advance(RunPhase::Done)?;
        Ok(Self::record(
            run_id,
            started_at,
            handles,
            phases,
            None,
            RunOutcome::LaunchFailed {
                reason: err.to_string(),
            },
        ))
    }

    fn record(
        run_id: Uuid,
        started_at: chrono::DateTime<chrono::Utc>,
        handles: Vec<ProcessHandle>,
        phases: PhaseMachine,
        health: Option<HealthReport>,
        outcome: RunOutcome,
    ) -> RunRecord {
        RunRecord {
            run_id,
            started_at,
            handles,
            phases: phases.history().to_vec(),
            health,
            outcome,
        }
    }
}
