//! Trait definitions with mockall annotations for testing
//!
//! This module contains the seams the launcher is generic over, with mock
//! generation annotations. These traits are used for dependency injection
//! and enable testing the orchestration sequence without real processes
//! or a real network.

use crate::error::LauncherResult;
use crate::services::health::HealthReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// The two external dependencies a run manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessRole {
    AppServer,
    Tunnel,
}

impl fmt::Display for ProcessRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessRole::AppServer => write!(f, "app-server"),
            ProcessRole::Tunnel => write!(f, "tunnel"),
        }
    }
}

/// Launch description for one child process
///
/// The working directory must exist at spawn time; a missing directory is a
/// launch error, not a silent fallback to the launcher's own directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub role: ProcessRole,
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub env: Vec<(String, String)>,
}

impl ProcessSpec {
    pub fn new(role: ProcessRole, program: impl Into<PathBuf>) -> Self {
        Self {
            role,
            program: program.into(),
            args: Vec::new(),
            working_dir: PathBuf::from("."),
            env: Vec::new(),
        }
    }

    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

/// Handle for a successfully spawned child
///
/// Only a successful spawn produces one; there is no handle for a process
/// that failed to start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessHandle {
    pub role: ProcessRole,
    pub pid: u32,
    pub spawned_at: DateTime<Utc>,
}

impl ProcessHandle {
    pub fn new(role: ProcessRole, pid: u32) -> Self {
        Self {
            role,
            pid,
            spawned_at: Utc::now(),
        }
    }
}

/// Observed lifecycle state of a managed role
///
/// Monotonic: once an exit status has been observed for a role the state
/// never reverts to `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    NotStarted,
    Running,
    Exited { code: Option<i32> },
}

/// Process management abstraction for the launcher's child processes
///
/// Implementations own the children they spawn: output is captured and
/// forwarded, liveness can be queried, and termination is coordinated
/// rather than fire-and-forget.
#[mockall::automock]
#[async_trait::async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Spawn a child process from its launch description
    ///
    /// # Returns
    /// A handle carrying the role, OS pid, and spawn timestamp, or a
    /// launch error naming the role that failed.
    async fn spawn(&self, spec: ProcessSpec) -> LauncherResult<ProcessHandle>;

    /// Query the current lifecycle state of a role
    ///
    /// A role that was never spawned reports `NotStarted`. An observed
    /// exit status is cached, so repeated queries after exit keep
    /// returning the same `Exited` state.
    async fn state(&self, role: ProcessRole) -> LauncherResult<ProcessState>;

    /// Terminate one role's process
    ///
    /// Idempotent: terminating an already-exited or never-started role is
    /// a no-op, not an error.
    async fn terminate(&self, role: ProcessRole) -> LauncherResult<()>;

    /// Coordinated shutdown of every child still running
    ///
    /// Polite termination first (SIGTERM on unix), a bounded grace period,
    /// then a hard kill for anything that ignored it.
    async fn shutdown_all(&self) -> LauncherResult<()>;
}

/// One readiness attempt against the application
///
/// A probe answers "is it up right now"; the retry/backoff loop around it
/// lives in the readiness gate, not in the probe.
#[mockall::automock]
#[async_trait::async_trait]
pub trait ReadinessProbe: Send + Sync {
    /// Perform a single readiness attempt
    async fn probe(&self) -> bool;

    /// Human-readable description of the probe target for log lines
    fn describe(&self) -> String;
}

/// One scripted health check against the public endpoint
///
/// A single bounded-timeout request per call; no internal retries. Retry
/// policy belongs to the caller.
#[mockall::automock]
#[async_trait::async_trait]
pub trait HealthCheck: Send + Sync {
    /// Perform one health check and classify the result
    ///
    /// # Returns
    /// A report whose verdict is always exactly one of healthy, unhealthy
    /// (with status code), or unreachable (with transport error text).
    async fn check(&self) -> HealthReport;
}
