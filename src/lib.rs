//! Readiness-gated local launch orchestration
//!
//! This library starts a long-running application process, exposes it
//! through a tunneling agent, gates each step on readiness, and verifies
//! end-to-end reachability with a scripted health check against the
//! public endpoint. Children are owned: their output flows through the
//! launcher's logs and they are shut down in a coordinated way.

pub mod config;
pub mod core;
pub mod error;
pub mod launcher;
pub mod logging;
pub mod services;
pub mod traits;

// Re-export commonly used types
pub use config::{EndpointTier, LaunchConfig, ReadinessMode};
pub use core::{PhaseMachine, RunOutcome, RunPhase, RunRecord};
pub use error::{LauncherError, LauncherResult};
pub use launcher::Launcher;
pub use services::{
    FixedDelay, HealthReport, HealthVerdict, HttpHealthChecker, ReadinessGate, RealProcessRunner,
    TcpReadinessProbe, TunnelConfig,
};
pub use traits::{
    HealthCheck, MockHealthCheck, MockProcessRunner, MockReadinessProbe, ProcessHandle,
    ProcessRole, ProcessRunner, ProcessSpec, ProcessState, ReadinessProbe,
};
