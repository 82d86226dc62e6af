//! Run records, outcomes, and exit-code mapping
//!
//! A `RunRecord` is what `run()` returns: the run id, everything that was
//! started, the phase history, the final health report, and the outcome.
//! The JSON rendering of the record is the launcher's machine-readable
//! result line.

use crate::core::phase::PhaseEntry;
use crate::error::LauncherError;
use crate::services::health::{HealthReport, HealthVerdict};
use crate::traits::ProcessHandle;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Terminal outcome of one launch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Public endpoint answered 200
    Healthy,
    /// Public endpoint answered, but not with 200
    Unhealthy { status: u16 },
    /// Public endpoint could not be reached at all
    Unreachable { reason: String },
    /// A dependency failed to start
    LaunchFailed { reason: String },
    /// The runtime environment was missing before anything started
    PreconditionFailed { reason: String },
}

impl RunOutcome {
    pub fn from_verdict(verdict: &HealthVerdict) -> Self {
        match verdict {
            HealthVerdict::Healthy => RunOutcome::Healthy,
            HealthVerdict::Unhealthy { status } => RunOutcome::Unhealthy { status: *status },
            HealthVerdict::Unreachable { reason } => RunOutcome::Unreachable {
                reason: reason.clone(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Healthy)
    }

    /// Designated process exit code for this outcome
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Healthy => 0,
            RunOutcome::Unhealthy { .. } => 1,
            RunOutcome::Unreachable { .. } => 2,
            RunOutcome::LaunchFailed { .. } => 3,
            RunOutcome::PreconditionFailed { .. } => 4,
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Healthy => write!(f, "healthy"),
            RunOutcome::Unhealthy { status } => write!(f, "unhealthy (status {status})"),
            RunOutcome::Unreachable { reason } => write!(f, "unreachable ({reason})"),
            RunOutcome::LaunchFailed { reason } => write!(f, "launch failed: {reason}"),
            RunOutcome::PreconditionFailed { reason } => {
                write!(f, "precondition failed: {reason}")
            }
        }
    }
}

/// Exit code for errors surfaced outside a finished run
///
/// Supervision crashes get their own code; configuration problems share
/// the precondition code since both mean "nothing was ever going to
/// start".
pub fn exit_code_for_error(err: &LauncherError) -> i32 {
    match err {
        LauncherError::Precondition { .. } | LauncherError::Config { .. } => 4,
        LauncherError::ProcessExited { .. } => 5,
        LauncherError::Http(_) => 2,
        LauncherError::Launch { .. }
        | LauncherError::PhaseOrder { .. }
        | LauncherError::Io(_) => 3,
    }
}

/// Everything observed about one launch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    /// Unique id for this run
    pub run_id: Uuid,

    /// When the run began
    pub started_at: DateTime<Utc>,

    /// Handles in start order; empty when nothing was spawned
    pub handles: Vec<ProcessHandle>,

    /// Phase history with entry timestamps
    pub phases: Vec<PhaseEntry>,

    /// The authoritative health report, absent when the run died earlier
    pub health: Option<HealthReport>,

    /// Terminal outcome
    pub outcome: RunOutcome,
}

impl RunRecord {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
