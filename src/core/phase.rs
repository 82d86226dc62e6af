//! Run phase state machine
//!
//! Phases move strictly forward. A repeated or backwards transition is a
//! `PhaseOrder` error; it is never expected at runtime and the guard
//! exists so a refactoring mistake surfaces loudly instead of silently
//! rewinding a run.

use crate::error::{LauncherError, LauncherResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Phases of one launch run, in execution order
///
/// The derived ordering is the transition order; early failures jump
/// straight to `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Idle,
    StartingProcesses,
    AwaitingAppReadiness,
    AwaitingTunnel,
    CheckingHealth,
    Done,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunPhase::Idle => "idle",
            RunPhase::StartingProcesses => "starting-processes",
            RunPhase::AwaitingAppReadiness => "awaiting-app-readiness",
            RunPhase::AwaitingTunnel => "awaiting-tunnel",
            RunPhase::CheckingHealth => "checking-health",
            RunPhase::Done => "done",
        };
        write!(f, "{name}")
    }
}

/// Timestamped record of one phase entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseEntry {
    pub phase: RunPhase,
    pub entered_at: DateTime<Utc>,
}

/// Forward-only phase machine with recorded history
#[derive(Debug, Clone)]
pub struct PhaseMachine {
    current: RunPhase,
    history: Vec<PhaseEntry>,
}

impl PhaseMachine {
    pub fn new() -> Self {
        Self {
            current: RunPhase::Idle,
            history: vec![PhaseEntry {
                phase: RunPhase::Idle,
                entered_at: Utc::now(),
            }],
        }
    }

    pub fn current(&self) -> RunPhase {
        self.current
    }

    pub fn history(&self) -> &[PhaseEntry] {
        &self.history
    }

    /// Advance to a later phase
    ///
    /// Skipping intermediate phases is allowed (early failure jumps to
    /// `Done`); staying put or moving backwards is not.
    pub fn advance(&mut self, to: RunPhase) -> LauncherResult<()> {
        if to <= self.current {
            return Err(LauncherError::PhaseOrder {
                from: self.current,
                to,
            });
        }
        debug!("Phase {} -> {}", self.current, to);
        self.current = to;
        self.history.push(PhaseEntry {
            phase: to,
            entered_at: Utc::now(),
        });
        Ok(())
    }
}

impl Default for PhaseMachine {
    fn default() -> Self {
        Self::new()
    }
}
