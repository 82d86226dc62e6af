//! Core run state
//!
//! Pure state with no I/O dependencies: the phase machine and the run
//! record it feeds. Everything here is deterministic and easily testable.

pub mod phase;
pub mod report;

pub use phase::{PhaseEntry, PhaseMachine, RunPhase};
pub use report::{exit_code_for_error, RunOutcome, RunRecord};
