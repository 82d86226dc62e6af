//! Launcher-specific error types

use std::path::PathBuf;
use thiserror::Error;

use crate::core::phase::RunPhase;
use crate::traits::ProcessRole;

#[derive(Error, Debug)]
pub enum LauncherError {
    #[error("Runtime environment missing at {path}: {hint}")]
    Precondition { path: PathBuf, hint: String },

    #[error("Failed to launch {role} process: {message}")]
    Launch { role: ProcessRole, message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("{role} process exited unexpectedly (code {code:?})")]
    ProcessExited { role: ProcessRole, code: Option<i32> },

    #[error("Phase ordering violated: {from} -> {to}")]
    PhaseOrder { from: RunPhase, to: RunPhase },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl LauncherError {
    /// Convenience constructor for configuration errors
    pub fn config(message: impl Into<String>) -> Self {
        LauncherError::Config {
            message: message.into(),
        }
    }

    /// Convenience constructor for launch failures
    pub fn launch(role: ProcessRole, message: impl Into<String>) -> Self {
        LauncherError::Launch {
            role,
            message: message.into(),
        }
    }

    /// Convenience constructor for precondition failures
    pub fn precondition(path: impl Into<PathBuf>, hint: impl Into<String>) -> Self {
        LauncherError::Precondition {
            path: path.into(),
            hint: hint.into(),
        }
    }
}

pub type LauncherResult<T> = Result<T, LauncherError>;
