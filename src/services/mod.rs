//! Service implementations
//!
//! This module contains the real implementations of the launcher's trait
//! seams, plus the tunnel and readiness building blocks. These are the
//! production implementations that handle actual I/O.

pub mod health;
pub mod process;
pub mod readiness;
pub mod tunnel;

// Re-export the pieces the launcher wires together
pub use health::{HealthReport, HealthVerdict, HttpHealthChecker};
pub use process::RealProcessRunner;
pub use readiness::{FixedDelay, ReadinessGate, TcpReadinessProbe};
pub use tunnel::TunnelConfig;
