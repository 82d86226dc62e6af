//! Readiness gating for the application phase
//!
//! The gate loops single probe attempts with bounded retries and
//! exponential backoff. It never fails the run: exhaustion is logged and
//! the orchestration proceeds, leaving the health check as the authority
//! on actual failure.

use crate::traits::ReadinessProbe;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

/// Poll the application's local TCP port until it accepts connections
pub struct TcpReadinessProbe {
    addr: String,
    connect_timeout: Duration,
}

impl TcpReadinessProbe {
    pub fn new(port: u16) -> Self {
        Self {
            addr: format!("127.0.0.1:{port}"),
            connect_timeout: Duration::from_secs(1),
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

#[async_trait::async_trait]
impl ReadinessProbe for TcpReadinessProbe {
    async fn probe(&self) -> bool {
        matches!(
            tokio::time::timeout(self.connect_timeout, TcpStream::connect(&self.addr)).await,
            Ok(Ok(_))
        )
    }

    fn describe(&self) -> String {
        format!("tcp connect to {}", self.addr)
    }
}

/// The baseline strategy: sleep a fixed duration, then report ready
///
/// Kept for operators who know their app's startup time; it cannot fail.
pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait::async_trait]
impl ReadinessProbe for FixedDelay {
    async fn probe(&self) -> bool {
        tokio::time::sleep(self.delay).await;
        true
    }

    fn describe(&self) -> String {
        format!("fixed {:?} delay", self.delay)
    }
}

/// Bounded retry loop around a readiness probe
pub struct ReadinessGate {
    max_attempts: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl ReadinessGate {
    pub fn new(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            max_attempts,
            initial_backoff,
            max_backoff: Duration::from_secs(5),
        }
    }

    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    /// Loop probe attempts until one reports ready or attempts run out
    ///
    /// Returns whether readiness was confirmed. Callers proceed either
    /// way; an unconfirmed gate is a warning, not an error.
    pub async fn wait_ready<P: ReadinessProbe + ?Sized>(&self, probe: &P) -> bool {
        let target = probe.describe();
        let mut backoff = self.initial_backoff;

        for attempt in 1..=self.max_attempts {
            if probe.probe().await {
                info!("✅ Ready after {attempt} attempt(s): {target}");
                return true;
            }
            debug!(
                "Not ready yet ({target}), attempt {attempt}/{}",
                self.max_attempts
            );
            if attempt < self.max_attempts {
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(self.max_backoff);
            }
        }

        warn!(
            "⚠️ Readiness not confirmed after {} attempts ({target}); proceeding anyway",
            self.max_attempts
        );
        false
    }
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new(10, Duration::from_millis(250))
    }
}
