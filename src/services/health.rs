//! Scripted HTTP health checking against the public endpoint
//!
//! One bounded-timeout GET per check. The mapping is total: every check
//! produces exactly one verdict, and a verdict is never an `Err`.

use crate::error::LauncherResult;
use crate::traits::HealthCheck;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use url::Url;

/// Classification of one health check
///
/// Mutually exclusive by construction: a transport failure carries the
/// error text and no status code, a non-200 carries its status code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HealthVerdict {
    Healthy,
    Unhealthy { status: u16 },
    Unreachable { reason: String },
}

/// Result of one health check, created fresh per check and never mutated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub url: String,
    pub verdict: HealthVerdict,
    pub latency_ms: u64,
    pub checked_at: DateTime<Utc>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        matches!(self.verdict, HealthVerdict::Healthy)
    }

    /// Status code of the response, absent on transport failure
    pub fn status(&self) -> Option<u16> {
        match &self.verdict {
            HealthVerdict::Healthy => Some(StatusCode::OK.as_u16()),
            HealthVerdict::Unhealthy { status } => Some(*status),
            HealthVerdict::Unreachable { .. } => None,
        }
    }
}

/// Real health checker issuing HTTP GETs with a per-request timeout
pub struct HttpHealthChecker {
    url: Url,
    client: reqwest::Client,
}

impl HttpHealthChecker {
    pub fn new(url: Url, timeout: Duration) -> LauncherResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { url, client })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

/// Exactly 200 counts as healthy; everything else that produced a
/// response is unhealthy with its code.
fn classify_status(status: StatusCode) -> HealthVerdict {
    if status == StatusCode::OK {
        HealthVerdict::Healthy
    } else {
        HealthVerdict::Unhealthy {
            status: status.as_u16(),
        }
    }
}

#[async_trait::async_trait]
impl HealthCheck for HttpHealthChecker {
    async fn check(&self) -> HealthReport {
        let started = Instant::now();
        let outcome = self.client.get(self.url.clone()).send().await;
        let latency_ms = started.elapsed().as_millis() as u64;

        let verdict = match outcome {
            Ok(response) => classify_status(response.status()),
            Err(err) => HealthVerdict::Unreachable {
                reason: err.to_string(),
            },
        };

        HealthReport {
            url: self.url.to_string(),
            verdict,
            latency_ms,
            checked_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_exact_200_is_healthy() {
        assert_eq!(classify_status(StatusCode::OK), HealthVerdict::Healthy);
        assert_eq!(
            classify_status(StatusCode::NO_CONTENT),
            HealthVerdict::Unhealthy { status: 204 }
        );
        assert_eq!(
            classify_status(StatusCode::SERVICE_UNAVAILABLE),
            HealthVerdict::Unhealthy { status: 503 }
        );
        assert_eq!(
            classify_status(StatusCode::NOT_FOUND),
            HealthVerdict::Unhealthy { status: 404 }
        );
    }

    #[test]
    fn test_status_accessor_absent_on_transport_failure() {
        let report = HealthReport {
            url: "https://demo.ngrok.io/health".to_string(),
            verdict: HealthVerdict::Unreachable {
                reason: "connection refused".to_string(),
            },
            latency_ms: 4,
            checked_at: Utc::now(),
        };
        assert_eq!(report.status(), None);
        assert!(!report.is_healthy());
    }

    #[test]
    fn test_report_serializes_with_tagged_verdict() {
        let report = HealthReport {
            url: "https://demo.ngrok.io/health".to_string(),
            verdict: HealthVerdict::Unhealthy { status: 503 },
            latency_ms: 12,
            checked_at: Utc::now(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["verdict"]["kind"], "unhealthy");
        assert_eq!(json["verdict"]["status"], 503);
        assert_eq!(json["url"], "https://demo.ngrok.io/health");
    }
}
