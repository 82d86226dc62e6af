//! Tunnel client launch description and public URL derivation
//!
//! Builds the tunnel client's launch spec from an immutable config and
//! derives the public base / health URLs. No protocol-level verification
//! happens here; the tunnel is consumed purely as a child process plus
//! the URLs it is expected to serve.

use crate::config::EndpointTier;
use crate::error::{LauncherError, LauncherResult};
use crate::traits::{ProcessRole, ProcessSpec};
use url::Url;

/// Immutable description of the tunnel to establish
#[derive(Debug, Clone)]
pub struct TunnelConfig {
    local_port: u16,
    tier: EndpointTier,
    client_cmd: String,
    provider_domain: String,
}

impl TunnelConfig {
    pub fn new(
        local_port: u16,
        tier: EndpointTier,
        client_cmd: impl Into<String>,
        provider_domain: impl Into<String>,
    ) -> Self {
        Self {
            local_port,
            tier,
            client_cmd: client_cmd.into(),
            provider_domain: provider_domain.into(),
        }
    }

    pub fn local_port(&self) -> u16 {
        self.local_port
    }

    /// Launch spec for the tunnel client process
    ///
    /// Argument shape follows the classic tunnel client CLI:
    /// `<cmd> http --subdomain NAME PORT` or `<cmd> http --hostname HOST PORT`.
    pub fn launch_spec(&self) -> ProcessSpec {
        let spec = ProcessSpec::new(ProcessRole::Tunnel, &self.client_cmd).with_arg("http");
        let spec = match &self.tier {
            EndpointTier::Subdomain(name) => spec.with_args(["--subdomain", name.as_str()]),
            EndpointTier::Hostname(host) => spec.with_args(["--hostname", host.as_str()]),
        };
        spec.with_arg(self.local_port.to_string())
    }

    /// Public base URL where the tunnel exposes the application
    pub fn public_base_url(&self) -> LauncherResult<Url> {
        let host = match &self.tier {
            EndpointTier::Subdomain(name) => format!("{name}.{}", self.provider_domain),
            EndpointTier::Hostname(host) => host.clone(),
        };
        Url::parse(&format!("https://{host}/")).map_err(|e| {
            LauncherError::config(format!("cannot derive public URL from '{host}': {e}"))
        })
    }

    /// The health endpoint under the public base URL
    pub fn health_url(&self) -> LauncherResult<Url> {
        let base = self.public_base_url()?;
        base.join("health")
            .map_err(|e| LauncherError::config(format!("cannot derive health URL: {e}")))
    }
}
