//! Main entry point for the liftoff binary
//!
//! Wires the real service implementations into the launcher, translates
//! the run outcome into the designated exit codes, and handles Ctrl+C.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::signal;
use tracing::info;
use url::Url;

use liftoff::{
    config::{self, EndpointTier, LaunchConfig, ReadinessMode},
    core::exit_code_for_error,
    logging,
    services::{FixedDelay, HttpHealthChecker, RealProcessRunner, TcpReadinessProbe, TunnelConfig},
    HealthCheck, Launcher, LauncherError, LauncherResult, ProcessRunner, ReadinessProbe,
};

/// Launch the application stack and verify it is publicly reachable
#[derive(Parser)]
#[command(name = "liftoff")]
#[command(about = "Starts the app server and tunnel client, then health-checks the public endpoint")]
pub struct Args {
    /// Local port the application listens on
    #[arg(long, default_value_t = config::DEFAULT_LOCAL_PORT)]
    pub local_port: u16,

    /// Expose the app on a named subdomain under the provider domain
    #[arg(long)]
    pub subdomain: Option<String>,

    /// Expose the app on a fixed public hostname
    #[arg(long)]
    pub hostname: Option<String>,

    /// Runtime environment (virtual environment) directory
    #[arg(long, default_value = config::DEFAULT_RUNTIME_DIR)]
    pub runtime_dir: PathBuf,

    /// Explicit command to run the application (skips interpreter resolution)
    #[arg(long)]
    pub app_cmd: Option<PathBuf>,

    /// Application entry script handed to the interpreter
    #[arg(long, default_value = config::DEFAULT_APP_SCRIPT)]
    pub app_script: String,

    /// Tunnel client command
    #[arg(long, default_value = config::DEFAULT_TUNNEL_CMD)]
    pub tunnel_cmd: String,

    /// Provider domain used for subdomain endpoints
    #[arg(long, default_value = config::DEFAULT_TUNNEL_DOMAIN)]
    pub tunnel_domain: String,

    /// Override the health check URL (defaults to the public /health)
    #[arg(long)]
    pub health_url: Option<String>,

    /// Health check timeout in seconds
    #[arg(long, default_value_t = config::DEFAULT_HEALTH_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Readiness strategy: probe (TCP poll) or delay (fixed sleep)
    #[arg(long, default_value = "probe")]
    pub readiness: String,

    /// Fixed readiness delay in seconds (with --readiness delay)
    #[arg(long, default_value_t = config::DEFAULT_READINESS_DELAY_SECS)]
    pub delay_secs: u64,

    /// Wait for Enter before the authoritative health check
    #[arg(long)]
    pub confirm: bool,

    /// Report and tear down instead of supervising (CI mode)
    #[arg(long)]
    pub oneshot: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    logging::init_tracing(Some(&args.log_level));

    let exit_code = match build_and_run(args).await {
        Ok(code) => code,
        Err(err) => {
            logging::log_error("liftoff", "Launcher", &err);
            exit_code_for_error(&err)
        }
    };
    std::process::exit(exit_code);
}

async fn build_and_run(args: Args) -> LauncherResult<i32> {
    let tier = EndpointTier::resolve(args.subdomain, args.hostname)?;
    let readiness = ReadinessMode::parse(&args.readiness)?;
    let health_url = args
        .health_url
        .as_deref()
        .map(Url::parse)
        .transpose()
        .map_err(|e| LauncherError::config(format!("invalid --health-url: {e}")))?;

    let config = LaunchConfig {
        local_port: args.local_port,
        tier,
        runtime_dir: args.runtime_dir,
        app_cmd: args.app_cmd,
        app_script: args.app_script,
        tunnel_cmd: args.tunnel_cmd,
        tunnel_domain: args.tunnel_domain,
        health_url,
        health_timeout: Duration::from_secs(args.timeout_secs),
        readiness,
        readiness_delay: Duration::from_secs(args.delay_secs),
        confirm: args.confirm,
        oneshot: args.oneshot,
    };

    let tunnel = TunnelConfig::new(
        config.local_port,
        config.tier.clone(),
        config.tunnel_cmd.as_str(),
        config.tunnel_domain.as_str(),
    );
    let check_url = match &config.health_url {
        Some(url) => url.clone(),
        None => tunnel.health_url()?,
    };
    info!("🎯 Health check target: {check_url}");

    let checker = HttpHealthChecker::new(check_url, config.health_timeout)?;
    let runner = RealProcessRunner::new();
    let oneshot = config.oneshot;

    match config.readiness {
        ReadinessMode::Probe => {
            let probe = TcpReadinessProbe::new(config.local_port);
            execute(Launcher::new(config, runner, probe, checker), oneshot).await
        }
        ReadinessMode::Delay => {
            let probe = FixedDelay::new(config.readiness_delay);
            execute(Launcher::new(config, runner, probe, checker), oneshot).await
        }
    }
}

async fn execute<P, R, H>(mut launcher: Launcher<P, R, H>, oneshot: bool) -> LauncherResult<i32>
where
    P: ProcessRunner + Send + Sync + 'static,
    R: ReadinessProbe + Send + Sync + 'static,
    H: HealthCheck + Send + Sync + 'static,
{
    // Set up graceful shutdown
    let shutdown_sender = launcher.get_shutdown_sender();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                logging::log_shutdown("liftoff", "Received Ctrl+C signal");
                let _ = shutdown_sender.send(()).await;
            }
            Err(err) => {
                logging::log_error("liftoff", "Signal handling", &err);
            }
        }
    });

    let record = launcher.run().await?;
    match record.to_json() {
        Ok(json) => info!("📋 Run report:\n{json}"),
        Err(err) => logging::log_error("liftoff", "Report rendering", &err),
    }

    let code = record.outcome.exit_code();
    if !record.outcome.is_success() {
        return Ok(code);
    }
    if oneshot {
        launcher.shutdown().await;
        logging::log_success("liftoff", "Oneshot run complete");
        return Ok(code);
    }

    launcher.supervise().await?;
    logging::log_success("liftoff", "Launcher stopped gracefully");
    Ok(0)
}
