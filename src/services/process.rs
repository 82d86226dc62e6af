//! Real process management for the launcher's children
//!
//! Children are owned rather than detached: stdout/stderr are piped and
//! forwarded into the launcher's own log stream, liveness is observable,
//! and termination is SIGTERM-first with a bounded grace period before a
//! hard kill.

use async_trait::async_trait;
use std::collections::HashMap;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{LauncherError, LauncherResult};
use crate::traits::{ProcessHandle, ProcessRole, ProcessRunner, ProcessSpec, ProcessState};

/// One managed child plus the last state observed about it
///
/// The state is monotonic: once an exit is recorded here it is never
/// queried again, so repeated state reads after exit stay stable.
struct ManagedChild {
    child: Child,
    last_state: ProcessState,
}

impl ManagedChild {
    fn refresh(&mut self) -> ProcessState {
        if let ProcessState::Exited { .. } = self.last_state {
            return self.last_state;
        }
        self.last_state = match self.child.try_wait() {
            Ok(None) => ProcessState::Running,
            Ok(Some(status)) => ProcessState::Exited {
                code: status.code(),
            },
            // Error checking status: treat the child as gone
            Err(_) => ProcessState::Exited { code: None },
        };
        self.last_state
    }
}

/// Real process runner implementation
pub struct RealProcessRunner {
    /// Active children, one per role
    children: Mutex<HashMap<ProcessRole, ManagedChild>>,

    /// How long a child gets to react to polite termination
    grace_period: Duration,

    /// Forward child output into the launcher's log stream
    forward_output: bool,
}

impl RealProcessRunner {
    pub fn new() -> Self {
        Self {
            children: Mutex::new(HashMap::new()),
            grace_period: Duration::from_secs(2),
            forward_output: true,
        }
    }

    /// Configure the termination grace period (fluent API)
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Configure output forwarding (fluent API)
    pub fn with_output_forwarding(mut self, forward_output: bool) -> Self {
        self.forward_output = forward_output;
        self
    }

    /// Spawn tasks that drain piped output into tracing
    ///
    /// Draining also prevents children from blocking on full pipes.
    fn forward_child_output(child: &mut Child, role: ProcessRole) {
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    info!("[{role}] {line}");
                }
            });
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    warn!("[{role}] {line}");
                }
            });
        }
    }

    #[cfg(unix)]
    fn send_sigterm(child: &Child) {
        use nix::sys::signal::{self, Signal};
        use nix::unistd::Pid;

        if let Some(pid) = child.id() {
            match signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
                Ok(()) => debug!("📤 Sent SIGTERM to process {pid}"),
                Err(e) => warn!("⚠️ Failed to send SIGTERM to process {pid}: {e}"),
            }
        }
    }

    /// Polite termination first, bounded grace, then hard kill
    async fn stop_child(managed: &mut ManagedChild, role: ProcessRole, grace_period: Duration) {
        #[cfg(unix)]
        Self::send_sigterm(&managed.child);

        let deadline = Instant::now() + grace_period;
        while Instant::now() < deadline {
            if let Ok(Some(status)) = managed.child.try_wait() {
                managed.last_state = ProcessState::Exited {
                    code: status.code(),
                };
                debug!("✅ {role} terminated gracefully");
                return;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        warn!("🔨 {role} still running after grace period, force killing");
        let _ = managed.child.kill().await;
        let code = match managed.child.try_wait() {
            Ok(Some(status)) => status.code(),
            _ => None,
        };
        managed.last_state = ProcessState::Exited { code };
    }
}

impl Default for RealProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessRunner for RealProcessRunner {
    async fn spawn(&self, spec: ProcessSpec) -> LauncherResult<ProcessHandle> {
        if !spec.working_dir.is_dir() {
            return Err(LauncherError::launch(
                spec.role,
                format!(
                    "working directory {} does not exist",
                    spec.working_dir.display()
                ),
            ));
        }

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .current_dir(&spec.working_dir)
            .stdin(Stdio::null());
        for (key, value) in &spec.env {
            cmd.env(key, value);
        }
        if self.forward_output {
            cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        } else {
            cmd.stdout(Stdio::null()).stderr(Stdio::null());
        }

        let mut child = cmd.spawn().map_err(|e| {
            LauncherError::launch(
                spec.role,
                format!("failed to spawn {}: {e}", spec.program.display()),
            )
        })?;

        let pid = child.id().unwrap_or(0);
        if self.forward_output {
            Self::forward_child_output(&mut child, spec.role);
        }

        let handle = ProcessHandle::new(spec.role, pid);

        {
            let mut children = self.children.lock().await;
            children.insert(
                spec.role,
                ManagedChild {
                    child,
                    last_state: ProcessState::Running,
                },
            );
        }

        info!(
            "🚀 Spawned {} (PID {pid}): {} {}",
            spec.role,
            spec.program.display(),
            spec.args.join(" ")
        );
        Ok(handle)
    }

    async fn state(&self, role: ProcessRole) -> LauncherResult<ProcessState> {
        let mut children = self.children.lock().await;
        Ok(match children.get_mut(&role) {
            Some(managed) => managed.refresh(),
            None => ProcessState::NotStarted,
        })
    }

    async fn terminate(&self, role: ProcessRole) -> LauncherResult<()> {
        let mut children = self.children.lock().await;
        if let Some(managed) = children.get_mut(&role) {
            if managed.refresh() == ProcessState::Running {
                info!("🛑 Stopping {role}");
                Self::stop_child(managed, role, self.grace_period).await;
            }
        }
        Ok(())
    }

    async fn shutdown_all(&self) -> LauncherResult<()> {
        // Tunnel first so a half-shut stack is never publicly exposed
        self.terminate(ProcessRole::Tunnel).await?;
        self.terminate(ProcessRole::AppServer).await?;
        debug!("🛑 All managed processes stopped");
        Ok(())
    }
}

impl Drop for RealProcessRunner {
    fn drop(&mut self) {
        // Emergency cleanup for children that were never terminated
        if let Ok(mut children) = self.children.try_lock() {
            for (role, managed) in children.iter_mut() {
                if managed.last_state == ProcessState::Running {
                    warn!("🚨 Emergency cleanup: force killing {role}");
                    let _ = managed.child.start_kill();
                }
            }
        }
    }
}
