//! tincd process supervision.
//!
//! One supervising task owns the child for the whole run. The only
//! asynchronous inputs are OS signals and child death, both delivered as
//! tokio streams, so signal handling never does work in handler context:
//! the run loop performs every state change itself.
//!
//! State machine: `Idle → Starting → Running → Stopping → Stopped`, with
//! the recovery edge `Running → Starting` on unexpected child death. A
//! restart that fails to spawn is fatal — the error propagates out and
//! the agent exits non-zero.

use std::path::PathBuf;
use std::time::Duration;

use nix::sys::signal::{kill, Signal as UnixSignal};
use nix::unistd::Pid;
use tokio::process::{Child, Command};
use tokio::signal::unix::{signal, Signal, SignalKind};

use tincherd_core::LocalSettings;

use crate::error::SupervisorError;

/// Lifecycle state of the supervised daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Idle,
    Starting,
    Running,
    Stopping,
    Stopped,
}

/// What to do with an incoming termination-class signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SignalDisposition {
    /// First signal: begin the shutdown sequence.
    BeginShutdown,
    /// Already stopping: emit the fixed status line, nothing else. A
    /// second interrupt never accelerates the shutdown.
    BePatient,
}

pub(crate) fn shutdown_disposition(state: SupervisorState) -> SignalDisposition {
    match state {
        SupervisorState::Stopping | SupervisorState::Stopped => SignalDisposition::BePatient,
        _ => SignalDisposition::BeginShutdown,
    }
}

enum RunEvent {
    ChildExited(std::process::ExitStatus),
    Shutdown(&'static str),
}

enum StopEvent {
    Exited(std::process::ExitStatus),
    Interrupt,
    GraceExpired,
}

/// Supervises one tincd instance for the lifetime of the run. The record
/// survives restarts: an unexpected death replaces the child process but
/// reuses this same supervisor.
pub struct Supervisor {
    binary: PathBuf,
    networkname: String,
    restart_delay: Duration,
    grace: Duration,
    state: SupervisorState,
    child: Option<Child>,
}

impl Supervisor {
    pub fn new(
        binary: PathBuf,
        networkname: String,
        restart_delay: Duration,
        grace: Duration,
    ) -> Self {
        Self {
            binary,
            networkname,
            restart_delay,
            grace,
            state: SupervisorState::Idle,
            child: None,
        }
    }

    pub fn from_settings(settings: &LocalSettings) -> Self {
        Self::new(
            settings.tincd_bin.clone(),
            settings.networkname.clone(),
            Duration::from_secs(settings.restart_delay),
            Duration::from_secs(settings.stop_grace),
        )
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    /// Current child PID, if a child is alive.
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(Child::id)
    }

    /// Fixed argument vector: network-name flag plus foreground flag, so
    /// the child stays our direct waitable child.
    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("-n").arg(&self.networkname).arg("-D");
        cmd
    }

    /// Spawn the daemon. Valid from `Idle` (first start) and `Stopping`
    /// (unused in practice, but the edge exists).
    pub fn start(&mut self) -> Result<(), SupervisorError> {
        self.state = SupervisorState::Starting;
        match self.build_command().spawn() {
            Ok(child) => {
                tracing::info!(pid = ?child.id(), binary = %self.binary.display(), "tincd started");
                self.child = Some(child);
                self.state = SupervisorState::Running;
                Ok(())
            }
            Err(source) => {
                self.state = SupervisorState::Idle;
                Err(SupervisorError::Spawn {
                    binary: self.binary.clone(),
                    source,
                })
            }
        }
    }

    /// Recovery edge: the child died while Running. Wait out the restart
    /// delay, then respawn once. A failed respawn is fatal. Only spawns
    /// the new process and updates the child field; no other state.
    pub async fn handle_unexpected_exit(&mut self) -> Result<(), SupervisorError> {
        tracing::warn!(
            delay_secs = self.restart_delay.as_secs(),
            "tincd terminated unexpectedly; restarting after delay",
        );
        self.child = None;
        if !self.restart_delay.is_zero() {
            tokio::time::sleep(self.restart_delay).await;
        }
        self.state = SupervisorState::Starting;
        match self.build_command().spawn() {
            Ok(child) => {
                tracing::info!(pid = ?child.id(), "tincd restarted");
                self.child = Some(child);
                self.state = SupervisorState::Running;
                Ok(())
            }
            Err(source) => {
                self.state = SupervisorState::Stopped;
                Err(SupervisorError::RestartFailed {
                    binary: self.binary.clone(),
                    source,
                })
            }
        }
    }

    /// Run until a termination signal arrives, then drive the bounded
    /// graceful shutdown. This is the whole main loop: after launch the
    /// supervisor does nothing but wait.
    pub async fn run(&mut self) -> Result<(), SupervisorError> {
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        if self.child.is_none() {
            self.start()?;
        }

        loop {
            let child = match self.child.as_mut() {
                Some(child) => child,
                None => return Err(SupervisorError::NotRunning),
            };

            // Resolve the select to a plain event first so the child
            // borrow is released before any state change.
            let event = tokio::select! {
                status = child.wait() => RunEvent::ChildExited(status?),
                _ = sigterm.recv() => RunEvent::Shutdown("termination signal"),
                _ = sigint.recv() => RunEvent::Shutdown("interrupt"),
            };

            match event {
                RunEvent::ChildExited(status) => {
                    tracing::warn!(%status, "tincd exited");
                    self.handle_unexpected_exit().await?;
                }
                RunEvent::Shutdown(what) => {
                    tracing::info!("{what} received, shutting down tincd");
                    break;
                }
            }
        }

        self.state = SupervisorState::Stopping;
        self.stop(&mut sigint).await
    }

    /// Graceful stop: SIGTERM, wait up to the grace window, escalate to
    /// SIGKILL. The grace window is a hard upper bound on shutdown
    /// latency. Interrupts arriving meanwhile only produce a status
    /// line; termination signals are ignored entirely.
    pub async fn stop(&mut self, sigint: &mut Signal) -> Result<(), SupervisorError> {
        let Some(mut child) = self.child.take() else {
            self.state = SupervisorState::Stopped;
            return Ok(());
        };

        if let Some(pid) = child.id() {
            kill(Pid::from_raw(pid as i32), UnixSignal::SIGTERM)?;
        }

        let grace = tokio::time::sleep(self.grace);
        tokio::pin!(grace);

        loop {
            let event = tokio::select! {
                status = child.wait() => StopEvent::Exited(status?),
                _ = sigint.recv() => StopEvent::Interrupt,
                _ = &mut grace => StopEvent::GraceExpired,
            };

            match event {
                StopEvent::Exited(status) => {
                    tracing::info!(%status, "tincd stopped");
                    break;
                }
                StopEvent::Interrupt => {
                    debug_assert_eq!(
                        shutdown_disposition(self.state),
                        SignalDisposition::BePatient,
                    );
                    eprintln!("I'm doing my best, please be patient for a little, will ya?");
                }
                StopEvent::GraceExpired => {
                    tracing::warn!(
                        grace_secs = self.grace.as_secs(),
                        "tincd did not stop within the grace period, killing",
                    );
                    child.kill().await?;
                    break;
                }
            }
        }

        self.state = SupervisorState::Stopped;
        Ok(())
    }
}

/// Start the supervisor and block the current thread until shutdown.
pub fn run_blocking(settings: &LocalSettings) -> Result<(), SupervisorError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let mut supervisor = Supervisor::from_settings(settings);
    runtime.block_on(supervisor.run())
}

/// Invoke the generated tinc-down script after the daemon has stopped,
/// when the `run_ifdown` policy asks for it. Routes added by tinc-up
/// would otherwise outlive the mesh.
pub fn invoke_ifdown(settings: &LocalSettings) -> Result<(), SupervisorError> {
    if !settings.run_ifdown {
        return Ok(());
    }
    let path = settings.network_base().join("tinc-down");
    tracing::debug!(path = %path.display(), "invoking tinc-down");
    let status = std::process::Command::new(&path).status()?;
    if status.success() {
        Ok(())
    } else {
        Err(SupervisorError::IfdownFailed {
            path,
            status: status.code().unwrap_or(-1),
        })
    }
}
