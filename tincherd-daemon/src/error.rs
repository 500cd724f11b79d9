//! Error types for tincherd-daemon.

use std::path::PathBuf;

use thiserror::Error;

/// Error surface for supervision, probing, and preflight checks.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The daemon binary could not be spawned on first start.
    #[error("unable to spawn {binary}: {source}")]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A restart attempt after an unexpected death failed. Fatal: the
    /// whole agent exits non-zero, no further retries.
    #[error("unable to restart {binary}: {source}")]
    RestartFailed {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Signal stream setup or child wait failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Sending a signal to the supervised child failed.
    #[error("unable to signal child: {0}")]
    Kill(#[from] nix::Error),

    /// `run()` was entered without a live child and `start()` failed to
    /// produce one.
    #[error("no supervised child process")]
    NotRunning,

    /// TUN device node missing; tincd cannot run without it.
    #[error("TUN device missing at {path}")]
    TunDeviceMissing { path: PathBuf },

    /// The agent manages system config and processes; it must run as root.
    #[error("must be started as root")]
    NotRoot,

    /// The tinc-down hook exited non-zero during shutdown.
    #[error("{path} failed with status {status}")]
    IfdownFailed { path: PathBuf, status: i32 },
}
