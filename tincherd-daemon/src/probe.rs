//! Daemon version probing and old-instance PID lookup.
//!
//! Both probes are best-effort: an unprobeable daemon simply disables the
//! version-gated config features, and a missing PID means no previous
//! instance to warn about. Neither ever aborts the run.

use std::path::Path;
use std::process::Command;

use tincherd_core::version::version_newer_than;
use tincherd_core::LocalSettings;

/// tinc 1.1+ drops the pidfile in favour of the control socket.
const TINCCTL_SINCE: &str = "1.1";

/// Ask the daemon binary for its version string.
///
/// Runs `<binary> --version` and parses the first line, which tinc prints
/// as `tinc version <version> (...)`. Returns `None` when the binary
/// cannot be run or the output is unrecognizable.
pub fn probe_tincd_version(binary: &Path) -> Option<String> {
    let output = match Command::new(binary).arg("--version").output() {
        Ok(output) => output,
        Err(err) => {
            tracing::warn!(binary = %binary.display(), %err, "version probe failed to run");
            return None;
        }
    };
    let stdout = String::from_utf8_lossy(&output.stdout);
    match parse_version_output(&stdout) {
        Some(version) => {
            tracing::debug!(binary = %binary.display(), %version, "probed daemon version");
            Some(version)
        }
        None => {
            tracing::warn!(binary = %binary.display(), "unrecognized version output");
            None
        }
    }
}

pub(crate) fn parse_version_output(output: &str) -> Option<String> {
    let rest = output.lines().next()?.strip_prefix("tinc version ")?;
    let version = rest.split_whitespace().next()?;
    if version.is_empty() {
        None
    } else {
        Some(version.to_string())
    }
}

/// The version the generators should gate on: the explicit override when
/// configured, otherwise a probe of the daemon binary.
pub fn effective_version(settings: &LocalSettings) -> Option<String> {
    if let Some(version) = &settings.tincd_version {
        tracing::debug!(%version, "using configured version override");
        return Some(version.clone());
    }
    probe_tincd_version(&settings.tincd_bin)
}

/// Find the PID of an already-running daemon for this network, if any.
///
/// tinc >= 1.1 is asked over its control interface; older daemons leave a
/// pidfile. Absence is normal on a clean start.
pub fn lookup_daemon_pid(settings: &LocalSettings, version: Option<&str>) -> Option<u32> {
    let use_ctl = version.is_some_and(|v| version_newer_than(v, TINCCTL_SINCE));
    if use_ctl {
        let tincctl = settings.tincctl_bin.as_ref()?;
        let output = Command::new(tincctl)
            .arg(format!("--net={}", settings.networkname))
            .arg("pid")
            .output()
            .ok()?;
        if !output.status.success() {
            tracing::info!("no running daemon reported by control interface");
            return None;
        }
        parse_pid(&String::from_utf8_lossy(&output.stdout))
    } else {
        let contents = match std::fs::read_to_string(&settings.pidfile) {
            Ok(contents) => contents,
            Err(_) => {
                tracing::info!(pidfile = %settings.pidfile.display(), "no pidfile present");
                return None;
            }
        };
        parse_pid(&contents)
    }
}

fn parse_pid(text: &str) -> Option<u32> {
    // Old pidfiles may carry trailing fields after the PID.
    text.split_whitespace().next()?.parse().ok()
}
