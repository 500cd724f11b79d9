//! Full artifact-set synthesis and writing.
//!
//! [`synthesize`] is the pure half: one pass over the registry producing
//! every artifact text. [`write_artifacts`] is the effectful half. The
//! split keeps the failure policy simple — nothing is written until every
//! artifact has been generated completely, and a crash mid-write is
//! repaired by the next run regenerating everything from scratch.

use std::path::Path;

use tincherd_core::{LocalSettings, PeerRegistry};

use crate::error::{io_err, GenError};
use crate::{conf, hosts, subnet, updown, writer};

/// File mode for config and host descriptors.
const MODE_CONFIG: u32 = 0o600;
/// File mode for executable scripts.
const MODE_SCRIPT: u32 = 0o700;
/// Mode for the base and hosts directories.
const MODE_DIR: u32 = 0o700;

/// The complete generated artifact set for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSet {
    /// `tinc.conf` contents.
    pub daemon_conf: String,
    /// `(peer name, contents)` for `hosts/<name>`, in registry order.
    pub hosts: Vec<(String, String)>,
    /// `tinc-up` / `tinc-down` contents.
    pub tinc_up: String,
    pub tinc_down: String,
    /// What to do about `subnet-up` / `subnet-down`.
    pub subnet: SubnetArtifacts,
}

/// Dynamic-route scripts are only materialized in dynamic mode; otherwise
/// the files are removed and an executable `.local` override is linked in
/// their place when present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubnetArtifacts {
    Scripts { up: String, down: String },
    LocalOverride,
}

/// Run all four generators over the registry.
///
/// Pure and deterministic: the same settings, registry and version yield
/// a byte-identical artifact set.
pub fn synthesize(
    settings: &LocalSettings,
    registry: &PeerRegistry,
    version: Option<&str>,
) -> Result<ArtifactSet, GenError> {
    let daemon_conf = conf::generate(settings, registry, version)?;

    let mut host_files = Vec::with_capacity(registry.len());
    for peer in registry {
        // Host files are unconditional; exclusion only shapes ConnectTo.
        host_files.push((peer.name.0.clone(), hosts::generate(peer)?));
    }

    let tinc_up = updown::generate(settings, registry, true)?;
    let tinc_down = updown::generate(settings, registry, false)?;

    let subnet = if settings.use_dynamic_routes {
        SubnetArtifacts::Scripts {
            up: subnet::generate(settings, true)?,
            down: subnet::generate(settings, false)?,
        }
    } else {
        SubnetArtifacts::LocalOverride
    };

    Ok(ArtifactSet {
        daemon_conf,
        hosts: host_files,
        tinc_up,
        tinc_down,
        subnet,
    })
}

/// Write the full artifact set under `base` (normally `/etc/tinc/<net>`).
///
/// Previous artifacts are overwritten unconditionally.
pub fn write_artifacts(base: &Path, artifacts: &ArtifactSet) -> Result<(), GenError> {
    ensure_dir(base)?;
    writer::write_contents(&base.join("tinc.conf"), &artifacts.daemon_conf, MODE_CONFIG)?;

    let hosts_dir = base.join("hosts");
    ensure_dir(&hosts_dir)?;
    for (name, contents) in &artifacts.hosts {
        tracing::debug!(peer = %name, "writing host descriptor");
        writer::write_contents_safe(&hosts_dir, name, contents, MODE_CONFIG)?;
    }

    writer::write_contents(&base.join("tinc-up"), &artifacts.tinc_up, MODE_SCRIPT)?;
    writer::write_contents(&base.join("tinc-down"), &artifacts.tinc_down, MODE_SCRIPT)?;

    match &artifacts.subnet {
        SubnetArtifacts::Scripts { up, down } => {
            writer::write_contents(&base.join("subnet-up"), up, MODE_SCRIPT)?;
            writer::write_contents(&base.join("subnet-down"), down, MODE_SCRIPT)?;
        }
        SubnetArtifacts::LocalOverride => {
            writer::install_local_override(&base.join("subnet-up"))?;
            writer::install_local_override(&base.join("subnet-down"))?;
        }
    }

    tracing::info!(
        base = %base.display(),
        host_count = artifacts.hosts.len(),
        "artifact set written",
    );
    Ok(())
}

fn ensure_dir(path: &Path) -> Result<(), GenError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::create_dir_all(path).map_err(|e| io_err(path, e))?;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(MODE_DIR))
        .map_err(|e| io_err(path, e))
}
