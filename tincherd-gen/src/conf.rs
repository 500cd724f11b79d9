//! Global daemon config (`tinc.conf`) generation.
//!
//! The interesting part is `ConnectTo=` emission, which encodes the
//! topology policy: silent nodes dial nobody, excluded and hidden peers
//! are never dialed, and on new-enough daemons the primary-only policy
//! keeps the TCP connection count down and lets peer-to-peer routing do
//! the rest.

use std::fmt::Write;

use tincherd_core::registry::require_local_peer;
use tincherd_core::version::version_newer_than;
use tincherd_core::{LocalSettings, PeerRegistry};

use crate::error::GenError;
use crate::{GENERATED_HEADER, STRICT_SUBNETS_SINCE};

/// Generate the contents of `tinc.conf`.
///
/// `version` is the effective daemon version; `None` means "unknown", and
/// every version-gated feature takes the conservative branch.
pub fn generate(
    settings: &LocalSettings,
    registry: &PeerRegistry,
    version: Option<&str>,
) -> Result<String, GenError> {
    let local = require_local_peer(registry, &settings.peerid)?;
    let strict_subnets = version
        .map(|v| version_newer_than(v, STRICT_SUBNETS_SINCE))
        .unwrap_or(false);

    let mut out = String::new();
    out.push_str(GENERATED_HEADER);
    out.push_str("AddressFamily=ipv4\n");

    if !settings.tincd_interface.is_empty() {
        writeln!(out, "Interface={}", settings.tincd_interface)?;
    }
    if !settings.tincd_device.is_empty() {
        writeln!(out, "Device={}", settings.tincd_device)?;
    }

    out.push_str("Mode=router\n");
    writeln!(out, "Name={}", settings.peerid)?;
    out.push_str("Hostnames=no\n");
    out.push_str("PingTimeout=60\n");

    if strict_subnets {
        // Only available since 1.0.12+git / 1.0.13.
        out.push_str("StrictSubnets=yes\n");
    } else {
        out.push_str("TunnelServer=yes\n");
    }

    if !settings.tincd_graphdumpfile.is_empty() {
        writeln!(out, "GraphDumpFile={}", settings.tincd_graphdumpfile)?;
    }

    if !settings.vpn_ip.is_empty()
        && settings.vpn_ip != "127.0.0.1"
        && settings.vpn_ip != "0.0.0.0"
    {
        writeln!(out, "BindToAddress={}", settings.vpn_ip)?;
    }

    if local.silent {
        // Silent nodes only accept inbound connections.
        return Ok(out);
    }

    for peer in registry {
        if peer.name.0 == settings.peerid {
            continue;
        }
        if settings.exclude.contains(&peer.name.0) {
            continue;
        }
        if settings.connect_only_to_primary_nodes && strict_subnets && !peer.primary {
            // Old nodes with TunnelServer=yes don't cope with a sparse
            // dial graph, so the policy only applies on strict-subnet
            // daemons.
            continue;
        }
        if !peer.gatewayhost.is_empty() && !peer.hidden {
            writeln!(out, "ConnectTo={}", peer.name)?;
        }
    }

    Ok(out)
}
