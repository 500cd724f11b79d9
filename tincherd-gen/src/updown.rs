//! `tinc-up` / `tinc-down` script generation.
//!
//! One generator, parameterized by direction. The scripts configure the
//! interface (up only), then add or remove one route per peer subnet —
//! unless dynamic routes are active, in which case routing is left to the
//! subnet event scripts. A `$0.local` hook lets sites append their own
//! logic without touching generated files.

use std::fmt::Write;

use tincherd_core::settings::apply_route_template;
use tincherd_core::{LocalSettings, PeerRegistry};

use crate::error::GenError;
use crate::{strip_weight, GENERATED_HEADER};

/// Generate the contents of `tinc-up` (`up == true`) or `tinc-down`.
pub fn generate(
    settings: &LocalSettings,
    registry: &PeerRegistry,
    up: bool,
) -> Result<String, GenError> {
    let mut out = String::new();
    out.push_str("#!/bin/sh\n");
    out.push_str(GENERATED_HEADER);

    if up {
        if !settings.ifconfig.is_empty() && !settings.vpn_ip.is_empty() {
            writeln!(out, "{}", settings.ifconfig)?;
        }
        if !settings.ifconfig6.is_empty() && !settings.vpn_ip6.is_empty() {
            writeln!(out, "{}", settings.ifconfig6)?;
        }
        out.push('\n');
    }

    if !settings.use_dynamic_routes {
        // Static routing: the whole route table is built at bring-up and
        // torn down symmetrically.
        let routecmd = if up { &settings.routeadd } else { &settings.routedel };
        let routecmd6 = if up { &settings.routeadd6 } else { &settings.routedel6 };

        for peer in registry {
            if peer.name.0 == settings.peerid {
                continue;
            }
            if settings.exclude.contains(&peer.name.0) {
                writeln!(out, "# excluded node: {}", peer.name)?;
                continue;
            }
            writeln!(out, "# node: {}", peer.name)?;

            if !settings.vpn_ip.is_empty() && !routecmd.is_empty() {
                for subnet in &peer.subnets {
                    writeln!(out, "{}", apply_route_template(routecmd, strip_weight(subnet)))?;
                }
            }
            if !settings.vpn_ip6.is_empty() && !routecmd6.is_empty() {
                for subnet in &peer.subnets6 {
                    writeln!(out, "{}", apply_route_template(routecmd6, strip_weight(subnet)))?;
                }
            }
        }
    }

    out.push('\n');
    if up && !settings.postup.is_empty() {
        out.push_str(&settings.postup);
        out.push_str("\n\n");
    }

    out.push_str("[ -x \"$0.local\" ] && \"$0.local\" \"$@\"\n");
    out.push_str("\nexit 0\n");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tincherd_core::types::{ExclusionSet, PeerDescriptor, PeerName};

    fn peer(name: &str, subnets: &[&str], subnets6: &[&str]) -> PeerDescriptor {
        PeerDescriptor {
            name: PeerName::from(name),
            subnets: subnets.iter().map(|s| s.to_string()).collect(),
            subnets6: subnets6.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn registry() -> PeerRegistry {
        let mut reg = PeerRegistry::new();
        reg.push(peer("bob", &["10.0.2.0/24"], &[])).expect("bob");
        reg.push(peer("alice", &["10.0.1.0/24", "10.0.7.0/24#500"], &["fd23:42:1::/48"]))
            .expect("alice");
        reg.push(peer("carol", &["10.0.3.0/24"], &[])).expect("carol");
        reg
    }

    fn routed_settings() -> LocalSettings {
        LocalSettings {
            peerid: "bob".to_string(),
            networkname: "chaos".to_string(),
            vpn_ip: "10.0.2.1".to_string(),
            vpn_ip6: "fd23:42:2::1".to_string(),
            ifconfig: "/sbin/ifconfig $INTERFACE 10.0.2.1 netmask 255.0.0.0".to_string(),
            ifconfig6: "/sbin/ifconfig $INTERFACE add fd23:42:2::1/48".to_string(),
            routeadd: "/sbin/ip route add {subnet} dev $INTERFACE".to_string(),
            routedel: "/sbin/ip route del {subnet} dev $INTERFACE".to_string(),
            routeadd6: "/sbin/ip -6 route add {subnet} dev $INTERFACE".to_string(),
            routedel6: "/sbin/ip -6 route del {subnet} dev $INTERFACE".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn up_script_configures_interface_and_routes() {
        let script = generate(&routed_settings(), &registry(), true).expect("generate");
        assert!(script.starts_with("#!/bin/sh\n"));
        assert!(script.contains("/sbin/ifconfig $INTERFACE 10.0.2.1"));
        assert!(script.contains("/sbin/ifconfig $INTERFACE add fd23:42:2::1/48"));
        assert!(script.contains("# node: alice\n"));
        assert!(script.contains("/sbin/ip route add 10.0.1.0/24 dev $INTERFACE\n"));
        assert!(script.contains("/sbin/ip -6 route add fd23:42:1::/48 dev $INTERFACE\n"));
        assert!(script.ends_with("exit 0\n"));
    }

    #[test]
    fn down_script_uses_delete_templates_and_no_ifconfig() {
        let script = generate(&routed_settings(), &registry(), false).expect("generate");
        assert!(!script.contains("ifconfig"));
        assert!(script.contains("/sbin/ip route del 10.0.1.0/24 dev $INTERFACE\n"));
        assert!(!script.contains("route add"));
    }

    #[test]
    fn weight_suffix_is_stripped_from_route_commands() {
        let script = generate(&routed_settings(), &registry(), true).expect("generate");
        assert!(script.contains("/sbin/ip route add 10.0.7.0/24 dev $INTERFACE\n"));
        assert!(!script.contains("10.0.7.0/24#500"));
    }

    #[test]
    fn local_peer_gets_no_route_block() {
        let script = generate(&routed_settings(), &registry(), true).expect("generate");
        assert!(!script.contains("# node: bob"));
        assert!(!script.contains("10.0.2.0/24"));
    }

    #[test]
    fn excluded_peer_becomes_comment_only() {
        let mut settings = routed_settings();
        settings.exclude = ExclusionSet::new(vec!["CAROL".to_string()]);
        let script = generate(&settings, &registry(), true).expect("generate");
        assert!(script.contains("# excluded node: carol\n"));
        assert!(!script.contains("10.0.3.0/24"));
    }

    #[test]
    fn unconfigured_family_emits_no_routes() {
        let mut settings = routed_settings();
        settings.vpn_ip6 = String::new();
        let script = generate(&settings, &registry(), true).expect("generate");
        assert!(!script.contains("fd23:42:1::/48"));
        assert!(script.contains("10.0.1.0/24"), "v4 routes unaffected");

        settings.vpn_ip6 = "fd23:42:2::1".to_string();
        settings.routeadd6 = String::new();
        let script = generate(&settings, &registry(), true).expect("generate");
        assert!(!script.contains("fd23:42:1::/48"), "empty template disables the family");
    }

    #[test]
    fn dynamic_routes_suppress_the_route_table() {
        let mut settings = routed_settings();
        settings.use_dynamic_routes = true;
        let script = generate(&settings, &registry(), true).expect("generate");
        assert!(!script.contains("# node:"));
        assert!(!script.contains("route add"));
        assert!(script.contains("[ -x \"$0.local\" ] && \"$0.local\" \"$@\"\n"));
    }

    #[test]
    fn postup_precedes_the_hook_and_only_on_up() {
        let mut settings = routed_settings();
        settings.postup = "echo mesh is up | mail -s up root".to_string();
        let up = generate(&settings, &registry(), true).expect("up");
        let post = up.find("echo mesh is up").expect("postup");
        let hook = up.find("$0.local").expect("hook");
        assert!(post < hook);

        let down = generate(&settings, &registry(), false).expect("down");
        assert!(!down.contains("echo mesh is up"));
    }
}
