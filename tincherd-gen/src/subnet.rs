//! `subnet-up` / `subnet-down` script generation (dynamic routes mode).
//!
//! tincd invokes these with the event in environment variables: `$NODE`
//! is the announcing peer, `$SUBNET` the affected subnet. The generated
//! script classifies the subnet by address family, applies the matching
//! route template, and reports every decision through `logger(1)`. When
//! dynamic routes are off the script is not generated at all — the
//! pipeline removes it or symlinks a site-local override in its place.

use std::fmt::Write;

use tincherd_core::settings::apply_route_template;
use tincherd_core::LocalSettings;

use crate::error::GenError;
use crate::GENERATED_HEADER;

/// Shell pattern for a v4 CIDR: four dot-separated decimal groups plus a
/// decimal prefix.
const V4_PATTERN: &str = r"^[0-9]\+\.[0-9]\+\.[0-9]\+\.[0-9]\+/[0-9]\+$";
/// Shell pattern for a fully-expanded v6 CIDR: eight colon-separated hex
/// groups plus a decimal prefix (matched case-insensitively).
const V6_PATTERN: &str = r"^[0-9a-f]\+:[0-9a-f]\+:[0-9a-f]\+:[0-9a-f]\+:[0-9a-f]\+:[0-9a-f]\+:[0-9a-f]\+:[0-9a-f]\+/[0-9]\+$";

const HOOK_LINE: &str = "[ -x \"$0.local\" ] && \"$0.local\" \"$@\"\n";

/// Generate `subnet-up` (`up == true`) or `subnet-down`.
///
/// Only meaningful when `use_dynamic_routes` is active; the pipeline is
/// responsible for not calling this otherwise.
pub fn generate(settings: &LocalSettings, up: bool) -> Result<String, GenError> {
    let event = if up { "subnet-up" } else { "subnet-down" };
    let routecmd = if up { &settings.routeadd } else { &settings.routedel };
    let routecmd6 = if up { &settings.routeadd6 } else { &settings.routedel6 };

    let mut out = String::new();
    out.push_str("#!/bin/sh\n");
    out.push_str(GENERATED_HEADER);

    // Our own announcements never touch the local route table.
    writeln!(out, "[ \"$NODE\" = '{}' ] && exit 0\n", settings.peerid)?;

    if !settings.exclude.is_empty() {
        out.push_str("excluded=\"\"\n");
        for name in settings.exclude.iter() {
            writeln!(out, "[ \"$NODE\" = '{name}' ] && excluded=1")?;
        }
        out.push_str("if [ -n \"$excluded\" ] ; then\n");
        out.push('\t');
        out.push_str(&logger_line(event, "ignore", " (excluded)"));
        out.push('\t');
        out.push_str(HOOK_LINE);
        out.push_str("\texit 0\n");
        out.push_str("fi\n\n");
    }

    family_block(
        &mut out,
        event,
        "ipv4",
        &format!("if echo \"$SUBNET\" | grep -q '{V4_PATTERN}' ; then\n"),
        routed(&settings.vpn_ip, routecmd),
    )?;
    family_block(
        &mut out,
        event,
        "ipv6",
        &format!("if echo \"$SUBNET\" | grep -q -i '{V6_PATTERN}' ; then\n"),
        routed(&settings.vpn_ip6, routecmd6),
    )?;

    // Catch-all: a subnet shape we don't understand is logged, handed to
    // the hook, and otherwise ignored.
    out.push_str(&logger_line(event, "unknown", " (ignored)"));
    out.push_str(HOOK_LINE);
    out.push_str("exit 0\n");

    Ok(out)
}

fn routed<'a>(local_addr: &str, template: &'a str) -> Option<&'a str> {
    if !local_addr.is_empty() && !template.is_empty() {
        Some(template)
    } else {
        None
    }
}

fn family_block(
    out: &mut String,
    event: &str,
    family: &str,
    guard: &str,
    template: Option<&str>,
) -> Result<(), GenError> {
    out.push_str(guard);
    match template {
        Some(template) => {
            out.push('\t');
            out.push_str(&logger_line(event, family, ""));
            out.push('\t');
            writeln!(out, "{}", apply_route_template(template, "$SUBNET"))?;
            out.push('\t');
            out.push_str(HOOK_LINE);
            out.push_str("\texit 0\n");
        }
        None => {
            // Family not actively routed here; say so and move on.
            out.push('\t');
            out.push_str(&logger_line(event, family, " (disabled)"));
            out.push('\t');
            out.push_str(HOOK_LINE);
            out.push_str("\texit 0\n");
        }
    }
    out.push_str("fi\n");
    Ok(())
}

fn logger_line(event: &str, what: &str, suffix: &str) -> String {
    format!(
        "logger -t \"tinc.$NETNAME.{event}\" -p daemon.debug \
         \"{event} from $NODE for {what} $SUBNET ($REMOTEADDRESS:$REMOTEPORT){suffix}\" 2>/dev/null\n"
    )
}
