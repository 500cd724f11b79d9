//! Peer registry ingestion.
//!
//! # Wire format
//!
//! The central server publishes a plain-text stanza format:
//!
//! ```text
//! [alice]
//! gatewayhost=vpn.alice.example
//! port=655
//! subnet=10.0.1.0/24
//! subnet=10.0.7.0/24#500
//! subnet6=fd23:42:1::/48
//! primary=yes
//! -----BEGIN RSA PUBLIC KEY-----
//! ...
//! -----END RSA PUBLIC KEY-----
//! ```
//!
//! `subnet=` / `subnet6=` lines accumulate; a PEM block is captured
//! verbatim into the peer's `key` field; `#` comments and blank lines are
//! ignored outside key blocks. Name uniqueness is enforced here — the
//! synthesizer relies on it and never re-checks.

use crate::error::ParseError;
use crate::types::{PeerDescriptor, PeerName, PeerRegistry};

/// Parse the fetched registry text into an ordered [`PeerRegistry`].
pub fn parse(text: &str) -> Result<PeerRegistry, ParseError> {
    let mut registry = PeerRegistry::new();
    let mut current: Option<PeerDescriptor> = None;
    let mut lines = text.lines().enumerate();

    while let Some((idx, raw)) = lines.next() {
        let lineno = idx + 1;
        let line = raw.trim_end();

        if let Some(header) = parse_section_header(line) {
            if header.is_empty() {
                return Err(ParseError::EmptyPeerName { line: lineno });
            }
            if let Some(done) = current.take() {
                registry.push(done)?;
            }
            current = Some(PeerDescriptor {
                name: PeerName::from(header),
                ..Default::default()
            });
            continue;
        }

        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }

        let peer = current
            .as_mut()
            .ok_or(ParseError::EntryOutsideSection { line: lineno })?;

        if line.starts_with("-----BEGIN") {
            peer.key = collect_key_block(line, &mut lines, &peer.name.0)?;
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            return Err(ParseError::MalformedLine {
                line: lineno,
                text: line.to_string(),
            });
        };
        apply_entry(peer, key.trim(), value.trim(), lineno);
    }

    if let Some(done) = current.take() {
        registry.push(done)?;
    }
    Ok(registry)
}

/// Ensure the registry contains our own entry; every run needs it for the
/// silent-flag lookup and the self-skip rules.
pub fn require_local_peer<'a>(
    registry: &'a PeerRegistry,
    peerid: &str,
) -> Result<&'a PeerDescriptor, ParseError> {
    registry.find(peerid).ok_or_else(|| ParseError::LocalPeerMissing {
        peerid: peerid.to_string(),
    })
}

fn parse_section_header(line: &str) -> Option<String> {
    let trimmed = line.trim();
    let inner = trimmed.strip_prefix('[')?.strip_suffix(']')?;
    Some(inner.trim().to_string())
}

fn collect_key_block<'a, I>(
    first: &str,
    lines: &mut I,
    peer: &str,
) -> Result<String, ParseError>
where
    I: Iterator<Item = (usize, &'a str)>,
{
    let mut block = String::from(first);
    block.push('\n');
    for (_, raw) in lines.by_ref() {
        let line = raw.trim_end();
        block.push_str(line);
        block.push('\n');
        if line.starts_with("-----END") {
            // Drop the trailing newline; generators add their own.
            block.pop();
            return Ok(block);
        }
    }
    Err(ParseError::UnterminatedKey {
        name: peer.to_string(),
    })
}

fn apply_entry(peer: &mut PeerDescriptor, key: &str, value: &str, lineno: usize) {
    match key.to_ascii_lowercase().as_str() {
        "gatewayhost" => peer.gatewayhost = value.to_string(),
        "port" => peer.port = value.to_string(),
        "cipher" => peer.cipher = value.to_string(),
        "compression" => peer.compression = value.to_string(),
        "digest" => peer.digest = value.to_string(),
        "indirectdata" => peer.indirectdata = parse_bool(value),
        "tcponly" | "use-tcp-only" => peer.use_tcp_only = parse_bool(value),
        "primary" => peer.primary = parse_bool(value),
        "hidden" => peer.hidden = parse_bool(value),
        "silent" => peer.silent = parse_bool(value),
        "subnet" | "network" => peer.subnets.push(value.to_string()),
        "subnet6" | "network6" => peer.subnets6.push(value.to_string()),
        other => {
            // Forward compatibility: the master may publish keys newer
            // than this agent understands.
            tracing::debug!(line = lineno, key = other, "ignoring unknown registry key");
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "yes" | "true" | "1")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# central registry dump
[alice]
gatewayhost=vpn.alice.example
port=656
subnet=10.0.1.0/24
subnet=10.0.7.0/24#500
subnet6=fd23:42:1::/48
primary=yes
-----BEGIN RSA PUBLIC KEY-----
MIIBCgKCAQEAalice
-----END RSA PUBLIC KEY-----

[bob]
subnet=10.0.2.0/24
hidden=yes
tcponly=1
-----BEGIN RSA PUBLIC KEY-----
MIIBCgKCAQEAbob
-----END RSA PUBLIC KEY-----
";

    #[test]
    fn sample_parses_in_order() {
        let reg = parse(SAMPLE).expect("parse");
        let names: Vec<&str> = reg.iter().map(|p| p.name.0.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob"]);
    }

    #[test]
    fn fields_land_on_the_right_peer() {
        let reg = parse(SAMPLE).expect("parse");
        let alice = reg.find("alice").expect("alice");
        assert_eq!(alice.gatewayhost, "vpn.alice.example");
        assert_eq!(alice.port, "656");
        assert_eq!(alice.subnets, vec!["10.0.1.0/24", "10.0.7.0/24#500"]);
        assert_eq!(alice.subnets6, vec!["fd23:42:1::/48"]);
        assert!(alice.primary);
        assert!(!alice.hidden);

        let bob = reg.find("bob").expect("bob");
        assert!(bob.gatewayhost.is_empty());
        assert!(bob.hidden);
        assert!(bob.use_tcp_only);
    }

    #[test]
    fn key_blocks_are_verbatim() {
        let reg = parse(SAMPLE).expect("parse");
        let alice = reg.find("alice").expect("alice");
        assert_eq!(
            alice.key,
            "-----BEGIN RSA PUBLIC KEY-----\nMIIBCgKCAQEAalice\n-----END RSA PUBLIC KEY-----"
        );
    }

    #[test]
    fn duplicate_sections_are_rejected() {
        let err = parse("[x]\n[y]\n[x]\n").unwrap_err();
        assert!(matches!(err, ParseError::DuplicatePeer { name } if name == "x"));
    }

    #[test]
    fn entry_before_any_section_is_rejected() {
        let err = parse("gatewayhost=1.2.3.4\n").unwrap_err();
        assert!(matches!(err, ParseError::EntryOutsideSection { line: 1 }));
    }

    #[test]
    fn malformed_line_is_rejected_with_context() {
        let err = parse("[x]\nthis is not a key value line\n").unwrap_err();
        match err {
            ParseError::MalformedLine { line, text } => {
                assert_eq!(line, 2);
                assert!(text.contains("not a key"));
            }
            other => panic!("expected MalformedLine, got {other:?}"),
        }
    }

    #[test]
    fn unterminated_key_block_is_rejected() {
        let err = parse("[x]\n-----BEGIN RSA PUBLIC KEY-----\nabc\n").unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedKey { name } if name == "x"));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let reg = parse("[x]\nfrobnicate=yes\nsubnet=10.0.0.0/8\n").expect("parse");
        assert_eq!(reg.find("x").expect("x").subnets, vec!["10.0.0.0/8"]);
    }

    #[test]
    fn require_local_peer_errors_when_absent() {
        let reg = parse("[alice]\n").expect("parse");
        assert!(require_local_peer(&reg, "alice").is_ok());
        let err = require_local_peer(&reg, "bob").unwrap_err();
        assert!(matches!(err, ParseError::LocalPeerMissing { peerid } if peerid == "bob"));
    }
}
