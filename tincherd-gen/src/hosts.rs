//! Per-peer host descriptor generation.
//!
//! Host files are generated unconditionally for every registry entry —
//! exclusion and the hidden flag only affect `ConnectTo=` emission, so a
//! node we never dial can still dial us and be authenticated.

use std::fmt::Write;

use tincherd_core::types::PeerDescriptor;

use crate::error::GenError;
use crate::{
    or_default, yes_no, GENERATED_HEADER, TINC_DEFAULT_CIPHER, TINC_DEFAULT_COMPRESSION,
    TINC_DEFAULT_DIGEST, TINC_DEFAULT_PORT,
};

/// Generate the contents of `hosts/<name>` for one peer.
pub fn generate(peer: &PeerDescriptor) -> Result<String, GenError> {
    let mut out = String::new();
    out.push_str(GENERATED_HEADER);

    if !peer.gatewayhost.is_empty() {
        writeln!(out, "Address={}", peer.gatewayhost)?;
    }

    writeln!(out, "Cipher={}", or_default(&peer.cipher, TINC_DEFAULT_CIPHER))?;
    writeln!(
        out,
        "Compression={}",
        or_default(&peer.compression, TINC_DEFAULT_COMPRESSION)
    )?;
    writeln!(out, "Digest={}", or_default(&peer.digest, TINC_DEFAULT_DIGEST))?;
    writeln!(out, "IndirectData={}", yes_no(peer.indirectdata))?;
    writeln!(out, "Port={}", or_default(&peer.port, TINC_DEFAULT_PORT))?;

    // Subnets verbatim, weights included: tincd parses the weight itself.
    for subnet in &peer.subnets {
        writeln!(out, "Subnet={subnet}")?;
    }
    for subnet in &peer.subnets6 {
        writeln!(out, "Subnet={subnet}")?;
    }

    writeln!(out, "TCPonly={}", yes_no(peer.use_tcp_only))?;
    writeln!(out, "{}", peer.key)?;

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tincherd_core::types::PeerName;

    fn full_peer() -> PeerDescriptor {
        PeerDescriptor {
            name: PeerName::from("alice"),
            gatewayhost: "vpn.alice.example".to_string(),
            port: "656".to_string(),
            cipher: "aes-256-cbc".to_string(),
            compression: "9".to_string(),
            digest: "sha256".to_string(),
            indirectdata: true,
            use_tcp_only: true,
            subnets: vec!["10.0.1.0/24".to_string(), "10.0.7.0/24#500".to_string()],
            subnets6: vec!["fd23:42:1::/48".to_string()],
            key: "-----BEGIN RSA PUBLIC KEY-----\nAAAA\n-----END RSA PUBLIC KEY-----".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn full_peer_renders_every_field() {
        let text = generate(&full_peer()).expect("generate");
        assert_eq!(
            text,
            "# this is an autogenerated file - do not edit!\n\n\
             Address=vpn.alice.example\n\
             Cipher=aes-256-cbc\n\
             Compression=9\n\
             Digest=sha256\n\
             IndirectData=yes\n\
             Port=656\n\
             Subnet=10.0.1.0/24\n\
             Subnet=10.0.7.0/24#500\n\
             Subnet=fd23:42:1::/48\n\
             TCPonly=yes\n\
             -----BEGIN RSA PUBLIC KEY-----\nAAAA\n-----END RSA PUBLIC KEY-----\n"
        );
    }

    #[test]
    fn empty_fields_fall_back_to_defaults() {
        let peer = PeerDescriptor {
            name: PeerName::from("bob"),
            key: "KEYBLOB".to_string(),
            ..Default::default()
        };
        let text = generate(&peer).expect("generate");
        assert!(!text.contains("Address="), "no gateway host, no Address line");
        assert!(text.contains("Cipher=blowfish\n"));
        assert!(text.contains("Compression=0\n"));
        assert!(text.contains("Digest=sha1\n"));
        assert!(text.contains("IndirectData=no\n"));
        assert!(text.contains("Port=655\n"));
        assert!(text.contains("TCPonly=no\n"));
        assert!(text.ends_with("KEYBLOB\n"));
    }

    #[test]
    fn subnet_weights_are_kept_verbatim() {
        let text = generate(&full_peer()).expect("generate");
        assert!(text.contains("Subnet=10.0.7.0/24#500\n"));
    }
}
