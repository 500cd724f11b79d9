//! Domain types for the peer registry.
//!
//! The registry is insertion-ordered and the order is semantically
//! meaningful: it determines the order of `ConnectTo=` lines in the
//! generated daemon config.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed peer name. Names are unique within a registry; the
/// exclusion set matches them case-insensitively, everything else is exact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerName(pub String);

impl fmt::Display for PeerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for PeerName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PeerName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Peer descriptor
// ---------------------------------------------------------------------------

/// One node as described by the central registry.
///
/// String fields that the registry may leave empty stay `String` (empty
/// means "not set"), matching the generator default rules. The `key` blob
/// is opaque and copied verbatim into the host descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PeerDescriptor {
    pub name: PeerName,
    #[serde(default)]
    pub gatewayhost: String,
    #[serde(default)]
    pub port: String,
    #[serde(default)]
    pub cipher: String,
    #[serde(default)]
    pub compression: String,
    #[serde(default)]
    pub digest: String,
    #[serde(default)]
    pub indirectdata: bool,
    #[serde(default)]
    pub use_tcp_only: bool,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub silent: bool,
    /// IPv4 subnets. Entries may carry a `#weight` suffix which is kept
    /// verbatim in host descriptors and stripped for route commands.
    #[serde(default)]
    pub subnets: Vec<String>,
    /// IPv6 subnets, same `#weight` rules as [`Self::subnets`].
    #[serde(default)]
    pub subnets6: Vec<String>,
    /// Raw public key blob, whole lines, no interpretation.
    #[serde(default)]
    pub key: String,
}

impl Default for PeerName {
    fn default() -> Self {
        Self(String::new())
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Ordered collection of peers, immutable per run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PeerRegistry {
    peers: Vec<PeerDescriptor>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a peer, enforcing the name-uniqueness invariant.
    pub fn push(&mut self, peer: PeerDescriptor) -> Result<(), ParseError> {
        if self.find(&peer.name.0).is_some() {
            return Err(ParseError::DuplicatePeer {
                name: peer.name.0.clone(),
            });
        }
        self.peers.push(peer);
        Ok(())
    }

    /// Exact-name lookup.
    pub fn find(&self, name: &str) -> Option<&PeerDescriptor> {
        self.peers.iter().find(|p| p.name.0 == name)
    }

    /// Iterate peers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &PeerDescriptor> {
        self.peers.iter()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

impl<'a> IntoIterator for &'a PeerRegistry {
    type Item = &'a PeerDescriptor;
    type IntoIter = std::slice::Iter<'a, PeerDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.peers.iter()
    }
}

// ---------------------------------------------------------------------------
// Exclusion set
// ---------------------------------------------------------------------------

/// Peer names excluded from all topology decisions.
///
/// Matching is case-insensitive. Configuration order is preserved because
/// the dynamic subnet scripts emit one guard line per excluded name in that
/// order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExclusionSet {
    names: Vec<String>,
}

impl ExclusionSet {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n.eq_ignore_ascii_case(name))
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Excluded names in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
