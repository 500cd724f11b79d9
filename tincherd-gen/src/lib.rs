//! tincherd artifact generation.
//!
//! Four stateless generators turn the parsed registry plus local settings
//! into the text artifacts that configure and drive tincd:
//!
//! - [`conf`] — the global `tinc.conf`
//! - [`hosts`] — one host descriptor per registry entry
//! - [`updown`] — the `tinc-up` / `tinc-down` scripts
//! - [`subnet`] — the `subnet-up` / `subnet-down` scripts (dynamic mode)
//!
//! [`pipeline`] runs all four in one pass and [`writer`] puts the results
//! on disk. Generation is pure; a generator either returns a complete
//! buffer or an error — the writer never sees a partial artifact.

pub mod conf;
pub mod error;
pub mod hosts;
pub mod pipeline;
pub mod subnet;
pub mod updown;
pub mod writer;

pub use error::GenError;
pub use pipeline::{synthesize, write_artifacts, ArtifactSet, SubnetArtifacts};

/// Header every generated artifact starts with.
pub const GENERATED_HEADER: &str = "# this is an autogenerated file - do not edit!\n\n";

/// Defaults applied when a registry entry leaves the field empty.
pub const TINC_DEFAULT_CIPHER: &str = "blowfish";
pub const TINC_DEFAULT_COMPRESSION: &str = "0";
pub const TINC_DEFAULT_DIGEST: &str = "sha1";
pub const TINC_DEFAULT_PORT: &str = "655";

/// Version after which tincd understands `StrictSubnets` (and peer-to-peer
/// routing makes primary-only dialing safe).
pub const STRICT_SUBNETS_SINCE: &str = "1.0.12";

pub(crate) fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

/// Value to use for an optional field: the peer's own when non-empty,
/// otherwise the named default.
pub(crate) fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.is_empty() {
        default
    } else {
        value
    }
}

/// Strip a `#weight` suffix from a subnet entry before it is substituted
/// into a route command.
pub(crate) fn strip_weight(subnet: &str) -> &str {
    match subnet.split_once('#') {
        Some((prefix, _)) => prefix,
        None => subnet,
    }
}
