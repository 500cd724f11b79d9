//! tincherd core library — domain types, settings, registry ingestion,
//! version comparison.
//!
//! Public API surface:
//! - [`types`] — peer descriptors, the ordered registry, exclusion set
//! - [`settings`] — [`LocalSettings`] load / validate
//! - [`registry`] — text-format registry ingestion
//! - [`version`] — natural-order version comparison
//! - [`error`] — [`ConfigError`], [`ParseError`]

pub mod error;
pub mod registry;
pub mod settings;
pub mod types;
pub mod version;

pub use error::{ConfigError, ParseError};
pub use settings::LocalSettings;
pub use types::{ExclusionSet, PeerDescriptor, PeerName, PeerRegistry};
pub use version::natural_cmp;
