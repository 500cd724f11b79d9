//! Error types for tincherd-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from loading or validating the local settings file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure (file not found, permission denied, etc.).
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load — includes file path and line context.
    #[error("failed to parse settings at {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A required settings key is missing or empty.
    #[error("required setting '{0}' is missing or empty")]
    MissingField(&'static str),
}

/// Errors from ingesting the fetched peer registry.
#[derive(Debug, Error)]
pub enum ParseError {
    /// A `key=value` line appeared before any `[peer]` section header.
    #[error("line {line}: entry outside of a peer section")]
    EntryOutsideSection { line: usize },

    /// A malformed line that is neither a section header nor `key=value`.
    #[error("line {line}: malformed registry line: {text:?}")]
    MalformedLine { line: usize, text: String },

    /// Two sections share the same peer name. Name uniqueness is an
    /// ingestion invariant; the synthesizer never re-checks it.
    #[error("duplicate peer name {name:?}")]
    DuplicatePeer { name: String },

    /// A peer section with an empty name (`[]`).
    #[error("line {line}: empty peer name")]
    EmptyPeerName { line: usize },

    /// A public key block was opened but never closed.
    #[error("unterminated public key block for peer {name:?}")]
    UnterminatedKey { name: String },

    /// The registry does not contain this node's own entry.
    #[error("local peer {peerid:?} not present in registry")]
    LocalPeerMissing { peerid: String },
}
