//! Error types for tincherd-gen.

use std::path::PathBuf;

use thiserror::Error;

use tincherd_core::ParseError;

/// All errors that can arise while generating or writing artifacts.
#[derive(Debug, Error)]
pub enum GenError {
    /// Buffer serialization failed mid-artifact; the partial buffer is
    /// dropped, never written.
    #[error("artifact formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    /// Registry-level precondition failed (e.g. local peer not present).
    #[error(transparent)]
    Registry(#[from] ParseError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A host filename that would escape the hosts directory. Peer names
    /// come from a semi-trusted remote registry and are never joined into
    /// a path unchecked.
    #[error("unsafe artifact file name {name:?}")]
    UnsafeName { name: String },
}

/// Convenience constructor for [`GenError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> GenError {
    GenError::Io {
        path: path.into(),
        source,
    }
}
