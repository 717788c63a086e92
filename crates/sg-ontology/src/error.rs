// error.rs — Error types for knowledge-base loading.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading a knowledge base.
///
/// Load-time errors are fatal and propagate to the caller unmodified:
/// there is no silent fallback to an empty ruleset.
#[derive(Debug, Error)]
pub enum OntologyError {
    /// The knowledge-base source file does not exist.
    #[error("knowledge base not found: {path}")]
    NotFound { path: PathBuf },

    /// The source exists but fails to parse as the detected graph syntax.
    #[error("invalid knowledge base {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    /// The file extension maps to no supported graph syntax.
    #[error("unsupported knowledge-base format: '{extension}'")]
    UnsupportedFormat { extension: String },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
