// error.rs — Error types for the policy validator.

use thiserror::Error;

/// Errors that can occur during validator lifecycle operations.
///
/// Decision-time denials are never errors — they are ordinary
/// `allowed=false` results (see `result.rs`).
#[derive(Debug, Error)]
pub enum ValidatorError {
    /// The knowledge base could not be loaded (missing file, malformed
    /// source, unsupported format).
    #[error("knowledge base error: {0}")]
    Ontology(#[from] sg_ontology::OntologyError),

    /// A query method was invoked before a knowledge base was loaded.
    #[error("validator not initialized: load a knowledge base before querying")]
    NotInitialized,

    /// `load` was called on an already-loaded instance. Construct a new
    /// validator and swap it in to hot-reload.
    #[error("validator already initialized: construct a new instance to reload")]
    AlreadyLoaded,
}
