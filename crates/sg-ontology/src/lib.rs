//! # sg-ontology
//!
//! Knowledge-graph loading for SemGate.
//!
//! Parses a serialized knowledge base (Turtle, N-Triples, or RDF/XML) into
//! an in-memory [`Graph`] of (subject, predicate, object) triples with typed
//! nodes and optional text labels. The graph is a plain rule-storage
//! structure: no OWL reasoning (subsumption, disjointness, cardinality)
//! happens here or anywhere downstream.

pub mod error;
pub mod graph;
pub mod loader;

pub use error::OntologyError;
pub use graph::{local_name, vocab, Graph, Term, Triple};
pub use loader::{load_path, load_str, Format};
