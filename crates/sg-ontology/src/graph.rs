// graph.rs — In-memory triple store with typed-node queries.
//
// The Graph is deliberately dumb storage: an ordered list of triples with
// linear-scan query helpers. The policy crate runs a single extraction pass
// over it at load time and never touches it per request, so there is no
// need for secondary indexes here.

use serde::{Deserialize, Serialize};

/// A node in the knowledge graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Term {
    /// A named node, identified by IRI.
    Iri(String),
    /// An anonymous node, identified by blank-node label.
    Blank(String),
    /// A literal value (language tags and datatypes are dropped at load).
    Literal(String),
}

impl Term {
    /// The IRI string, if this is a named node.
    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Term::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    /// The literal text, if this is a literal.
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Term::Literal(text) => Some(text),
            _ => None,
        }
    }
}

/// One (subject, predicate, object) statement.
///
/// The predicate is always a named node; subjects may be named or blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triple {
    pub subject: Term,
    pub predicate: String,
    pub object: Term,
}

/// Well-known RDF/RDFS/OWL vocabulary IRIs.
pub mod vocab {
    pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
    pub const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
    pub const RDFS_COMMENT: &str = "http://www.w3.org/2000/01/rdf-schema#comment";
    pub const OWL_CLASS: &str = "http://www.w3.org/2002/07/owl#Class";
    pub const OWL_OBJECT_PROPERTY: &str = "http://www.w3.org/2002/07/owl#ObjectProperty";
    pub const OWL_DATATYPE_PROPERTY: &str = "http://www.w3.org/2002/07/owl#DatatypeProperty";
    pub const OWL_NAMED_INDIVIDUAL: &str = "http://www.w3.org/2002/07/owl#NamedIndividual";
    pub const OWL_ONTOLOGY: &str = "http://www.w3.org/2002/07/owl#Ontology";
}

/// Extract the local name from an IRI: the fragment after '#', else the
/// segment after the last '/', else the IRI itself.
pub fn local_name(iri: &str) -> &str {
    if let Some(pos) = iri.rfind('#') {
        &iri[pos + 1..]
    } else if let Some(pos) = iri.rfind('/') {
        &iri[pos + 1..]
    } else {
        iri
    }
}

/// An in-memory set of triples, in insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Graph {
    triples: Vec<Triple>,
}

impl Graph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a triple. Duplicates are retained.
    pub fn insert(&mut self, subject: Term, predicate: impl Into<String>, object: Term) {
        self.triples.push(Triple {
            subject,
            predicate: predicate.into(),
            object,
        });
    }

    /// Number of triples in the graph.
    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// Iterate all triples in insertion order.
    pub fn triples(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    /// All objects of triples matching (subject, predicate).
    pub fn objects<'a>(
        &'a self,
        subject: &Term,
        predicate: &str,
    ) -> impl Iterator<Item = &'a Term> + 'a {
        let subject = subject.clone();
        let predicate = predicate.to_string();
        self.triples
            .iter()
            .filter(move |t| t.subject == subject && t.predicate == predicate)
            .map(|t| &t.object)
    }

    /// All subjects of triples matching (predicate, object).
    pub fn subjects_with<'a>(
        &'a self,
        predicate: &str,
        object: &Term,
    ) -> impl Iterator<Item = &'a Term> + 'a {
        let predicate = predicate.to_string();
        let object = object.clone();
        self.triples
            .iter()
            .filter(move |t| t.predicate == predicate && t.object == object)
            .map(|t| &t.subject)
    }

    /// All subjects typed as the given class IRI (deduplicated, in first-seen order).
    pub fn subjects_of_type(&self, class_iri: &str) -> Vec<&Term> {
        let class = Term::Iri(class_iri.to_string());
        let mut seen: Vec<&Term> = Vec::new();
        for subject in self.subjects_with(vocab::RDF_TYPE, &class) {
            if !seen.contains(&subject) {
                seen.push(subject);
            }
        }
        seen
    }

    /// All distinct predicate IRIs, in first-seen order.
    pub fn predicates(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for t in &self.triples {
            if !seen.contains(&t.predicate.as_str()) {
                seen.push(&t.predicate);
            }
        }
        seen
    }

    /// The rdfs:label of a subject if present, else the local name of its IRI.
    pub fn label(&self, subject: &Term) -> Option<String> {
        for object in self.objects(subject, vocab::RDFS_LABEL) {
            if let Some(text) = object.as_literal() {
                return Some(text.to_string());
            }
        }
        subject.as_iri().map(|iri| local_name(iri).to_string())
    }

    /// The first rdfs:comment literal of a subject, if any.
    pub fn comment(&self, subject: &Term) -> Option<String> {
        self.objects(subject, vocab::RDFS_COMMENT)
            .find_map(|o| o.as_literal().map(|s| s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iri(s: &str) -> Term {
        Term::Iri(s.to_string())
    }

    fn sample() -> Graph {
        let mut g = Graph::new();
        g.insert(iri("http://ex.org#User"), vocab::RDF_TYPE, iri(vocab::OWL_CLASS));
        g.insert(
            iri("http://ex.org#User"),
            vocab::RDFS_LABEL,
            Term::Literal("User".to_string()),
        );
        g.insert(iri("http://ex.org#Order"), vocab::RDF_TYPE, iri(vocab::OWL_CLASS));
        g
    }

    #[test]
    fn local_name_handles_fragment_and_path() {
        assert_eq!(local_name("http://ex.org#User"), "User");
        assert_eq!(local_name("http://ex.org/things/Order"), "Order");
        assert_eq!(local_name("plainname"), "plainname");
    }

    #[test]
    fn subjects_of_type_deduplicates() {
        let mut g = sample();
        // Duplicate type assertion.
        g.insert(iri("http://ex.org#User"), vocab::RDF_TYPE, iri(vocab::OWL_CLASS));
        let classes = g.subjects_of_type(vocab::OWL_CLASS);
        assert_eq!(classes.len(), 2);
    }

    #[test]
    fn label_prefers_rdfs_label() {
        let g = sample();
        assert_eq!(g.label(&iri("http://ex.org#User")), Some("User".to_string()));
        // No label triple: fall back to the IRI fragment.
        assert_eq!(g.label(&iri("http://ex.org#Order")), Some("Order".to_string()));
    }

    #[test]
    fn objects_filters_by_subject_and_predicate() {
        let g = sample();
        let labels: Vec<_> = g
            .objects(&iri("http://ex.org#User"), vocab::RDFS_LABEL)
            .collect();
        assert_eq!(labels, vec![&Term::Literal("User".to_string())]);
    }

    #[test]
    fn predicates_lists_distinct() {
        let g = sample();
        let preds = g.predicates();
        assert_eq!(preds, vec![vocab::RDF_TYPE, vocab::RDFS_LABEL]);
    }
}
