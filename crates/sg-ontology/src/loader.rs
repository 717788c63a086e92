// loader.rs — File and string loaders for the supported graph syntaxes.
//
// Format detection is by file extension, mirroring the conventional
// serialization suffixes: .ttl/.turtle/.n3 → Turtle, .nt → N-Triples,
// .owl/.rdf/.xml → RDF/XML. Anything else is rejected up front rather
// than guessed at.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use rio_api::model as rio;
use rio_api::parser::TriplesParser;
use rio_turtle::{NTriplesParser, TurtleParser};
use rio_xml::RdfXmlParser;

use crate::error::OntologyError;
use crate::graph::{Graph, Term};

/// A supported knowledge-base serialization format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Turtle,
    NTriples,
    RdfXml,
}

impl Format {
    /// Map a file extension (without dot, case-insensitive) to a format.
    pub fn from_extension(extension: &str) -> Result<Self, OntologyError> {
        match extension.to_ascii_lowercase().as_str() {
            "ttl" | "turtle" | "n3" => Ok(Format::Turtle),
            "nt" => Ok(Format::NTriples),
            "owl" | "rdf" | "xml" => Ok(Format::RdfXml),
            other => Err(OntologyError::UnsupportedFormat {
                extension: other.to_string(),
            }),
        }
    }
}

/// Load a knowledge base from a file, detecting the format from its extension.
pub fn load_path(path: impl AsRef<Path>) -> Result<Graph, OntologyError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(OntologyError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_string();
    let format = Format::from_extension(&extension)?;

    let reader = BufReader::new(File::open(path)?);
    let graph = parse_reader(reader, format).map_err(|reason| OntologyError::Parse {
        path: path.to_path_buf(),
        reason,
    })?;

    tracing::info!(
        path = %path.display(),
        triples = graph.len(),
        "loaded knowledge base"
    );
    if graph.is_empty() {
        tracing::warn!(path = %path.display(), "knowledge base is empty");
    }
    Ok(graph)
}

/// Load a knowledge base from an in-memory string.
pub fn load_str(source: &str, format: Format) -> Result<Graph, OntologyError> {
    parse_reader(source.as_bytes(), format).map_err(|reason| OntologyError::Parse {
        path: "<string>".into(),
        reason,
    })
}

fn parse_reader(reader: impl std::io::BufRead, format: Format) -> Result<Graph, String> {
    match format {
        Format::Turtle => collect(TurtleParser::new(reader, None)),
        Format::NTriples => collect(NTriplesParser::new(reader)),
        Format::RdfXml => collect(RdfXmlParser::new(reader, None)),
    }
}

/// Drain a rio parser into a Graph, stringifying the parser error.
fn collect<P: TriplesParser>(mut parser: P) -> Result<Graph, String> {
    let mut graph = Graph::new();
    parser
        .parse_all::<P::Error>(&mut |triple| {
            insert_rio(&mut graph, triple);
            Ok(())
        })
        .map_err(|e| e.to_string())?;
    Ok(graph)
}

/// Convert one rio triple into our term model. RDF-star quoted triples
/// have no meaning in a rule table and are skipped.
fn insert_rio(graph: &mut Graph, triple: rio::Triple<'_>) {
    let subject = match triple.subject {
        rio::Subject::NamedNode(n) => Term::Iri(n.iri.to_string()),
        rio::Subject::BlankNode(b) => Term::Blank(b.id.to_string()),
        rio::Subject::Triple(_) => return,
    };
    let object = match triple.object {
        rio::Term::NamedNode(n) => Term::Iri(n.iri.to_string()),
        rio::Term::BlankNode(b) => Term::Blank(b.id.to_string()),
        rio::Term::Literal(rio::Literal::Simple { value })
        | rio::Term::Literal(rio::Literal::LanguageTaggedString { value, .. })
        | rio::Term::Literal(rio::Literal::Typed { value, .. }) => {
            Term::Literal(value.to_string())
        }
        rio::Term::Triple(_) => return,
    };
    graph.insert(subject, triple.predicate.iri.to_string(), object);
}
