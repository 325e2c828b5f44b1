//! Reading RDF files into in-memory graphs.

use crate::error::DocumentParseError;
use oxrdf::{BlankNode, Graph, NamedOrBlankNode, Quad, Term, Triple};
use oxrdfio::{RdfFormat, RdfParser};
use rustc_hash::FxHashMap;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::Path;
use url::Url;

/// What a parsed graph is used for.
///
/// Each kind labels its blank nodes with its own prefix, so shapes and data nodes never share a
/// label once they meet in a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphKind {
    Shapes,
    Data,
}

impl GraphKind {
    fn blank_node_prefix(self) -> &'static str {
        match self {
            Self::Shapes => "s",
            Self::Data => "d",
        }
    }
}

/// The syntax of `path`, guessed from its extension.
pub fn format_from_path(path: &Path) -> Option<RdfFormat> {
    RdfFormat::from_extension(path.extension()?.to_str()?)
}

/// The `file:` URL of `path`, used as the base IRI of its relative references.
pub fn base_iri(path: &Path) -> Option<Url> {
    Url::from_file_path(fs::canonicalize(path).ok()?).ok()
}

/// Parses the whole file at `path` into a fresh graph.
///
/// Named graphs are rejected: a document is a single graph.
/// Blank nodes are numbered in order of first appearance, so parsing the same file twice gives
/// the same graph.
pub fn load_graph(
    path: &Path,
    format: RdfFormat,
    kind: GraphKind,
) -> Result<Graph, DocumentParseError> {
    let mut parser = RdfParser::from_format(format);
    if let Some(base) = base_iri(path) {
        parser = parser.with_base_iri(base.as_str())?;
    }
    parse_graph(parser, BufReader::new(File::open(path)?), kind)
}

pub(crate) fn parse_graph(
    parser: RdfParser,
    reader: impl Read,
    kind: GraphKind,
) -> Result<Graph, DocumentParseError> {
    let mut labels = BlankNodeLabels::new(kind.blank_node_prefix());
    let mut graph = Graph::new();
    for quad in parser.without_named_graphs().for_reader(reader) {
        graph.insert(&labels.triple(quad?));
    }
    Ok(graph)
}

/// Replaces the labels chosen by the parser with `<prefix><n>`.
struct BlankNodeLabels {
    prefix: &'static str,
    labels: FxHashMap<BlankNode, BlankNode>,
}

impl BlankNodeLabels {
    fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            labels: FxHashMap::default(),
        }
    }

    fn blank_node(&mut self, node: BlankNode) -> BlankNode {
        let next = self.labels.len();
        let prefix = self.prefix;
        self.labels
            .entry(node)
            .or_insert_with(|| BlankNode::new_unchecked(format!("{prefix}{next}")))
            .clone()
    }

    fn triple(&mut self, quad: Quad) -> Triple {
        Triple {
            subject: self.subject(quad.subject),
            predicate: quad.predicate,
            object: self.term(quad.object),
        }
    }

    fn subject(&mut self, subject: NamedOrBlankNode) -> NamedOrBlankNode {
        match subject {
            NamedOrBlankNode::BlankNode(node) => self.blank_node(node).into(),
            NamedOrBlankNode::NamedNode(node) => node.into(),
        }
    }

    fn term(&mut self, term: Term) -> Term {
        match term {
            Term::BlankNode(node) => self.blank_node(node).into(),
            #[cfg(feature = "rdf-12")]
            Term::Triple(triple) => {
                let Triple {
                    subject,
                    predicate,
                    object,
                } = *triple;
                Term::Triple(Box::new(Triple {
                    subject: self.subject(subject),
                    predicate,
                    object: self.term(object),
                }))
            }
            term => term,
        }
    }
}
