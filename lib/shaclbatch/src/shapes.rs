//! The shapes graph shared by every validation of a run.

use crate::error::{DocumentParseError, SetupError};
use crate::loader::{GraphKind, format_from_path, load_graph, parse_graph};
use oxrdf::Graph;
use oxrdfio::{RdfFormat, RdfParser};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A parsed shapes graph.
///
/// It is read once per run and never changes afterwards; clones share the same graph.
#[derive(Debug, Clone)]
pub struct ShapeSet {
    graph: Arc<Graph>,
    source: Option<PathBuf>,
}

impl ShapeSet {
    /// Parses the shapes file at `path`. Unknown extensions are read as Turtle.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SetupError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(SetupError::MissingShapes(path.to_owned()));
        }
        let format = format_from_path(path).unwrap_or(RdfFormat::Turtle);
        let graph = load_graph(path, format, GraphKind::Shapes).map_err(|source| SetupError::InvalidShapes {
            path: path.to_owned(),
            source,
        })?;
        tracing::debug!(path = %path.display(), triples = graph.len(), "loaded shapes graph");
        Ok(Self {
            graph: Arc::new(graph),
            source: Some(path.to_owned()),
        })
    }

    /// Parses shapes from an in-memory Turtle document.
    pub fn from_turtle(turtle: &str) -> Result<Self, DocumentParseError> {
        let graph = parse_graph(
            RdfParser::from_format(RdfFormat::Turtle),
            turtle.as_bytes(),
            GraphKind::Shapes,
        )?;
        Ok(graph.into())
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Whether `self` and `other` are clones of the same loaded set.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.graph, &other.graph)
    }

    /// The file the shapes were read from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

impl From<Graph> for ShapeSet {
    fn from(graph: Graph) -> Self {
        Self {
            graph: Arc::new(graph),
            source: None,
        }
    }
}
