use oxrdf::{IriParseError, Term};
use oxrdfio::RdfParseError;
use std::io;
use std::path::PathBuf;

/// An error that prevents the batch from starting.
///
/// No document is validated and no artifact is written when one of these is returned.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SetupError {
    #[error("RDF directory not found: {}", .0.display())]
    MissingCorpus(PathBuf),
    #[error("SHACL shapes file not found: {}", .0.display())]
    MissingShapes(PathBuf),
    #[error("Failed to parse SHACL shapes file {}: {source}", path.display())]
    InvalidShapes {
        path: PathBuf,
        #[source]
        source: DocumentParseError,
    },
    #[error("No constraint engine is available: {0}")]
    MissingEngine(String),
    #[error("Unsupported document extension '{0}': it does not name an RDF graph syntax")]
    UnsupportedExtension(String),
    #[error("Failed to list the documents of {}: {source}", path.display())]
    CorpusScan {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to create the output directory {}: {source}", path.display())]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A document (data or shapes) could not be read into a graph.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DocumentParseError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Syntax(#[from] RdfParseError),
    #[error("Invalid base IRI: {0}")]
    BaseIri(#[from] IriParseError),
}

/// The shapes graph uses the SHACL vocabulary in a way the engine cannot compile.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum ShapeError {
    #[error("Invalid property path in shape {shape}: {message}")]
    InvalidPath { shape: Term, message: String },
    #[error("Invalid RDF list in shape {shape}: {message}")]
    InvalidList { shape: Term, message: String },
    #[error("Shape reference must be an IRI or a blank node, found {0}")]
    InvalidShapeReference(Term),
    #[error("Invalid value for {property} in shape {shape}: {message}")]
    InvalidParameter {
        shape: Term,
        property: &'static str,
        message: String,
    },
}

/// The constraint engine could not complete an evaluation.
///
/// This is distinct from a non-conforming graph: the verdict is unknown.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum EngineError {
    #[error(transparent)]
    Shape(#[from] ShapeError),
    #[error("Invalid regex pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
    #[error("Maximum recursion depth ({0}) exceeded during validation")]
    RecursionLimit(usize),
    #[error("Inference did not reach a fixpoint after {0} iterations")]
    InferenceLimit(usize),
}

/// Writing one report artifact failed.
///
/// It is reported next to the document but never changes its classification.
#[derive(Debug, thiserror::Error)]
#[error("{}: {source}", path.display())]
pub struct PersistenceWarning {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}
