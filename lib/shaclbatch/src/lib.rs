#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod batch;
mod corpus;
pub mod engine;
mod error;
mod loader;
mod pipeline;
mod shapes;
mod sink;
pub mod vocab;

pub use batch::{BatchValidator, OutcomeStatus, ValidationOutcome};
pub use corpus::{Document, discover};
pub use engine::{
    CoreEngine, EngineOptions, EngineResult, Inference, ShaclEngine, engine_by_name,
};
pub use error::{DocumentParseError, EngineError, PersistenceWarning, SetupError, ShapeError};
pub use loader::{GraphKind, base_iri, format_from_path, load_graph};
pub use pipeline::{Pipeline, PipelineConfig};
pub use shapes::ShapeSet;
pub use sink::{Persisted, ReportSink, RunStatus, RunSummary};
