//! Constraint engines.
//!
//! The batch only talks to engines through [`ShaclEngine`]. [`CoreEngine`] is the built-in
//! implementation: SHACL Core plus RDFS inference and `sh:TripleRule` execution.

mod constraint;
mod datatype;
mod inference;
mod model;
mod path;
mod report;
mod rules;
mod terms;
mod validator;

pub use constraint::{Constraint, ConstraintComponent};
pub use inference::rdfs_closure;
pub use model::{CompiledShapes, NodeExpression, Shape, ShapeRef, Target, TripleRule};
pub use path::PropertyPath;
pub use report::{Severity, ValidationReport, ValidationResult};
pub use rules::apply_rules;
pub use validator::MAX_RECURSION_DEPTH;

use crate::error::{EngineError, ShapeError};
use crate::shapes::ShapeSet;
use oxrdf::Graph;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Entailment applied to the data graph before validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Inference {
    None,
    #[default]
    Rdfs,
}

impl fmt::Display for Inference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Rdfs => "rdfs",
        })
    }
}

/// Options passed to every evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub inference: Inference,
    /// Execute SHACL Advanced Features rules before validating.
    pub advanced: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            inference: Inference::Rdfs,
            advanced: true,
        }
    }
}

/// What an engine produced for one data graph.
#[derive(Debug, Clone)]
pub struct EngineResult {
    pub conforms: bool,
    /// The report graph, when the engine produces one.
    pub report_graph: Option<Graph>,
    pub report_text: String,
}

/// A SHACL constraint engine.
///
/// The result may only depend on the inputs: the same inputs always give the same result.
pub trait ShaclEngine {
    /// Name used to select the engine.
    fn name(&self) -> &str;

    fn evaluate(
        &self,
        data: &Graph,
        shapes: &ShapeSet,
        options: &EngineOptions,
    ) -> Result<EngineResult, EngineError>;
}

/// The built-in engine.
///
/// The shapes are compiled on first use and reused for as long as the same [`ShapeSet`] is passed.
#[derive(Debug, Default)]
pub struct CoreEngine {
    compiled: RefCell<Option<CachedShapes>>,
}

type CachedShapes = (ShapeSet, Result<Rc<CompiledShapes>, ShapeError>);

impl CoreEngine {
    pub const NAME: &'static str = "core";

    fn compiled(&self, shapes: &ShapeSet) -> Result<Rc<CompiledShapes>, ShapeError> {
        let mut cache = self.compiled.borrow_mut();
        if let Some((cached, compiled)) = &*cache
            && cached.ptr_eq(shapes)
        {
            return compiled.clone();
        }
        let compiled = CompiledShapes::compile(shapes.graph()).map(Rc::new);
        tracing::debug!(ok = compiled.is_ok(), "compiled shapes graph");
        *cache = Some((shapes.clone(), compiled.clone()));
        compiled
    }

    /// Runs the validation and keeps the structured report.
    pub fn validate(
        &self,
        data: &Graph,
        shapes: &ShapeSet,
        options: &EngineOptions,
    ) -> Result<ValidationReport, EngineError> {
        let compiled = self.compiled(shapes)?;
        let mut data = data.clone();
        if options.inference == Inference::Rdfs {
            let inferred = rdfs_closure(&mut data)?;
            tracing::debug!(inferred, "applied RDFS inference");
        }
        if options.advanced {
            let inferred = apply_rules(&compiled, &mut data)?;
            tracing::debug!(inferred, "applied shape rules");
        }
        validator::validate(&compiled, &data)
    }
}

impl ShaclEngine for CoreEngine {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn evaluate(
        &self,
        data: &Graph,
        shapes: &ShapeSet,
        options: &EngineOptions,
    ) -> Result<EngineResult, EngineError> {
        let report = self.validate(data, shapes, options)?;
        Ok(EngineResult {
            conforms: report.conforms(),
            report_graph: Some(report.to_graph()),
            report_text: report.to_text(),
        })
    }
}

/// Looks an engine up by name.
pub fn engine_by_name(name: &str) -> Option<Box<dyn ShaclEngine>> {
    match name {
        CoreEngine::NAME => Some(Box::new(CoreEngine::default())),
        _ => None,
    }
}
