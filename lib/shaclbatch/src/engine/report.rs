//! Validation results and their two renderings: a report graph in the SHACL vocabulary and a
//! plain-text explanation.

use super::constraint::ConstraintComponent;
use super::model::ShapeRef;
use super::path::PropertyPath;
use crate::vocab::sh;
use oxrdf::vocab::{rdf, xsd};
use oxrdf::{BlankNode, Graph, Literal, NamedNodeRef, Term, Triple};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Severity {
    #[default]
    Violation,
    Warning,
    Info,
}

impl Severity {
    pub fn iri(self) -> NamedNodeRef<'static> {
        match self {
            Self::Violation => sh::VIOLATION,
            Self::Warning => sh::WARNING,
            Self::Info => sh::INFO,
        }
    }

    /// Unknown severities are treated as violations.
    pub fn from_iri(iri: NamedNodeRef<'_>) -> Self {
        if iri == sh::WARNING {
            Self::Warning
        } else if iri == sh::INFO {
            Self::Info
        } else {
            Self::Violation
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Violation => "Violation",
            Self::Warning => "Warning",
            Self::Info => "Info",
        })
    }
}

#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub focus_node: Term,
    pub path: Option<PropertyPath>,
    pub value: Option<Term>,
    pub source_shape: ShapeRef,
    pub component: ConstraintComponent,
    pub message: String,
    pub severity: Severity,
}

/// Results of one evaluation, in the order they were found.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    results: Vec<ValidationResult>,
}

impl ValidationReport {
    /// Only `sh:Violation` results break conformance.
    pub fn conforms(&self) -> bool {
        !self
            .results
            .iter()
            .any(|r| r.severity == Severity::Violation)
    }

    pub fn results(&self) -> &[ValidationResult] {
        &self.results
    }

    pub fn add(&mut self, result: ValidationResult) {
        self.results.push(result);
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// The report graph. Blank node labels are derived from result positions so the
    /// serialization of a given report is always the same.
    pub fn to_graph(&self) -> Graph {
        let mut graph = Graph::new();
        let report = BlankNode::new_unchecked("report");
        graph.insert(&Triple::new(
            report.clone(),
            rdf::TYPE,
            sh::VALIDATION_REPORT.into_owned(),
        ));
        graph.insert(&Triple::new(
            report.clone(),
            sh::CONFORMS,
            Literal::new_typed_literal(if self.conforms() { "true" } else { "false" }, xsd::BOOLEAN),
        ));
        for (i, result) in self.results.iter().enumerate() {
            let node = BlankNode::new_unchecked(format!("result{i}"));
            graph.insert(&Triple::new(report.clone(), sh::RESULT, node.clone()));
            graph.insert(&Triple::new(
                node.clone(),
                rdf::TYPE,
                sh::VALIDATION_RESULT.into_owned(),
            ));
            graph.insert(&Triple::new(
                node.clone(),
                sh::FOCUS_NODE,
                result.focus_node.clone(),
            ));
            if let Some(path) = &result.path {
                let mut k = 0;
                let path = path.to_rdf(&mut graph, &mut || {
                    k += 1;
                    BlankNode::new_unchecked(format!("result{i}_{k}"))
                });
                graph.insert(&Triple::new(node.clone(), sh::RESULT_PATH, path));
            }
            if let Some(value) = &result.value {
                graph.insert(&Triple::new(node.clone(), sh::VALUE, value.clone()));
            }
            graph.insert(&Triple::new(
                node.clone(),
                sh::SOURCE_SHAPE,
                result.source_shape.clone(),
            ));
            graph.insert(&Triple::new(
                node.clone(),
                sh::SOURCE_CONSTRAINT_COMPONENT,
                result.component.iri().into_owned(),
            ));
            graph.insert(&Triple::new(
                node.clone(),
                sh::RESULT_MESSAGE,
                Literal::new_simple_literal(&result.message),
            ));
            graph.insert(&Triple::new(
                node,
                sh::RESULT_SEVERITY,
                result.severity.iri().into_owned(),
            ));
        }
        graph
    }

    /// Human-readable explanation, one block per result.
    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Validation Report")?;
        writeln!(
            f,
            "Conforms: {}",
            if self.conforms() { "True" } else { "False" }
        )?;
        if self.results.is_empty() {
            return Ok(());
        }
        writeln!(f, "Results ({}):", self.results.len())?;
        for result in &self.results {
            writeln!(
                f,
                "Constraint {} in {} ({}):",
                result.severity,
                result.component.local_name(),
                result.component.iri().as_str()
            )?;
            writeln!(f, "\tSeverity: sh:{}", result.severity)?;
            writeln!(f, "\tSource Shape: {}", result.source_shape)?;
            writeln!(f, "\tFocus Node: {}", result.focus_node)?;
            if let Some(value) = &result.value {
                writeln!(f, "\tValue Node: {value}")?;
            }
            if let Some(path) = &result.path {
                writeln!(f, "\tResult Path: {path}")?;
            }
            writeln!(f, "\tMessage: {}", result.message)?;
        }
        Ok(())
    }
}
