//! Validation of every corpus document against one shape set.

use crate::corpus::Document;
use crate::engine::{EngineOptions, ShaclEngine};
use crate::error::{DocumentParseError, EngineError};
use crate::shapes::ShapeSet;
use oxrdf::Graph;

/// How the validation of one document ended.
#[derive(Debug)]
pub enum OutcomeStatus {
    /// The engine ran and gave a verdict.
    Validated {
        conforms: bool,
        report_graph: Option<Graph>,
        text: String,
    },
    ParseFailed(DocumentParseError),
    EngineFailed(EngineError),
}

/// The result of validating one document.
#[derive(Debug)]
pub struct ValidationOutcome {
    pub document: Document,
    pub status: OutcomeStatus,
}

impl ValidationOutcome {
    /// Hard failures never conform.
    pub fn conforms(&self) -> bool {
        matches!(self.status, OutcomeStatus::Validated { conforms: true, .. })
    }

    /// The document could not be validated at all.
    pub fn is_hard_failure(&self) -> bool {
        !matches!(self.status, OutcomeStatus::Validated { .. })
    }

    /// The text persisted next to the document: the engine explanation, or the error line.
    pub fn explanation(&self) -> String {
        let path = self.document.path.display();
        match &self.status {
            OutcomeStatus::Validated { text, .. } => text.clone(),
            OutcomeStatus::ParseFailed(e) => format!("PARSING ERROR in {path}: {e}\n"),
            OutcomeStatus::EngineFailed(e) => format!("VALIDATION ERROR in {path}: {e}\n"),
        }
    }
}

/// Validates documents one at a time.
pub struct BatchValidator<'a> {
    engine: &'a dyn ShaclEngine,
    shapes: &'a ShapeSet,
    options: EngineOptions,
}

impl<'a> BatchValidator<'a> {
    pub fn new(engine: &'a dyn ShaclEngine, shapes: &'a ShapeSet, options: EngineOptions) -> Self {
        Self {
            engine,
            shapes,
            options,
        }
    }

    /// Parses and validates a single document. The parsed graph is dropped before returning.
    pub fn validate(&self, document: Document) -> ValidationOutcome {
        let status = match document.parse() {
            Ok(graph) => {
                tracing::debug!(
                    document = document.identity,
                    triples = graph.len(),
                    engine = self.engine.name(),
                    "validating document"
                );
                match self.engine.evaluate(&graph, self.shapes, &self.options) {
                    Ok(result) => OutcomeStatus::Validated {
                        conforms: result.conforms,
                        report_graph: result.report_graph,
                        text: result.report_text,
                    },
                    Err(e) => {
                        tracing::warn!(document = document.identity, error = %e, "engine failure");
                        OutcomeStatus::EngineFailed(e)
                    }
                }
            }
            Err(e) => {
                tracing::warn!(document = document.identity, error = %e, "parse failure");
                OutcomeStatus::ParseFailed(e)
            }
        };
        ValidationOutcome { document, status }
    }

    /// Lazily validates `documents` in order.
    pub fn outcomes(
        &self,
        documents: impl IntoIterator<Item = Document>,
    ) -> impl Iterator<Item = ValidationOutcome> {
        documents.into_iter().map(|document| self.validate(document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CoreEngine;
    use oxrdfio::RdfFormat;
    use std::fs;
    use std::path::Path;

    const SHAPES: &str = "
        @prefix sh: <http://www.w3.org/ns/shacl#> .
        @prefix ex: <http://example.com/> .
        ex:ConceptShape a sh:NodeShape ;
            sh:targetClass ex:Concept ;
            sh:property [ sh:path ex:label ; sh:minCount 1 ] .
    ";

    fn document(dir: &Path, identity: &str, content: &str) -> Document {
        let path = dir.join(format!("{identity}.ttl"));
        fs::write(&path, content).unwrap();
        Document {
            identity: identity.into(),
            path,
            format: RdfFormat::Turtle,
        }
    }

    #[test]
    fn classifies_each_document_independently() {
        let dir = tempfile::tempdir().unwrap();
        let shapes = ShapeSet::from_turtle(SHAPES).unwrap();
        let engine = CoreEngine::default();
        let validator = BatchValidator::new(&engine, &shapes, EngineOptions::default());
        let documents = vec![
            document(
                dir.path(),
                "a",
                "<http://example.com/a> a <http://example.com/Concept> ; <http://example.com/label> \"A\" .",
            ),
            document(
                dir.path(),
                "b",
                "<http://example.com/b> a <http://example.com/Concept> .",
            ),
            document(dir.path(), "c", "<http://example.com/c> a ."),
        ];

        let outcomes = validator.outcomes(documents).collect::<Vec<_>>();
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].conforms());
        assert!(!outcomes[1].conforms());
        assert!(!outcomes[1].is_hard_failure());
        assert!(outcomes[2].is_hard_failure());
        assert!(
            outcomes[2]
                .explanation()
                .starts_with(&format!("PARSING ERROR in {}: ", dir.path().join("c.ttl").display()))
        );
    }

    #[test]
    fn engine_errors_are_hard_failures() {
        let dir = tempfile::tempdir().unwrap();
        let shapes = ShapeSet::from_turtle(
            r#"
            @prefix sh: <http://www.w3.org/ns/shacl#> .
            @prefix ex: <http://example.com/> .
            ex:S sh:targetSubjectsOf ex:code ; sh:property [ sh:path ex:code ; sh:pattern "[" ] .
            "#,
        )
        .unwrap();
        let engine = CoreEngine::default();
        let validator = BatchValidator::new(&engine, &shapes, EngineOptions::default());
        let outcome = validator.validate(document(
            dir.path(),
            "x",
            "<http://example.com/x> <http://example.com/code> \"1\" .",
        ));
        assert!(outcome.is_hard_failure());
        let explanation = outcome.explanation();
        assert!(explanation.starts_with("VALIDATION ERROR in "));
        assert!(explanation.ends_with('\n'));
    }
}
