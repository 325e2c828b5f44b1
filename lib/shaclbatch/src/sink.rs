//! Report persistence and verdict aggregation.

use crate::batch::{OutcomeStatus, ValidationOutcome};
use crate::error::PersistenceWarning;
use crate::vocab::sh;
use oxrdf::vocab::{rdf, rdfs, xsd};
use oxrdf::{BlankNode, Graph, Literal, Triple};
use oxrdfio::{RdfFormat, RdfSerializer};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes the two artifacts of every outcome into one directory.
#[derive(Debug, Clone)]
pub struct ReportSink {
    output_dir: PathBuf,
    format: RdfFormat,
}

/// Where the artifacts of one outcome went.
#[derive(Debug)]
pub struct Persisted {
    pub graph_path: PathBuf,
    pub text_path: PathBuf,
    /// One entry per artifact that could not be written.
    pub warnings: Vec<PersistenceWarning>,
}

impl ReportSink {
    pub fn new(output_dir: impl Into<PathBuf>, format: RdfFormat) -> Self {
        Self {
            output_dir: output_dir.into(),
            format,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Writes both artifacts. Failures are collected, never raised.
    pub fn persist(&self, outcome: &ValidationOutcome) -> Persisted {
        let identity = &outcome.document.identity;
        let graph_path = self.output_dir.join(format!(
            "{identity}_shacl_report.{}",
            self.format.file_extension()
        ));
        let text_path = self.output_dir.join(format!("{identity}_shacl_report.txt"));

        let mut warnings = Vec::new();
        let graph = match &outcome.status {
            OutcomeStatus::Validated {
                report_graph: Some(graph),
                ..
            } => self.write_graph(&graph_path, graph),
            _ => self.write_graph(&graph_path, &minimal_report(outcome)),
        };
        if let Err(source) = graph {
            warnings.push(PersistenceWarning {
                path: graph_path.clone(),
                source,
            });
        }
        if let Err(source) = fs::write(&text_path, outcome.explanation()) {
            warnings.push(PersistenceWarning {
                path: text_path.clone(),
                source,
            });
        }
        for warning in &warnings {
            tracing::warn!(document = identity, error = %warning, "failed to write report");
        }
        Persisted {
            graph_path,
            text_path,
            warnings,
        }
    }

    fn write_graph(&self, path: &Path, graph: &Graph) -> io::Result<()> {
        let mut serializer = RdfSerializer::from_format(self.format);
        for (name, iri) in [
            ("sh", sh::NAMESPACE),
            ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
            ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
            ("xsd", "http://www.w3.org/2001/XMLSchema#"),
        ] {
            serializer = serializer
                .with_prefix(name, iri)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        }
        let mut writer = serializer.for_writer(BufWriter::new(File::create(path)?));
        for triple in graph {
            writer.serialize_triple(triple)?;
        }
        writer.finish()?.flush()
    }
}

/// The report graph of an outcome that has no engine graph: not conforming unless the engine
/// said otherwise, with the explanation as a comment.
fn minimal_report(outcome: &ValidationOutcome) -> Graph {
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
        Literal::new_typed_literal(outcome.conforms().to_string(), xsd::BOOLEAN),
    ));
    if outcome.is_hard_failure() {
        graph.insert(&Triple::new(
            report,
            rdfs::COMMENT,
            Literal::new_simple_literal(outcome.explanation().trim_end()),
        ));
    }
    graph
}

/// Counters of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub checked: usize,
    /// Non-conforming documents, hard failures included.
    pub failed: usize,
    pub hard_failures: usize,
    pub persistence_warnings: usize,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &ValidationOutcome, persisted: &Persisted) {
        self.checked += 1;
        if !outcome.conforms() {
            self.failed += 1;
        }
        if outcome.is_hard_failure() {
            self.hard_failures += 1;
        }
        self.persistence_warnings += persisted.warnings.len();
    }

    pub fn status(&self) -> RunStatus {
        if self.failed > 0 {
            RunStatus::Failure
        } else {
            RunStatus::Success
        }
    }
}

/// The process exit status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    Failure,
    SetupError,
}

impl RunStatus {
    pub fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            Self::SetupError => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Document;
    use crate::error::DocumentParseError;
    use crate::loader::{GraphKind, load_graph};

    fn outcome(dir: &Path, status: OutcomeStatus) -> ValidationOutcome {
        ValidationOutcome {
            document: Document {
                identity: "doc".into(),
                path: dir.join("doc.ttl"),
                format: RdfFormat::Turtle,
            },
            status,
        }
    }

    #[test]
    fn hard_failures_get_both_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let sink = ReportSink::new(dir.path(), RdfFormat::Turtle);
        let failed = outcome(
            dir.path(),
            OutcomeStatus::ParseFailed(DocumentParseError::Io(io::Error::other("boom"))),
        );

        let persisted = sink.persist(&failed);
        assert!(persisted.warnings.is_empty());
        assert_eq!(persisted.graph_path, dir.path().join("doc_shacl_report.ttl"));
        let text = fs::read_to_string(&persisted.text_path).unwrap();
        assert!(text.starts_with("PARSING ERROR in "));
        assert!(text.ends_with(": boom\n"));
        let report = load_graph(&persisted.graph_path, RdfFormat::Turtle, GraphKind::Data).unwrap();
        let conforms = report.triples_for_predicate(sh::CONFORMS).next().unwrap();
        assert_eq!(
            conforms.object.to_string(),
            "\"false\"^^<http://www.w3.org/2001/XMLSchema#boolean>"
        );
        assert_eq!(report.triples_for_predicate(rdfs::COMMENT).count(), 1);
    }

    #[test]
    fn unwritable_directory_only_warns() {
        let dir = tempfile::tempdir().unwrap();
        let sink = ReportSink::new(dir.path().join("missing"), RdfFormat::Turtle);
        let validated = outcome(
            dir.path(),
            OutcomeStatus::Validated {
                conforms: true,
                report_graph: None,
                text: "Validation Report\nConforms: True\n".into(),
            },
        );

        let persisted = sink.persist(&validated);
        assert_eq!(persisted.warnings.len(), 2);

        let mut summary = RunSummary::default();
        summary.record(&validated, &persisted);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.persistence_warnings, 2);
        assert_eq!(summary.status(), RunStatus::Success);
    }

    #[test]
    fn failures_drive_the_status() {
        let dir = tempfile::tempdir().unwrap();
        let persisted = Persisted {
            graph_path: dir.path().join("a"),
            text_path: dir.path().join("b"),
            warnings: Vec::new(),
        };
        let mut summary = RunSummary::default();
        summary.record(
            &outcome(
                dir.path(),
                OutcomeStatus::Validated {
                    conforms: false,
                    report_graph: None,
                    text: String::new(),
                },
            ),
            &persisted,
        );
        summary.record(
            &outcome(
                dir.path(),
                OutcomeStatus::ParseFailed(DocumentParseError::Io(io::Error::other("x"))),
            ),
            &persisted,
        );
        assert_eq!(
            summary,
            RunSummary {
                checked: 2,
                failed: 2,
                hard_failures: 1,
                persistence_warnings: 0,
            }
        );
        assert_eq!(summary.status().code(), 1);
        assert_eq!(RunStatus::SetupError.code(), 2);
    }
}
