use shaclbatch::{
    EngineError, EngineOptions, EngineResult, Pipeline, PipelineConfig, RunStatus, SetupError,
    ShaclEngine, ShapeSet,
};
use oxrdf::Graph;
use std::error::Error;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const SHAPES: &str = r#"
@prefix sh: <http://www.w3.org/ns/shacl#> .
@prefix skos: <http://www.w3.org/2004/02/skos/core#> .
@prefix ex: <http://example.com/shapes#> .

ex:ConceptShape a sh:NodeShape ;
    sh:targetClass skos:Concept ;
    sh:property [
        sh:path skos:prefLabel ;
        sh:minCount 1 ;
        sh:message "A concept needs a preferred label" ;
    ] .
"#;

const CONFORMANT: &str = r#"
@prefix skos: <http://www.w3.org/2004/02/skos/core#> .
<http://example.com/a> a skos:Concept ; skos:prefLabel "A"@en .
"#;

const VIOLATING: &str = r#"
@prefix skos: <http://www.w3.org/2004/02/skos/core#> .
<http://example.com/b> a skos:Concept .
"#;

const MALFORMED: &str = "<http://example.com/c> a .";

fn workspace(documents: &[(&str, &str)]) -> Result<TempDir, Box<dyn Error>> {
    let root = tempfile::tempdir()?;
    fs::create_dir_all(root.path().join("rdf"))?;
    fs::create_dir_all(root.path().join("shacl"))?;
    fs::write(root.path().join("shacl/thesauri.ttl"), SHAPES)?;
    for (name, content) in documents {
        fs::write(root.path().join("rdf").join(name), content)?;
    }
    Ok(root)
}

fn config(root: &Path) -> PipelineConfig {
    PipelineConfig {
        data_dir: root.join("rdf"),
        shapes_path: root.join("shacl/thesauri.ttl"),
        output_dir: root.join("generated/validation"),
        ..PipelineConfig::default()
    }
}

fn artifacts(root: &Path) -> Result<Vec<String>, Box<dyn Error>> {
    let mut names = fs::read_dir(root.join("generated/validation"))?
        .map(|entry| Ok(entry?.file_name().to_string_lossy().into_owned()))
        .collect::<Result<Vec<_>, std::io::Error>>()?;
    names.sort();
    Ok(names)
}

#[test]
fn mixed_corpus() -> Result<(), Box<dyn Error>> {
    let root = workspace(&[
        ("a.ttl", CONFORMANT),
        ("b.ttl", VIOLATING),
        ("c.ttl", MALFORMED),
        ("readme.md", "not a document"),
    ])?;
    let mut seen = Vec::new();
    let summary = Pipeline::new(config(root.path()))
        .on_outcome(|outcome, persisted| {
            seen.push((
                outcome.document.identity.clone(),
                outcome.conforms(),
                outcome.is_hard_failure(),
                persisted.warnings.len(),
            ));
        })
        .run()?;

    assert_eq!(summary.checked, 3);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.hard_failures, 1);
    assert_eq!(summary.status(), RunStatus::Failure);
    assert_eq!(
        seen,
        [
            ("a".to_owned(), true, false, 0),
            ("b".to_owned(), false, false, 0),
            ("c".to_owned(), false, true, 0),
        ]
    );
    assert_eq!(
        artifacts(root.path())?,
        [
            "a_shacl_report.ttl",
            "a_shacl_report.txt",
            "b_shacl_report.ttl",
            "b_shacl_report.txt",
            "c_shacl_report.ttl",
            "c_shacl_report.txt",
        ]
    );

    let out = root.path().join("generated/validation");
    assert_eq!(
        fs::read_to_string(out.join("a_shacl_report.txt"))?,
        "Validation Report\nConforms: True\n"
    );
    let b = fs::read_to_string(out.join("b_shacl_report.txt"))?;
    assert!(b.starts_with("Validation Report\nConforms: False\nResults (1):\n"));
    assert!(b.contains("\tMessage: A concept needs a preferred label\n"));
    let c = fs::read_to_string(out.join("c_shacl_report.txt"))?;
    assert!(c.starts_with(&format!(
        "PARSING ERROR in {}: ",
        root.path().join("rdf/c.ttl").display()
    )));
    assert!(c.ends_with('\n') && !c.ends_with("\n\n"));
    Ok(())
}

#[test]
fn reruns_write_identical_reports() -> Result<(), Box<dyn Error>> {
    let root = workspace(&[("a.ttl", CONFORMANT), ("b.ttl", VIOLATING)])?;
    let out = root.path().join("generated/validation");

    let first = Pipeline::new(config(root.path())).run()?;
    let texts = [
        fs::read(out.join("a_shacl_report.txt"))?,
        fs::read(out.join("b_shacl_report.txt"))?,
        fs::read(out.join("b_shacl_report.ttl"))?,
    ];
    let second = Pipeline::new(config(root.path())).run()?;

    assert_eq!(first, second);
    assert_eq!(texts[0], fs::read(out.join("a_shacl_report.txt"))?);
    assert_eq!(texts[1], fs::read(out.join("b_shacl_report.txt"))?);
    assert_eq!(texts[2], fs::read(out.join("b_shacl_report.ttl"))?);
    Ok(())
}

#[test]
fn subclass_instances_are_targeted() -> Result<(), Box<dyn Error>> {
    let document = r#"
        @prefix skos: <http://www.w3.org/2004/02/skos/core#> .
        @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
        <http://example.com/Top> rdfs:subClassOf skos:Concept .
        <http://example.com/t> a <http://example.com/Top> .
    "#;
    let root = workspace(&[("t.ttl", document)])?;
    let summary = Pipeline::new(config(root.path())).run()?;
    assert_eq!(summary.failed, 1);
    Ok(())
}

#[test]
fn missing_shapes_write_nothing() -> Result<(), Box<dyn Error>> {
    let root = workspace(&[("a.ttl", CONFORMANT)])?;
    fs::remove_file(root.path().join("shacl/thesauri.ttl"))?;

    let error = Pipeline::new(config(root.path())).run().unwrap_err();
    assert!(matches!(error, SetupError::MissingShapes(_)));
    assert!(!root.path().join("generated").exists());
    Ok(())
}

#[test]
fn missing_corpus_is_checked_first() -> Result<(), Box<dyn Error>> {
    let root = tempfile::tempdir()?;
    let error = Pipeline::new(config(root.path())).run().unwrap_err();
    assert!(matches!(error, SetupError::MissingCorpus(_)));
    Ok(())
}

#[test]
fn unknown_engine_is_a_setup_error() -> Result<(), Box<dyn Error>> {
    let root = workspace(&[("a.ttl", CONFORMANT)])?;
    let error = Pipeline::new(PipelineConfig {
        engine: "pyshacl".into(),
        ..config(root.path())
    })
    .run()
    .unwrap_err();
    assert!(matches!(error, SetupError::MissingEngine(_)));
    assert!(!root.path().join("generated").exists());
    Ok(())
}

#[test]
fn empty_corpus_passes() -> Result<(), Box<dyn Error>> {
    let root = workspace(&[])?;
    let summary = Pipeline::new(config(root.path())).run()?;
    assert_eq!(summary.checked, 0);
    assert_eq!(summary.status(), RunStatus::Success);
    assert!(artifacts(root.path())?.is_empty());
    Ok(())
}

/// An engine without report graphs, to check the sink falls back to a minimal one.
struct TextOnly;

impl ShaclEngine for TextOnly {
    fn name(&self) -> &str {
        "text-only"
    }

    fn evaluate(
        &self,
        _data: &Graph,
        _shapes: &ShapeSet,
        _options: &EngineOptions,
    ) -> Result<EngineResult, EngineError> {
        Ok(EngineResult {
            conforms: true,
            report_graph: None,
            report_text: "ok\n".into(),
        })
    }
}

#[test]
fn injected_engines_without_graphs() -> Result<(), Box<dyn Error>> {
    let root = workspace(&[("b.ttl", VIOLATING)])?;
    let summary = Pipeline::new(config(root.path()))
        .with_engine(TextOnly)
        .run()?;
    assert_eq!(summary.failed, 0);
    let out = root.path().join("generated/validation");
    assert_eq!(fs::read_to_string(out.join("b_shacl_report.txt"))?, "ok\n");
    let graph = fs::read_to_string(out.join("b_shacl_report.ttl"))?;
    assert!(graph.contains("ValidationReport"));
    Ok(())
}
