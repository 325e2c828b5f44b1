//! End-to-end runs of the `shacl-batch` binary.

use anyhow::Result;
use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::prelude::*;
use predicates::prelude::*;

const SHAPES: &str = r#"
@prefix sh: <http://www.w3.org/ns/shacl#> .
@prefix skos: <http://www.w3.org/2004/02/skos/core#> .

[] a sh:NodeShape ;
    sh:targetClass skos:Concept ;
    sh:property [ sh:path skos:prefLabel ; sh:minCount 1 ] .
"#;

const CONFORMANT: &str = r#"
@prefix skos: <http://www.w3.org/2004/02/skos/core#> .
<http://example.com/a> a skos:Concept ; skos:prefLabel "A" .
"#;

const VIOLATING: &str = r#"
@prefix skos: <http://www.w3.org/2004/02/skos/core#> .
<http://example.com/b> a skos:Concept .
"#;

fn cli_command() -> Result<Command> {
    Ok(Command::cargo_bin("shacl-batch")?)
}

fn project(documents: &[(&str, &str)]) -> Result<TempDir> {
    let root = TempDir::new()?;
    root.child("shacl/thesauri.ttl").write_str(SHAPES)?;
    root.child("rdf").create_dir_all()?;
    for (name, content) in documents {
        root.child("rdf").child(name).write_str(content)?;
    }
    Ok(root)
}

#[test]
fn cli_help() -> Result<()> {
    cli_command()?
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--shapes"));
    Ok(())
}

#[test]
fn all_documents_conform() -> Result<()> {
    let root = project(&[("a.ttl", CONFORMANT)])?;
    cli_command()?
        .arg("--root")
        .arg(root.path())
        .assert()
        .code(0)
        .stdout(predicate::str::contains("[PASS] "))
        .stdout(predicate::str::ends_with("Checked: 1, Failures: 0\n"));
    root.child("generated/validation/a_shacl_report.ttl")
        .assert(predicate::path::is_file());
    root.child("generated/validation/a_shacl_report.txt")
        .assert("Validation Report\nConforms: True\n");
    Ok(())
}

#[test]
fn mixed_corpus_fails() -> Result<()> {
    let root = project(&[
        ("a.ttl", CONFORMANT),
        ("b.ttl", VIOLATING),
        ("c.ttl", "<http://example.com/c> a ."),
    ])?;
    let output = root.path().join("generated/validation");
    cli_command()?
        .arg("--root")
        .arg(root.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains(format!(
            "[PASS] {} -> {}",
            root.path().join("rdf/a.ttl").display(),
            output.join("a_shacl_report.txt").display()
        )))
        .stdout(predicate::str::contains(format!(
            "[FAIL] {} -> {}",
            root.path().join("rdf/b.ttl").display(),
            output.join("b_shacl_report.txt").display()
        )))
        .stdout(predicate::str::contains(format!(
            "PARSING ERROR in {}: ",
            root.path().join("rdf/c.ttl").display()
        )))
        .stdout(predicate::str::ends_with("Checked: 3, Failures: 2\n"))
        .stdout(predicate::str::contains("\n\n").not());
    for name in ["a", "b", "c"] {
        root.child(format!("generated/validation/{name}_shacl_report.ttl"))
            .assert(predicate::path::is_file());
        root.child(format!("generated/validation/{name}_shacl_report.txt"))
            .assert(predicate::path::is_file());
    }
    root.child("generated/validation/c_shacl_report.txt")
        .assert(predicate::str::starts_with("PARSING ERROR in "));
    Ok(())
}

#[test]
fn missing_shapes_is_a_setup_error() -> Result<()> {
    let root = project(&[("a.ttl", CONFORMANT)])?;
    cli_command()?
        .arg("--root")
        .arg(root.path())
        .arg("--shapes")
        .arg("shacl/other.ttl")
        .assert()
        .code(2)
        .stdout("")
        .stderr(predicate::str::contains("ERROR: SHACL shapes file not found: "));
    root.child("generated").assert(predicate::path::missing());
    Ok(())
}

#[test]
fn missing_corpus_is_a_setup_error() -> Result<()> {
    let root = TempDir::new()?;
    root.child("shacl/thesauri.ttl").write_str(SHAPES)?;
    cli_command()?
        .arg("--root")
        .arg(root.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("ERROR: RDF directory not found: "));
    Ok(())
}

#[test]
fn unknown_engine_is_a_setup_error() -> Result<()> {
    let root = project(&[("a.ttl", CONFORMANT)])?;
    cli_command()?
        .arg("--root")
        .arg(root.path())
        .arg("--engine")
        .arg("pyshacl")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("ERROR: No constraint engine is available"));
    Ok(())
}

#[test]
fn summary_json() -> Result<()> {
    let root = project(&[("a.ttl", CONFORMANT), ("b.ttl", VIOLATING)])?;
    let summary = root.child("summary.json");
    cli_command()?
        .arg("--root")
        .arg(root.path())
        .arg("--summary-json")
        .arg(summary.path())
        .assert()
        .code(1);
    let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(summary.path())?)?;
    assert_eq!(value["checked"], 2);
    assert_eq!(value["failed"], 1);
    assert_eq!(value["hard_failures"], 0);
    Ok(())
}

#[test]
fn json_logs_go_to_stderr() -> Result<()> {
    let root = project(&[("a.ttl", CONFORMANT)])?;
    cli_command()?
        .arg("--root")
        .arg(root.path())
        .arg("--log-format")
        .arg("json")
        .env("RUST_LOG", "info")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("{").not())
        .stderr(predicate::str::contains("\"validation run finished\""));
    Ok(())
}
