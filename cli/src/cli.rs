use clap::{Parser, ValueEnum, ValueHint};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(about, version, name = "shacl-batch")]
/// Validate every RDF document of a directory against a SHACL shapes graph
///
/// Two reports are written per document: `<name>_shacl_report.ttl` and
/// `<name>_shacl_report.txt`. The exit code is 0 if every document conforms, 1 if at least one
/// does not conform or could not be validated, and 2 if the run could not start.
pub struct Args {
    /// Directory the other relative paths are resolved against
    #[arg(long, default_value = ".", value_hint = ValueHint::DirPath)]
    pub root: PathBuf,
    /// Directory containing the documents to validate
    #[arg(long, default_value = "rdf", value_hint = ValueHint::DirPath)]
    pub data_dir: PathBuf,
    /// SHACL shapes file
    #[arg(long, default_value = "shacl/thesauri.ttl", value_hint = ValueHint::FilePath)]
    pub shapes: PathBuf,
    /// Directory in which the reports are written
    ///
    /// It is created if it does not exist.
    #[arg(long, default_value = "generated/validation", value_hint = ValueHint::DirPath)]
    pub output_dir: PathBuf,
    /// File extension of the documents
    ///
    /// It must name an RDF graph syntax (ttl, nt, rdf...).
    /// The report graphs are written in the same syntax.
    #[arg(long, default_value = "ttl")]
    pub extension: String,
    /// Constraint engine to use
    #[arg(long, default_value = "core")]
    pub engine: String,
    /// Do not compute the RDFS closure of documents before validating them
    #[arg(long)]
    pub no_inference: bool,
    /// Do not execute SHACL rules before validating
    #[arg(long)]
    pub no_advanced: bool,
    /// Also write the run counters to this JSON file
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub summary_json: Option<PathBuf>,
    /// Format of the diagnostic logs written to stderr
    ///
    /// The verbosity is controlled by the RUST_LOG environment variable.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}
