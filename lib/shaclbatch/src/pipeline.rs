//! One batch run: setup checks, validation of every document, persistence and counting.

use crate::batch::{BatchValidator, ValidationOutcome};
use crate::corpus::discover;
use crate::engine::{CoreEngine, EngineOptions, ShaclEngine, engine_by_name};
use crate::error::SetupError;
use crate::shapes::ShapeSet;
use crate::sink::{Persisted, ReportSink, RunSummary};
use oxrdfio::RdfFormat;
use std::fs;
use std::path::PathBuf;

/// Everything a run needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub shapes_path: PathBuf,
    pub output_dir: PathBuf,
    /// Extension of corpus documents, also used for the report graphs.
    pub extension: String,
    /// Name of the engine, looked up with [`engine_by_name`].
    pub engine: String,
    pub options: EngineOptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("rdf"),
            shapes_path: PathBuf::from("shacl/thesauri.ttl"),
            output_dir: PathBuf::from("generated/validation"),
            extension: "ttl".into(),
            engine: CoreEngine::NAME.into(),
            options: EngineOptions::default(),
        }
    }
}

type OutcomeCallback<'a> = Box<dyn FnMut(&ValidationOutcome, &Persisted) + 'a>;

/// A configured batch run.
///
/// ```no_run
/// use shaclbatch::{Pipeline, PipelineConfig};
///
/// let summary = Pipeline::new(PipelineConfig::default())
///     .on_outcome(|outcome, _| println!("{}", outcome.document.identity))
///     .run()?;
/// println!("Checked: {}, Failures: {}", summary.checked, summary.failed);
/// # Result::<_, shaclbatch::SetupError>::Ok(())
/// ```
pub struct Pipeline<'a> {
    config: PipelineConfig,
    engine: Option<Box<dyn ShaclEngine + 'a>>,
    on_outcome: Option<OutcomeCallback<'a>>,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            engine: None,
            on_outcome: None,
        }
    }

    /// Uses `engine` instead of looking `PipelineConfig::engine` up.
    #[must_use]
    pub fn with_engine(mut self, engine: impl ShaclEngine + 'a) -> Self {
        self.engine = Some(Box::new(engine));
        self
    }

    /// Called once per document, after its artifacts are written.
    #[must_use]
    pub fn on_outcome(mut self, callback: impl FnMut(&ValidationOutcome, &Persisted) + 'a) -> Self {
        self.on_outcome = Some(Box::new(callback));
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs the batch.
    ///
    /// A [`SetupError`] means nothing was validated and nothing was written. Per-document
    /// failures are only counted in the returned summary.
    pub fn run(self) -> Result<RunSummary, SetupError> {
        let Self {
            config,
            engine,
            mut on_outcome,
        } = self;

        if !config.data_dir.is_dir() {
            return Err(SetupError::MissingCorpus(config.data_dir));
        }
        if !config.shapes_path.is_file() {
            return Err(SetupError::MissingShapes(config.shapes_path));
        }
        let format = RdfFormat::from_extension(&config.extension)
            .ok_or_else(|| SetupError::UnsupportedExtension(config.extension.clone()))?;
        let engine = match engine {
            Some(engine) => engine,
            None => engine_by_name(&config.engine).ok_or_else(|| {
                SetupError::MissingEngine(format!("no engine is named '{}'", config.engine))
            })?,
        };
        let shapes = ShapeSet::load(&config.shapes_path)?;
        let documents = discover(&config.data_dir, &config.extension)?;
        fs::create_dir_all(&config.output_dir).map_err(|source| SetupError::OutputDirectory {
            path: config.output_dir.clone(),
            source,
        })?;

        tracing::info!(
            data_dir = %config.data_dir.display(),
            shapes = %config.shapes_path.display(),
            output_dir = %config.output_dir.display(),
            documents = documents.len(),
            engine = engine.name(),
            inference = %config.options.inference,
            advanced = config.options.advanced,
            "starting validation run"
        );

        let validator = BatchValidator::new(engine.as_ref(), &shapes, config.options);
        let sink = ReportSink::new(&config.output_dir, format);
        let mut summary = RunSummary::default();
        for outcome in validator.outcomes(documents) {
            let persisted = sink.persist(&outcome);
            summary.record(&outcome, &persisted);
            if let Some(callback) = &mut on_outcome {
                callback(&outcome, &persisted);
            }
        }

        tracing::info!(
            checked = summary.checked,
            failed = summary.failed,
            hard_failures = summary.hard_failures,
            persistence_warnings = summary.persistence_warnings,
            "validation run finished"
        );
        Ok(summary)
    }
}
