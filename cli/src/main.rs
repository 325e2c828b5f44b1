#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use anyhow::Context;
use clap::Parser;
use cli::{Args, LogFormat};
use shaclbatch::{
    EngineOptions, Inference, OutcomeStatus, Persisted, Pipeline, PipelineConfig, RunStatus,
    RunSummary, ValidationOutcome,
};
use std::fs::File;
use std::io::{BufWriter, Write, stderr};
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.log_format);
    match run(&args) {
        Ok(status) => ExitCode::from(status.code()),
        Err(e) => {
            tracing::error!(error = %e, "validation run aborted");
            eprintln!("ERROR: {e}");
            ExitCode::from(RunStatus::SetupError.code())
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error"));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry.with(fmt::layer().with_writer(stderr)).init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(stderr))
            .init(),
    }
}

fn config(args: &Args) -> PipelineConfig {
    PipelineConfig {
        data_dir: args.root.join(&args.data_dir),
        shapes_path: args.root.join(&args.shapes),
        output_dir: args.root.join(&args.output_dir),
        extension: args.extension.clone(),
        engine: args.engine.clone(),
        options: EngineOptions {
            inference: if args.no_inference {
                Inference::None
            } else {
                Inference::Rdfs
            },
            advanced: !args.no_advanced,
        },
    }
}

fn run(args: &Args) -> anyhow::Result<RunStatus> {
    let summary = Pipeline::new(config(args)).on_outcome(print_outcome).run()?;
    println!("Checked: {}, Failures: {}", summary.checked, summary.failed);
    if let Some(path) = &args.summary_json {
        // Never changes the exit status.
        if let Err(e) = write_summary(path, &summary) {
            eprintln!("WARNING: {e:#}");
        }
    }
    Ok(summary.status())
}

fn print_outcome(outcome: &ValidationOutcome, persisted: &Persisted) {
    let input = outcome.document.path.display();
    match &outcome.status {
        OutcomeStatus::Validated { conforms, .. } => println!(
            "[{}] {input} -> {}",
            if *conforms { "PASS" } else { "FAIL" },
            persisted.text_path.display()
        ),
        OutcomeStatus::ParseFailed(_) | OutcomeStatus::EngineFailed(_) => {
            print!("{}", outcome.explanation());
        }
    }
    for warning in &persisted.warnings {
        println!("WARNING: Failed to write reports for {input}: {warning}");
    }
}

fn write_summary(path: &Path, summary: &RunSummary) -> anyhow::Result<()> {
    let mut writer = BufWriter::new(
        File::create(path)
            .with_context(|| format!("Failed to create the summary file {}", path.display()))?,
    );
    serde_json::to_writer_pretty(&mut writer, summary)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
