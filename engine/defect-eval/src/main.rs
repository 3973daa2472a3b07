//! Binary entrypoint: read DatasetRow JSON lines from stdin, write
//! ExperimentResult JSON lines to stdout.
//!
//! With `--from-feed`, stdin is a whole project feed instead and the dataset
//! is built in-process first. Any malformed input or fit failure aborts the
//! run with a single ErrorOutput line and exit code 1.

use std::io::{self, BufRead, Read, Write};
use std::path::PathBuf;

use clap::Parser;
use defect_dataset::types::ErrorOutput;
use defect_dataset::{logging, DatasetRow, Engine, ProjectFeed};
use defect_eval::{Config, EvalError, Harness};

#[derive(Debug, Parser)]
#[command(name = "defect-eval", about = "Walk-forward evaluation of defect-prediction classifiers")]
struct Cli {
  /// Project name, used for the per-step dataset names. Defaults to the
  /// feed's project with `--from-feed`.
  #[arg(long)]
  project: Option<String>,
  /// TOML configuration file.
  #[arg(long)]
  config: Option<PathBuf>,
  /// Read a project feed and build the dataset before evaluating.
  #[arg(long)]
  from_feed: bool,
  /// Dataset builder TOML configuration (with `--from-feed`).
  #[arg(long, requires = "from_feed")]
  dataset_config: Option<PathBuf>,
  /// Debug-level logging (overridden by RUST_LOG).
  #[arg(short, long)]
  verbose: bool,
}

fn main() {
  let cli = Cli::parse();
  logging::init(cli.verbose);

  let stdout = io::stdout();
  let mut out = io::BufWriter::new(stdout.lock());

  if let Err(e) = run(&cli, &mut out) {
    tracing::error!(error = %e, "evaluation failed");
    let err = match &e {
      EvalError::Validation { field, reason } => ErrorOutput::new(reason.clone()).with_field(field.clone()),
      _ => ErrorOutput::new(e.to_string()),
    };
    let _ = serde_json::to_writer(&mut out, &err);
    let _ = writeln!(out);
    let _ = out.flush();
    std::process::exit(1);
  }

  let _ = out.flush();
}

fn run(cli: &Cli, out: &mut impl Write) -> Result<(), EvalError> {
  let config = Config::load(cli.config.as_deref())?;

  let (project, rows) = if cli.from_feed {
    let dataset_config = defect_dataset::Config::load(cli.dataset_config.as_deref())?;
    let mut raw = String::new();
    io::stdin().lock().read_to_string(&mut raw)?;
    let feed: ProjectFeed = serde_json::from_str(&raw)?;
    let dataset = Engine::new(dataset_config).build(&feed)?;
    (cli.project.clone().unwrap_or(dataset.project), dataset.rows)
  } else {
    let project = cli
      .project
      .clone()
      .ok_or_else(|| EvalError::validation("project", "required when reading dataset rows"))?;
    (project, read_rows(io::stdin().lock())?)
  };

  let results = Harness::new(config).run(&project, &rows)?;
  for result in &results {
    serde_json::to_writer(&mut *out, result)?;
    writeln!(out)?;
  }
  Ok(())
}

fn read_rows(input: impl BufRead) -> Result<Vec<DatasetRow>, EvalError> {
  let mut rows = Vec::new();
  for (n, line) in input.lines().enumerate() {
    let line = line?;
    // Skip blank lines.
    let trimmed = line.trim();
    if trimmed.is_empty() {
      continue;
    }
    let row: DatasetRow = serde_json::from_str(trimmed)
      .map_err(|e| EvalError::validation("rows", &format!("line {}: {}", n + 1, e)))?;
    rows.push(row);
  }
  Ok(rows)
}
