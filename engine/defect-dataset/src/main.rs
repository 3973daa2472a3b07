//! Binary entrypoint: read one project feed from stdin, write DatasetRow JSON lines to stdout.
//!
//! On failure a single ErrorOutput line is written instead and the exit code is 1.

use std::io::{self, Read, Write};
use std::path::PathBuf;

use clap::Parser;
use defect_dataset::types::ErrorOutput;
use defect_dataset::{logging, Config, DatasetError, Engine, ProjectFeed};

#[derive(Debug, Parser)]
#[command(name = "defect-dataset", about = "Build a labeled defect dataset from a mined project feed")]
struct Cli {
  /// TOML configuration file.
  #[arg(long)]
  config: Option<PathBuf>,
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
    tracing::error!(error = %e, "dataset build failed");
    let err = match &e {
      DatasetError::Validation { field, reason } => ErrorOutput::new(reason.clone()).with_field(field.clone()),
      _ => ErrorOutput::new(e.to_string()),
    };
    let _ = serde_json::to_writer(&mut out, &err);
    let _ = writeln!(out);
    let _ = out.flush();
    std::process::exit(1);
  }

  let _ = out.flush();
}

fn run(cli: &Cli, out: &mut impl Write) -> Result<(), DatasetError> {
  let config = Config::load(cli.config.as_deref())?;

  let mut raw = String::new();
  io::stdin().lock().read_to_string(&mut raw)?;
  let feed: ProjectFeed = serde_json::from_str(&raw)?;

  let dataset = Engine::new(config).build(&feed)?;
  for row in &dataset.rows {
    serde_json::to_writer(&mut *out, row)?;
    writeln!(out)?;
  }
  Ok(())
}
