//! Core engine: feed -> timeline -> reports -> estimates -> labeled rows.

use tracing::{debug, info};

use crate::config::Config;
use crate::error::DatasetError;
use crate::frame::DatasetFrame;
use crate::labels;
use crate::normalize;
use crate::proportion;
use crate::timeline::Timeline;
use crate::types::*;

/// The labeled feature table for one project.
#[derive(Debug, Clone)]
pub struct Dataset {
  pub project: String,
  pub rows: Vec<DatasetRow>,
  pub tally: ReportTally,
}

/// The dataset builder. Stateless between runs; one `build` per project.
pub struct Engine {
  config: Config,
}

impl Engine {
  pub fn new(config: Config) -> Self {
    Self { config }
  }

  pub fn with_defaults() -> Self {
    Self::new(Config::default())
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  /// Build the labeled dataset for one project feed.
  pub fn build(&self, feed: &ProjectFeed) -> Result<Dataset, DatasetError> {
    if feed.project.trim().is_empty() {
      return Err(DatasetError::validation("project", "must not be empty"));
    }
    self.config.validate()?;

    let timeline = Timeline::build(&feed.releases, &self.config.tag_naming, self.config.subset_fraction)?;
    info!(
      project = %feed.project,
      released = timeline.released().len(),
      unreleased = timeline.unreleased().len(),
      analyzed = timeline.analyzed().len(),
      "timeline indexed"
    );

    let commits = normalize::normalize_commits(&feed.commits, &self.config)?;
    let inventories = normalize::normalize_inventories(&feed.inventories, &self.config)?;
    let mut frame = DatasetFrame::build(&timeline, &inventories, &commits)?;
    debug!(rows = frame.len(), commits = commits.len(), "feature rows built");

    let reports = normalize::normalize_defects(&feed.defects, &timeline, &commits)?;
    let mut tally = ReportTally {
      total: reports.len(),
      ..ReportTally::default()
    };

    // Phase one: drop reports that cannot take part in estimation at all.
    let candidates: Vec<DefectReport> = reports
      .into_iter()
      .filter(|report| match report.validate_before_estimation() {
        ReportStatus::Valid => true,
        status => {
          debug!(key = %report.key, ?status, "report filtered before estimation");
          tally.record(status);
          false
        }
      })
      .collect();

    let (completed, estimated) = proportion::estimate_all(candidates, &timeline, &self.config);
    tally.estimated = estimated;

    // Phase two happens inside propagation, against the analyzed range.
    let marked = labels::propagate(&mut frame, &completed, timeline.last_analyzed(), &mut tally);

    let rows = frame.into_rows();
    let buggy = rows.iter().filter(|r| r.buggy).count();
    info!(
      project = %feed.project,
      total = tally.total,
      valid = tally.valid,
      estimated = tally.estimated,
      null_version = tally.null_version,
      inconsistent = tally.inconsistent,
      null_empty = tally.null_empty,
      iv_is_fv = tally.iv_is_fv,
      empty_touched_files = tally.empty_touched_files,
      after_last_release = tally.after_last_release,
      "defect reports processed"
    );
    info!(rows = rows.len(), buggy, marked, "dataset labeled");

    Ok(Dataset {
      project: feed.project.clone(),
      rows,
      tally,
    })
  }
}
