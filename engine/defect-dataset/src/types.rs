//! Core types for the dataset builder (JSON contracts + internal models).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Inbound types (JSON contract: what the mining collaborators send)
// ---------------------------------------------------------------------------

/// The whole mined history of one project. Unknown fields are silently ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectFeed {
  pub project: String,
  pub releases: Vec<InboundRelease>,
  #[serde(default)]
  pub inventories: Vec<InboundInventory>,
  #[serde(default)]
  pub commits: Vec<InboundCommit>,
  #[serde(default)]
  pub defects: Vec<InboundDefect>,
}

/// One tracker version. `date` is RFC3339 or `YYYY-MM-DD`.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundRelease {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub date: Option<String>,
  pub released: bool,
}

/// Files present at a release's revision, keyed by tracker version name.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundInventory {
  pub release: String,
  pub files: Vec<InboundFile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InboundFile {
  pub path: String,
  pub created: String,
  #[serde(default)]
  pub code_lines: u64,
  #[serde(default)]
  pub comment_lines: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InboundCommit {
  pub sha: String,
  pub author: String,
  pub date: String,
  #[serde(default)]
  pub message: String,
  #[serde(default)]
  pub files: Vec<InboundFileChange>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InboundFileChange {
  pub path: String,
  #[serde(default)]
  pub added: u64,
  #[serde(default)]
  pub deleted: u64,
}

/// One defect report as retrieved from the tracker.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundDefect {
  pub id: String,
  /// Tracker key, e.g. "AVRO-1234".
  pub key: String,
  pub created: String,
  #[serde(default)]
  pub affected_versions: Vec<String>,
  #[serde(default)]
  pub fix_versions: Vec<String>,
}

// ---------------------------------------------------------------------------
// Releases
// ---------------------------------------------------------------------------

/// A version on the project timeline. Released versions are indexed 1..=n by
/// date; every unreleased version shares index n+1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
  pub index: u32,
  pub id: String,
  /// Tracker display name.
  pub name: String,
  /// Derived SCM tag.
  pub tag: String,
  pub date: Option<DateTime<Utc>>,
  pub released: bool,
}

// ---------------------------------------------------------------------------
// Commits
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TouchedFile {
  pub path: String,
  pub added: u64,
  pub deleted: u64,
  /// Number of other tracked files touched by the same commit.
  pub concurrent_change_set: u64,
}

impl TouchedFile {
  /// Added minus deleted lines.
  pub fn churn(&self) -> i64 {
    self.added as i64 - self.deleted as i64
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
  pub sha: String,
  pub author: String,
  pub date: DateTime<Utc>,
  pub message: String,
  pub touched: Vec<TouchedFile>,
}

// ---------------------------------------------------------------------------
// File inventory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SourceFile {
  pub path: String,
  pub created: DateTime<Utc>,
  pub code_lines: u64,
  pub comment_lines: u64,
}

#[derive(Debug, Clone)]
pub struct Inventory {
  /// Tracker version name.
  pub release: String,
  pub files: Vec<SourceFile>,
}

// ---------------------------------------------------------------------------
// Defect reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct DefectReport {
  pub id: String,
  pub key: String,
  /// Numeric suffix of the tracker key; reports are processed in this order.
  pub sequence: u64,
  pub created: DateTime<Utc>,
  pub opening: Option<Release>,
  pub fix: Option<Release>,
  pub injected: Option<Release>,
  /// True once the injected version came from the proportion estimate.
  pub injected_estimated: bool,
  /// Distinct tracked files touched by the report's commits, first-seen order.
  pub touched_files: Vec<String>,
  pub commits: Vec<Commit>,
}

/// Outcome of a report validity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
  /// Opening or fix version unknown.
  NullVersion,
  /// Version indices out of order.
  Inconsistent,
  /// No injected version and no referencing commits.
  NullEmpty,
  IvIsFv,
  EmptyTouchedFiles,
  /// Injected version lies beyond the last analyzed release.
  AfterLastRelease,
  Valid,
}

/// Per-status counts across both filter phases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportTally {
  pub total: usize,
  pub null_version: usize,
  pub inconsistent: usize,
  pub null_empty: usize,
  pub iv_is_fv: usize,
  pub empty_touched_files: usize,
  pub after_last_release: usize,
  pub estimated: usize,
  pub valid: usize,
}

impl ReportTally {
  pub fn record(&mut self, status: ReportStatus) {
    match status {
      ReportStatus::NullVersion => self.null_version += 1,
      ReportStatus::Inconsistent => self.inconsistent += 1,
      ReportStatus::NullEmpty => self.null_empty += 1,
      ReportStatus::IvIsFv => self.iv_is_fv += 1,
      ReportStatus::EmptyTouchedFiles => self.empty_touched_files += 1,
      ReportStatus::AfterLastRelease => self.after_last_release += 1,
      ReportStatus::Valid => self.valid += 1,
    }
  }
}

// ---------------------------------------------------------------------------
// Output types (JSON contract: rows we emit)
// ---------------------------------------------------------------------------

/// One labeled feature row: a file at an analyzed release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRow {
  pub release_index: u32,
  pub file_name: String,
  /// Code lines, comments excluded.
  pub size: u64,
  pub comment_percentage: f64,
  /// Added + deleted lines over the release window.
  pub touched_loc: u64,
  pub commit_count: u64,
  pub author_count: u64,
  pub added_loc_sum: u64,
  pub added_loc_max: u64,
  pub added_loc_avg: f64,
  pub churn_sum: i64,
  pub churn_max: i64,
  pub churn_avg: f64,
  pub change_set_sum: u64,
  pub change_set_max: u64,
  pub change_set_avg: f64,
  pub age_weeks: u64,
  pub weighted_age: u64,
  pub fix_count: u32,
  pub buggy: bool,
}

/// Structured error output for a failed run.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorOutput {
  pub error: bool,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub field: Option<String>,
}

impl ErrorOutput {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      error: true,
      message: message.into(),
      field: None,
    }
  }

  pub fn with_field(mut self, field: impl Into<String>) -> Self {
    self.field = Some(field.into());
    self
  }
}
