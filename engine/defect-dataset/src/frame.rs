//! Per-file, per-release feature matrix.
//!
//! Rows are created from each analyzed release's file inventory, then mutated
//! once per commit in the release window that touches the file. Labels are
//! applied later by the propagator; `into_rows` freezes everything.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::error::DatasetError;
use crate::timeline::Timeline;
use crate::types::{Commit, DatasetRow, Inventory, SourceFile, TouchedFile};

/// Mutable accumulator behind one `DatasetRow`.
#[derive(Debug, Clone)]
pub struct FileMetrics {
  pub release_index: u32,
  pub file_name: String,
  pub size: u64,
  pub comment_lines: u64,
  pub age_weeks: u64,
  pub touched_loc: u64,
  pub commit_count: u64,
  authors: HashSet<String>,
  added: Vec<u64>,
  churn: Vec<i64>,
  change_set: Vec<u64>,
  pub fix_count: u32,
  pub buggy: bool,
}

impl FileMetrics {
  fn new(release_index: u32, release_date: DateTime<Utc>, file: &SourceFile) -> Self {
    Self {
      release_index,
      file_name: file.path.clone(),
      size: file.code_lines,
      comment_lines: file.comment_lines,
      age_weeks: (release_date - file.created).num_weeks().max(0) as u64,
      touched_loc: 0,
      commit_count: 0,
      authors: HashSet::new(),
      added: Vec::new(),
      churn: Vec::new(),
      change_set: Vec::new(),
      fix_count: 0,
      buggy: false,
    }
  }

  /// Fold one commit's change to this file into the aggregates.
  fn attribute(&mut self, author: &str, touched: &TouchedFile) {
    self.commit_count += 1;
    self.touched_loc += touched.added + touched.deleted;
    self.authors.insert(author.to_string());
    self.added.push(touched.added);
    self.churn.push(touched.churn());
    self.change_set.push(touched.concurrent_change_set);
  }

  /// Label the row buggy for one more defect.
  pub fn mark_buggy(&mut self) {
    self.buggy = true;
    self.fix_count += 1;
  }

  pub fn author_count(&self) -> usize {
    self.authors.len()
  }

  fn finish(self) -> DatasetRow {
    let comment_percentage = if self.size + self.comment_lines == 0 {
      0.0
    } else {
      self.comment_lines as f64 / (self.size + self.comment_lines) as f64
    };
    let author_count = self.author_count() as u64;

    DatasetRow {
      release_index: self.release_index,
      file_name: self.file_name,
      size: self.size,
      comment_percentage,
      touched_loc: self.touched_loc,
      commit_count: self.commit_count,
      author_count,
      added_loc_sum: self.added.iter().sum(),
      added_loc_max: self.added.iter().copied().max().unwrap_or(0),
      added_loc_avg: mean(self.added.iter().map(|&v| v as f64)),
      churn_sum: self.churn.iter().sum(),
      churn_max: self.churn.iter().copied().max().unwrap_or(0),
      churn_avg: mean(self.churn.iter().map(|&v| v as f64)),
      change_set_sum: self.change_set.iter().sum(),
      change_set_max: self.change_set.iter().copied().max().unwrap_or(0),
      change_set_avg: mean(self.change_set.iter().map(|&v| v as f64)),
      age_weeks: self.age_weeks,
      weighted_age: self.age_weeks * self.touched_loc,
      fix_count: self.fix_count,
      buggy: self.buggy,
    }
  }
}

fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
  let n = values.len();
  if n == 0 {
    return 0.0;
  }
  values.sum::<f64>() / n as f64
}

/// All rows for the analyzed releases, addressable by (release, path).
#[derive(Debug, Clone, Default)]
pub struct DatasetFrame {
  rows: Vec<FileMetrics>,
  index: HashMap<u32, HashMap<String, usize>>,
}

impl DatasetFrame {
  /// Create rows from inventories and attribute every commit in each release window.
  pub fn build(
    timeline: &Timeline,
    inventories: &[Inventory],
    commits: &[Commit],
  ) -> Result<Self, DatasetError> {
    let mut frame = Self::default();

    for release in timeline.analyzed() {
      let inventory = inventories
        .iter()
        .find(|inv| inv.release == release.name)
        .ok_or_else(|| {
          DatasetError::validation(
            "inventories",
            &format!("no file inventory for analyzed release {:?}", release.name),
          )
        })?;
      let (start, end) = timeline.window(release.index).ok_or_else(|| {
        DatasetError::validation("releases", &format!("release {:?} has no date", release.name))
      })?;

      let by_path = frame.index.entry(release.index).or_default();
      for file in &inventory.files {
        if by_path.contains_key(&file.path) {
          continue;
        }
        by_path.insert(file.path.clone(), frame.rows.len());
        frame.rows.push(FileMetrics::new(release.index, end, file));
      }

      let in_window = commits
        .iter()
        .filter(|c| c.date <= end && start.map_or(true, |s| c.date > s));
      for commit in in_window {
        for touched in &commit.touched {
          if let Some(row) = frame.get_mut(release.index, &touched.path) {
            row.attribute(&commit.author, touched);
          }
        }
      }
    }

    Ok(frame)
  }

  pub fn len(&self) -> usize {
    self.rows.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rows.is_empty()
  }

  pub fn get(&self, release_index: u32, path: &str) -> Option<&FileMetrics> {
    let pos = *self.index.get(&release_index)?.get(path)?;
    self.rows.get(pos)
  }

  pub fn get_mut(&mut self, release_index: u32, path: &str) -> Option<&mut FileMetrics> {
    let pos = *self.index.get(&release_index)?.get(path)?;
    self.rows.get_mut(pos)
  }

  /// Freeze into output rows, ordered by release then inventory order.
  pub fn into_rows(self) -> Vec<DatasetRow> {
    self.rows.into_iter().map(FileMetrics::finish).collect()
  }
}
