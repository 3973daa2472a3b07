//! Walk-forward splitting: train on releases `1..=k`, test on release `k + 1`.

use defect_dataset::DatasetRow;

use crate::error::EvalError;
use crate::types::Partition;

/// Which dataset columns become learner features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeatureSet {
  pub include_comments: bool,
}

impl FeatureSet {
  pub fn new(include_comments: bool) -> Self {
    Self { include_comments }
  }

  pub fn names(&self) -> Vec<String> {
    let mut names = vec!["size"];
    if self.include_comments {
      names.push("comment_percentage");
    }
    names.extend([
      "touched_loc",
      "commit_count",
      "author_count",
      "added_loc_sum",
      "added_loc_max",
      "added_loc_avg",
      "churn_sum",
      "churn_max",
      "churn_avg",
      "change_set_sum",
      "change_set_max",
      "change_set_avg",
      "age_weeks",
      "weighted_age",
      "fix_count",
    ]);
    names.into_iter().map(String::from).collect()
  }

  /// Feature values in `names()` order. Release index and file name are
  /// grouping keys and never leave the row.
  pub fn extract(&self, row: &DatasetRow) -> Vec<f64> {
    let mut values = vec![row.size as f64];
    if self.include_comments {
      values.push(row.comment_percentage);
    }
    values.extend([
      row.touched_loc as f64,
      row.commit_count as f64,
      row.author_count as f64,
      row.added_loc_sum as f64,
      row.added_loc_max as f64,
      row.added_loc_avg,
      row.churn_sum as f64,
      row.churn_max as f64,
      row.churn_avg,
      row.change_set_sum as f64,
      row.change_set_max as f64,
      row.change_set_avg,
      row.age_weeks as f64,
      row.weighted_age as f64,
      f64::from(row.fix_count),
    ]);
    values
  }
}

/// Highest release index present.
pub fn last_release(rows: &[DatasetRow]) -> Option<u32> {
  rows.iter().map(|r| r.release_index).max()
}

/// Training cutoffs `1..last`; empty when fewer than two releases are present.
pub fn steps(rows: &[DatasetRow]) -> Vec<u32> {
  match last_release(rows) {
    Some(last) => (1..last).collect(),
    None => Vec::new(),
  }
}

/// Split at cutoff `k` into `(training, testing)`.
pub fn split(
  rows: &[DatasetRow],
  k: u32,
  features: FeatureSet,
) -> Result<(Partition, Partition), EvalError> {
  let last = last_release(rows).ok_or_else(|| EvalError::validation("rows", "dataset is empty"))?;
  if k < 1 || k >= last {
    return Err(EvalError::validation(
      "k",
      &format!("cutoff {} outside 1..{}", k, last),
    ));
  }

  let names = features.names();
  let mut training = Partition::new(names.clone());
  let mut testing = Partition::new(names);
  for row in rows {
    if row.release_index <= k {
      training.push(features.extract(row), row.buggy);
    } else if row.release_index == k + 1 {
      testing.push(features.extract(row), row.buggy);
    }
  }
  Ok((training, testing))
}
