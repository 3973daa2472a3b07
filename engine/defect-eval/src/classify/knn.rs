//! Instance-based k-nearest-neighbour learner (IBk) on aprender's
//! `KNearestNeighbors`.
//!
//! Features are min-max normalized with ranges taken from the training
//! partition before they reach the estimator; queries reuse those ranges.

use aprender::classification::KNearestNeighbors;

use super::{buggy_column, class_ids, to_matrix, Model};
use crate::error::EvalError;
use crate::types::Partition;

/// Per-column min-max scaling fitted on training rows.
#[derive(Debug, Clone, PartialEq)]
pub struct MinMaxScaler {
  mins: Vec<f64>,
  ranges: Vec<f64>,
}

impl MinMaxScaler {
  pub fn fit(training: &Partition) -> Self {
    let width = training.width();
    let mut mins = vec![f64::INFINITY; width];
    let mut maxs = vec![f64::NEG_INFINITY; width];
    for row in &training.rows {
      for (j, &v) in row.iter().enumerate() {
        mins[j] = mins[j].min(v);
        maxs[j] = maxs[j].max(v);
      }
    }
    let ranges = mins.iter().zip(&maxs).map(|(lo, hi)| hi - lo).collect();
    Self { mins, ranges }
  }

  /// Constant training columns map to 0.
  pub fn transform(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
    rows
      .iter()
      .map(|row| {
        row
          .iter()
          .zip(self.mins.iter().zip(&self.ranges))
          .map(|(v, (lo, range))| if *range > 0.0 { (v - lo) / range } else { 0.0 })
          .collect()
      })
      .collect()
  }
}

#[derive(Debug)]
pub struct NearestNeighbors {
  model: KNearestNeighbors,
  scaler: MinMaxScaler,
  width: usize,
}

impl NearestNeighbors {
  pub fn fit(training: &Partition, k: usize) -> Result<Self, EvalError> {
    let width = training.width();
    let scaler = MinMaxScaler::fit(training);
    let x = to_matrix(&scaler.transform(&training.rows), width)?;

    let mut model = KNearestNeighbors::new(k.clamp(1, training.len().max(1)));
    model
      .fit(&x, &class_ids(training))
      .map_err(|e| EvalError::fit(format!("ibk: {e}")))?;
    Ok(Self { model, scaler, width })
  }
}

impl Model for NearestNeighbors {
  fn prob_buggy(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, EvalError> {
    if rows.is_empty() {
      return Ok(Vec::new());
    }
    let x = to_matrix(&self.scaler.transform(rows), self.width)?;
    let distributions = self
      .model
      .predict_proba(&x)
      .map_err(|e| EvalError::fit(format!("ibk: {e}")))?;
    buggy_column(&distributions)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn partition() -> Partition {
    let mut p = Partition::new(vec!["loc".into(), "authors".into()]);
    p.push(vec![0.0, 1.0], false);
    p.push(vec![1000.0, 1.0], true);
    p.push(vec![10.0, 9.0], true);
    p
  }

  #[test]
  fn scaler_uses_training_ranges() {
    let scaler = MinMaxScaler::fit(&partition());
    assert_eq!(
      scaler.transform(&[vec![500.0, 5.0], vec![2000.0, 1.0]]),
      vec![vec![0.5, 0.5], vec![2.0, 0.0]]
    );

    let mut flat = Partition::new(vec!["x".into()]);
    flat.push(vec![4.0], true);
    flat.push(vec![4.0], false);
    assert_eq!(MinMaxScaler::fit(&flat).transform(&[vec![9.0]]), vec![vec![0.0]]);
  }

  #[test]
  fn normalization_decides_the_neighbour() {
    // Raw distances would pick [10, 9]; scaled, the author gap dominates.
    let model = NearestNeighbors::fit(&partition(), 1).unwrap();
    assert_eq!(model.prob_buggy(&[vec![10.0, 2.0], vec![20.0, 9.0]]).unwrap(), vec![0.0, 1.0]);
  }

  #[test]
  fn k_larger_than_training_uses_every_row() {
    let model = NearestNeighbors::fit(&partition(), 10).unwrap();
    let p = model.prob_buggy(&[vec![0.0, 1.0]]).unwrap()[0];
    assert!((p - 2.0 / 3.0).abs() < 1e-6, "{}", p);
  }
}
