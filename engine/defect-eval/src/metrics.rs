//! Test-partition metrics for the buggy (positive) class.

use serde::Serialize;

use crate::classify::Model;
use crate::cost::DecisionRule;
use crate::error::EvalError;
use crate::types::Partition;

/// Confusion counts for binary classification; buggy is the positive class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
  pub tp: usize,
  pub fp: usize,
  pub tn: usize,
  pub r#fn: usize,
}

impl ConfusionMatrix {
  pub fn from_predictions(predictions: &[bool], truth: &[bool]) -> Self {
    let mut matrix = Self::default();
    for (pred, actual) in predictions.iter().zip(truth) {
      match (pred, actual) {
        (true, true) => matrix.tp += 1,
        (true, false) => matrix.fp += 1,
        (false, false) => matrix.tn += 1,
        (false, true) => matrix.r#fn += 1,
      }
    }
    matrix
  }

  pub fn total(&self) -> usize {
    self.tp + self.fp + self.tn + self.r#fn
  }

  /// TP / (TP + FP); 0 when nothing was predicted buggy.
  pub fn precision(&self) -> f64 {
    ratio(self.tp, self.tp + self.fp)
  }

  /// TP / (TP + FN); 0 when nothing is actually buggy.
  pub fn recall(&self) -> f64 {
    ratio(self.tp, self.tp + self.r#fn)
  }

  /// Cohen's kappa; 1 when chance agreement is already total.
  pub fn kappa(&self) -> f64 {
    let n = self.total() as f64;
    if n == 0.0 {
      return 1.0;
    }
    let observed = (self.tp + self.tn) as f64 / n;
    let predicted_buggy = (self.tp + self.fp) as f64;
    let actual_buggy = (self.tp + self.r#fn) as f64;
    let chance = (predicted_buggy * actual_buggy + (n - predicted_buggy) * (n - actual_buggy)) / (n * n);
    if (1.0 - chance).abs() < f64::EPSILON {
      return 1.0;
    }
    (observed - chance) / (1.0 - chance)
  }
}

fn ratio(num: usize, denom: usize) -> f64 {
  if denom == 0 {
    return 0.0;
  }
  num as f64 / denom as f64
}

/// Area under the ROC curve as the Mann-Whitney statistic: the chance a random
/// buggy row scores above a random clean one, ties counting half. 1.0 when the
/// truth holds a single class.
pub fn auc(scores: &[f64], truth: &[bool]) -> f64 {
  let positives = truth.iter().filter(|&&t| t).count();
  let negatives = truth.len() - positives;
  if positives == 0 || negatives == 0 {
    return 1.0;
  }

  let mut ranked: Vec<(f64, bool)> = scores.iter().copied().zip(truth.iter().copied()).collect();
  ranked.sort_by(|a, b| a.0.total_cmp(&b.0));

  // Sum of (1-based, tie-averaged) ranks held by positives.
  let mut rank_sum = 0.0;
  let mut start = 0;
  while start < ranked.len() {
    let mut end = start + 1;
    while end < ranked.len() && ranked[end].0 == ranked[start].0 {
      end += 1;
    }
    let mean_rank = (start + 1 + end) as f64 / 2.0;
    let tied_positives = ranked[start..end].iter().filter(|(_, t)| *t).count();
    rank_sum += mean_rank * tied_positives as f64;
    start = end;
  }

  let p = positives as f64;
  let u = rank_sum - p * (p + 1.0) / 2.0;
  u / (p * negatives as f64)
}

/// Everything measured on one test partition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Evaluation {
  pub matrix: ConfusionMatrix,
  pub precision: f64,
  pub recall: f64,
  pub auc: f64,
  pub kappa: f64,
}

/// Score the testing partition. Under a minimum-expected-cost rule every
/// distribution collapses to the chosen class, so AUC ranks the hard decisions.
pub fn evaluate(model: &dyn Model, rule: &DecisionRule, testing: &Partition) -> Result<Evaluation, EvalError> {
  let probs = model.prob_buggy(&testing.rows)?;
  let predictions: Vec<bool> = probs.iter().map(|&p| rule.predict(p)).collect();
  let scores: Vec<f64> = match rule {
    DecisionRule::MostProbable => probs,
    DecisionRule::MinimizeExpectedCost(_) => predictions.iter().map(|&b| if b { 1.0 } else { 0.0 }).collect(),
  };
  let matrix = ConfusionMatrix::from_predictions(&predictions, &testing.labels);
  Ok(Evaluation {
    matrix,
    precision: matrix.precision(),
    recall: matrix.recall(),
    auc: auc(&scores, &testing.labels),
    kappa: matrix.kappa(),
  })
}
