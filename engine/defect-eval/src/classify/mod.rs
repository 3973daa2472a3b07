//! Learner capability interface and the aprender-backed learners.
//!
//! The harness only ever sees `Learner` and `Model`; any statistical backend
//! that can produce a buggy probability per row can be plugged in.

mod forest;
mod knn;
mod naive_bayes;

pub use forest::RandomForest;
pub use knn::NearestNeighbors;
pub use naive_bayes::GaussianNaiveBayes;

use aprender::primitives::Matrix;
use rand::rngs::StdRng;

use crate::config::Config;
use crate::error::EvalError;
use crate::types::{ClassifierKind, Partition};

/// A fitted classifier.
pub trait Model: Send + Sync {
  /// Probability that each row belongs to the buggy class, in [0, 1].
  fn prob_buggy(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, EvalError>;
}

/// Trains a model of the requested kind. Fitting failures are fatal for the run.
pub trait Learner: Send + Sync {
  fn fit(
    &self,
    kind: ClassifierKind,
    training: &Partition,
    rng: &mut StdRng,
  ) -> Result<Box<dyn Model>, EvalError>;
}

/// Constant buggy share, for trainings no estimator can split: a single class,
/// or no feature columns left after selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prior {
  prob: f64,
}

impl Prior {
  pub fn fit(training: &Partition) -> Self {
    let prob = if training.is_empty() {
      0.0
    } else {
      training.buggy_count() as f64 / training.len() as f64
    };
    Self { prob }
  }
}

impl Model for Prior {
  fn prob_buggy(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, EvalError> {
    Ok(vec![self.prob; rows.len()])
  }
}

/// Random forest, Gaussian naive Bayes and IBk, all backed by aprender.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinLearner {
  pub forest_trees: usize,
  pub knn_neighbors: usize,
}

impl BuiltinLearner {
  pub fn from_config(config: &Config) -> Self {
    Self {
      forest_trees: config.forest_trees,
      knn_neighbors: config.knn_neighbors,
    }
  }
}

impl Default for BuiltinLearner {
  fn default() -> Self {
    Self::from_config(&Config::default())
  }
}

impl Learner for BuiltinLearner {
  fn fit(
    &self,
    kind: ClassifierKind,
    training: &Partition,
    rng: &mut StdRng,
  ) -> Result<Box<dyn Model>, EvalError> {
    if training.is_empty() {
      return Err(EvalError::fit(format!(
        "{} cannot be trained on an empty partition",
        kind.label()
      )));
    }
    if training.rows.iter().flatten().any(|v| !v.is_finite()) {
      return Err(EvalError::fit(format!("{}: non-finite feature value", kind.label())));
    }
    if training.width() == 0 || training.buggy_count() == 0 || training.clean_count() == 0 {
      return Ok(Box::new(Prior::fit(training)));
    }

    Ok(match kind {
      ClassifierKind::RandomForest => Box::new(RandomForest::fit(training, self.forest_trees, rng)?),
      ClassifierKind::NaiveBayes => Box::new(GaussianNaiveBayes::fit(training)?),
      ClassifierKind::Ibk => Box::new(NearestNeighbors::fit(training, self.knn_neighbors)?),
    })
  }
}

/// Row-major f32 matrix for aprender.
pub(crate) fn to_matrix(rows: &[Vec<f64>], width: usize) -> Result<Matrix<f32>, EvalError> {
  let data: Vec<f32> = rows.iter().flatten().map(|&v| v as f32).collect();
  Matrix::from_vec(rows.len(), width, data).map_err(|e| EvalError::fit(format!("feature matrix: {e}")))
}

/// aprender class ids: clean = 0, buggy = 1.
pub(crate) fn class_ids(training: &Partition) -> Vec<usize> {
  training.labels.iter().map(|&b| usize::from(b)).collect()
}

/// Buggy column of per-row class distributions.
pub(crate) fn buggy_column(distributions: &[Vec<f32>]) -> Result<Vec<f64>, EvalError> {
  distributions
    .iter()
    .map(|d| {
      let p = f64::from(d.get(1).copied().unwrap_or(0.0));
      if p.is_finite() {
        Ok(p.clamp(0.0, 1.0))
      } else {
        Err(EvalError::fit("non-finite class probability"))
      }
    })
    .collect()
}
