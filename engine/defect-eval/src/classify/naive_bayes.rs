//! Gaussian naive Bayes on aprender's `GaussianNB`.

use aprender::classification::GaussianNB;

use super::{buggy_column, class_ids, to_matrix, Model};
use crate::error::EvalError;
use crate::types::Partition;

#[derive(Debug)]
pub struct GaussianNaiveBayes {
  model: GaussianNB,
  width: usize,
}

impl GaussianNaiveBayes {
  pub fn fit(training: &Partition) -> Result<Self, EvalError> {
    let width = training.width();
    let x = to_matrix(&training.rows, width)?;
    let mut model = GaussianNB::new();
    model
      .fit(&x, &class_ids(training))
      .map_err(|e| EvalError::fit(format!("naive bayes: {e}")))?;
    Ok(Self { model, width })
  }
}

impl Model for GaussianNaiveBayes {
  fn prob_buggy(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, EvalError> {
    if rows.is_empty() {
      return Ok(Vec::new());
    }
    let distributions = self
      .model
      .predict_proba(&to_matrix(rows, self.width)?)
      .map_err(|e| EvalError::fit(format!("naive bayes: {e}")))?;
    buggy_column(&distributions)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn constant_column_does_not_blow_up() {
    let mut p = Partition::new(vec!["flat".into(), "x".into()]);
    p.push(vec![3.0, 10.0], true);
    p.push(vec![3.0, 11.0], true);
    p.push(vec![3.0, 0.0], false);
    p.push(vec![3.0, 1.0], false);
    let model = GaussianNaiveBayes::fit(&p).unwrap();
    let prob = model.prob_buggy(&[vec![3.0, 10.5]]).unwrap()[0];
    assert!(prob.is_finite());
    assert!(prob > 0.99);
  }

  #[test]
  fn closer_class_mean_wins() {
    let mut p = Partition::new(vec!["loc".into()]);
    for v in [1.0, 2.0, 3.0] {
      p.push(vec![v], false);
    }
    for v in [20.0, 21.0, 22.0] {
      p.push(vec![v], true);
    }
    let model = GaussianNaiveBayes::fit(&p).unwrap();
    let probs = model.prob_buggy(&[vec![2.5], vec![19.0]]).unwrap();
    assert!(probs[0] < 0.5 && probs[1] > 0.5, "{:?}", probs);
  }
}
