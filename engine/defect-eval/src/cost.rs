//! Cost-sensitive decision making.
//!
//! Cost matrix (rows actual, columns predicted):
//!
//! |        | buggy | clean |
//! |--------|-------|-------|
//! | buggy  | 0     | CFN   |
//! | clean  | CFP   | 0     |

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;

use crate::classify::{Learner, Model};
use crate::config::Config;
use crate::error::EvalError;
use crate::types::{ClassifierKind, CostSensitiveKind, Partition};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostMatrix {
  pub false_positive: f64,
  pub false_negative: f64,
}

impl CostMatrix {
  pub fn from_config(config: &Config) -> Self {
    Self {
      false_positive: config.cost_false_positive,
      false_negative: config.cost_false_negative,
    }
  }
}

/// How a buggy probability becomes a prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecisionRule {
  /// Most probable class; buggy wins a 0.5 tie.
  MostProbable,
  /// Class with the lower expected misclassification cost; buggy wins ties.
  MinimizeExpectedCost(CostMatrix),
}

impl DecisionRule {
  pub fn predict(&self, prob_buggy: f64) -> bool {
    match self {
      Self::MostProbable => prob_buggy >= 0.5,
      Self::MinimizeExpectedCost(costs) => {
        let cost_if_buggy = (1.0 - prob_buggy) * costs.false_positive;
        let cost_if_clean = prob_buggy * costs.false_negative;
        cost_if_buggy <= cost_if_clean
      }
    }
  }
}

/// Draw `n` rows with replacement, buggy rows weighted by CFN and clean rows by CFP.
pub fn cost_weighted_resample(training: &Partition, costs: &CostMatrix, rng: &mut StdRng) -> Partition {
  let weights = training.labels.iter().map(|&buggy| {
    if buggy {
      costs.false_negative
    } else {
      costs.false_positive
    }
  });
  let Ok(dist) = WeightedIndex::new(weights) else {
    return training.clone();
  };
  let picked: Vec<usize> = (0..training.len()).map(|_| dist.sample(rng)).collect();
  training.take(&picked)
}

/// Fit a classifier under a cost policy, returning the model and the rule to
/// turn its probabilities into predictions.
pub fn fit_with_costs(
  learner: &dyn Learner,
  classifier: ClassifierKind,
  policy: CostSensitiveKind,
  training: &Partition,
  costs: CostMatrix,
  rng: &mut StdRng,
) -> Result<(Box<dyn Model>, DecisionRule), EvalError> {
  match policy {
    CostSensitiveKind::None => Ok((learner.fit(classifier, training, rng)?, DecisionRule::MostProbable)),
    CostSensitiveKind::Threshold => Ok((
      learner.fit(classifier, training, rng)?,
      DecisionRule::MinimizeExpectedCost(costs),
    )),
    CostSensitiveKind::Learning => {
      let weighted = cost_weighted_resample(training, &costs, rng);
      Ok((learner.fit(classifier, &weighted, rng)?, DecisionRule::MostProbable))
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::SeedableRng;

  fn costs() -> CostMatrix {
    CostMatrix::from_config(&Config::default())
  }

  #[test]
  fn most_probable_breaks_ties_towards_buggy() {
    assert!(DecisionRule::MostProbable.predict(0.5));
    assert!(!DecisionRule::MostProbable.predict(0.49));
  }

  #[test]
  fn expected_cost_threshold_is_cfp_over_sum() {
    // Buggy when (1 - p) * 1 <= p * 10, i.e. p >= 1/11.
    let rule = DecisionRule::MinimizeExpectedCost(costs());
    assert!(rule.predict(0.1));
    assert!(rule.predict(0.2));
    assert!(!rule.predict(0.08));
    assert!(!rule.predict(0.0));
  }

  #[test]
  fn weighted_resample_favours_costly_class() {
    let mut p = Partition::new(vec!["x".into()]);
    for i in 0..50 {
      p.push(vec![i as f64], i < 5);
    }
    let out = cost_weighted_resample(&p, &costs(), &mut StdRng::seed_from_u64(11));
    assert_eq!(out.len(), 50);
    // Expected buggy share is 50 / (50 + 45) ~ 53%.
    assert!(out.buggy_count() > 15, "buggy = {}", out.buggy_count());
  }

  #[test]
  fn weighted_resample_of_empty_partition() {
    let p = Partition::new(vec!["x".into()]);
    let out = cost_weighted_resample(&p, &costs(), &mut StdRng::seed_from_u64(1));
    assert!(out.is_empty());
  }
}
