//! Harness configuration with sane defaults, optionally loaded from TOML.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::EvalError;
use crate::types::{ClassifierKind, CostSensitiveKind, FeatureSelectionKind, ResamplingKind};

/// Grid axes, cost matrix and learner knobs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
  pub classifiers: Vec<ClassifierKind>,
  pub feature_selections: Vec<FeatureSelectionKind>,
  pub resamplings: Vec<ResamplingKind>,
  pub cost_sensitivities: Vec<CostSensitiveKind>,
  /// Cost of predicting a clean file buggy.
  pub cost_false_positive: f64,
  /// Cost of predicting a buggy file clean.
  pub cost_false_negative: f64,
  /// Feed the comment-percentage column to the learners.
  pub include_comments: bool,
  /// Base seed; each grid cell derives its own from it.
  pub seed: u64,
  pub forest_trees: usize,
  pub knn_neighbors: usize,
  pub smote_neighbors: usize,
  /// Non-improving expansions before best-first search gives up.
  pub best_first_stale_limit: usize,
  /// Evaluate the grid cells of one step on the rayon pool.
  pub parallel: bool,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      classifiers: ClassifierKind::ALL.to_vec(),
      feature_selections: FeatureSelectionKind::ALL.to_vec(),
      resamplings: ResamplingKind::ALL.to_vec(),
      cost_sensitivities: CostSensitiveKind::ALL.to_vec(),
      cost_false_positive: 1.0,
      cost_false_negative: 10.0,
      include_comments: false,
      seed: 42,
      forest_trees: 25,
      knn_neighbors: 1,
      smote_neighbors: 5,
      best_first_stale_limit: 5,
      parallel: true,
    }
  }
}

impl Config {
  /// Load from a TOML file; `None` yields the defaults.
  pub fn load(path: Option<&Path>) -> Result<Self, EvalError> {
    let config = match path {
      Some(path) => {
        let content = fs::read_to_string(path)
          .map_err(|e| EvalError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        toml::from_str(&content)
          .map_err(|e| EvalError::Config(format!("cannot parse {}: {}", path.display(), e)))?
      }
      None => Self::default(),
    };
    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<(), EvalError> {
    let axes = [
      ("classifiers", self.classifiers.is_empty()),
      ("feature_selections", self.feature_selections.is_empty()),
      ("resamplings", self.resamplings.is_empty()),
      ("cost_sensitivities", self.cost_sensitivities.is_empty()),
    ];
    if let Some((field, _)) = axes.iter().find(|(_, empty)| *empty) {
      return Err(EvalError::validation(field, "grid axis must list at least one variant"));
    }
    for (field, cost) in [
      ("cost_false_positive", self.cost_false_positive),
      ("cost_false_negative", self.cost_false_negative),
    ] {
      if !(cost.is_finite() && cost > 0.0) {
        return Err(EvalError::validation(field, "expected a positive finite cost"));
      }
    }
    for (field, count) in [
      ("forest_trees", self.forest_trees),
      ("knn_neighbors", self.knn_neighbors),
      ("smote_neighbors", self.smote_neighbors),
      ("best_first_stale_limit", self.best_first_stale_limit),
    ] {
      if count == 0 {
        return Err(EvalError::validation(field, "must be at least 1"));
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_cover_full_grid() {
    let c = Config::default();
    assert_eq!(
      c.classifiers.len() * c.feature_selections.len() * c.resamplings.len() * c.cost_sensitivities.len(),
      72
    );
    assert_eq!(c.cost_false_negative / c.cost_false_positive, 10.0);
    assert!(c.validate().is_ok());
  }

  #[test]
  fn toml_axes_use_result_labels() {
    let config: Config = toml::from_str(
      r#"
        classifiers = ["NAIVE_BAYES", "IBK"]
        cost_sensitivities = ["SENSITIVE_THRESHOLD"]
        seed = 7
      "#,
    )
    .unwrap();
    assert_eq!(config.classifiers, vec![ClassifierKind::NaiveBayes, ClassifierKind::Ibk]);
    assert_eq!(config.cost_sensitivities, vec![CostSensitiveKind::Threshold]);
    assert_eq!(config.seed, 7);
    assert_eq!(config.resamplings.len(), 4);
    assert!(config.parallel);
  }

  #[test]
  fn empty_axis_rejected() {
    let config = Config {
      resamplings: vec![],
      ..Config::default()
    };
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("resamplings"));
  }

  #[test]
  fn non_positive_cost_rejected() {
    let config = Config {
      cost_false_negative: 0.0,
      ..Config::default()
    };
    assert!(config.validate().is_err());
  }

  #[test]
  fn missing_file_is_config_error() {
    let err = Config::load(Some(Path::new("/nonexistent/defect-eval.toml"))).unwrap_err();
    assert!(matches!(err, EvalError::Config(_)));
  }
}
