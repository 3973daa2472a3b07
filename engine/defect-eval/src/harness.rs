//! Walk-forward evaluation: for each cutoff, run every grid cell on
//! independent copies of the step's partitions.
//!
//! Per cell: select features -> rebalance training -> fit (cost policy) ->
//! evaluate on the untouched testing partition -> emit unless degenerate.
//! Steps run in order. Cells of one step may run on the rayon pool; results
//! are still collected in grid order.

use defect_dataset::DatasetRow;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::classify::{BuiltinLearner, Learner};
use crate::config::Config;
use crate::cost::{self, CostMatrix};
use crate::error::EvalError;
use crate::metrics;
use crate::split::{self, FeatureSet};
use crate::types::*;

/// Cartesian product of the configured axes, nested as
/// feature selection > resampling > classifier > cost policy.
pub fn grid(config: &Config) -> Vec<GridCell> {
  let mut cells = Vec::new();
  for &feature_selection in &config.feature_selections {
    for &resampling in &config.resamplings {
      for &classifier in &config.classifiers {
        for &cost_sensitivity in &config.cost_sensitivities {
          cells.push(GridCell {
            feature_selection,
            resampling,
            classifier,
            cost_sensitivity,
          });
        }
      }
    }
  }
  cells
}

/// Stable per-cell seed: blake3 over (base seed, dataset, cell labels).
pub fn cell_seed(base: u64, dataset: &str, cell: &GridCell) -> u64 {
  let mut hasher = blake3::Hasher::new();
  hasher.update(&base.to_le_bytes());
  hasher.update(b"|");
  hasher.update(dataset.as_bytes());
  for label in cell.labels() {
    hasher.update(b"|");
    hasher.update(label.as_bytes());
  }
  let hash = hasher.finalize();
  let mut bytes = [0u8; 8];
  bytes.copy_from_slice(&hash.as_bytes()[..8]);
  u64::from_le_bytes(bytes)
}

/// Name of the dataset evaluated at cutoff `k`.
pub fn step_name(project: &str, k: u32) -> String {
  format!("{}-step_{}", project, k)
}

/// The evaluation harness. Stateless between runs.
pub struct Harness<L: Learner = BuiltinLearner> {
  config: Config,
  learner: L,
}

impl Harness<BuiltinLearner> {
  pub fn new(config: Config) -> Self {
    let learner = BuiltinLearner::from_config(&config);
    Self { config, learner }
  }

  pub fn with_defaults() -> Self {
    Self::new(Config::default())
  }
}

impl<L: Learner> Harness<L> {
  /// Use a different classifier backend.
  pub fn with_learner(config: Config, learner: L) -> Self {
    Self { config, learner }
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  /// Run every walk-forward step; results come back in step, then grid order.
  pub fn run(&self, project: &str, rows: &[DatasetRow]) -> Result<Vec<ExperimentResult>, EvalError> {
    if project.trim().is_empty() {
      return Err(EvalError::validation("project", "must not be empty"));
    }
    self.config.validate()?;

    let steps = split::steps(rows);
    if steps.is_empty() {
      warn!(project, rows = rows.len(), "fewer than two releases, nothing to evaluate");
      return Ok(Vec::new());
    }

    let features = FeatureSet::new(self.config.include_comments);
    let cells = grid(&self.config);
    let total = steps.len();
    info!(project, steps = total, cells = cells.len(), "walk-forward evaluation started");

    let mut results = Vec::new();
    for k in steps {
      let (training, testing) = split::split(rows, k, features)?;
      let dataset = step_name(project, k);
      if training.is_empty() {
        return Err(EvalError::validation(
          "rows",
          &format!("{}: releases 1..={} hold no rows to train on", dataset, k),
        ));
      }
      let kept = self.run_step(&dataset, k, &cells, &training, &testing)?;
      info!(
        dataset = %dataset,
        training = training.len(),
        testing = testing.len(),
        kept = kept.len(),
        "step {}/{} completed",
        k,
        total
      );
      results.extend(kept);
    }
    Ok(results)
  }

  /// Evaluate all cells against one immutable `(training, testing)` pair.
  pub fn run_step(
    &self,
    dataset: &str,
    k: u32,
    cells: &[GridCell],
    training: &Partition,
    testing: &Partition,
  ) -> Result<Vec<ExperimentResult>, EvalError> {
    let evaluated: Vec<ExperimentResult> = if self.config.parallel {
      cells
        .par_iter()
        .map(|cell| self.evaluate_cell(dataset, k, cell, training, testing))
        .collect::<Result<_, _>>()?
    } else {
      cells
        .iter()
        .map(|cell| self.evaluate_cell(dataset, k, cell, training, testing))
        .collect::<Result<_, _>>()?
    };

    Ok(
      evaluated
        .into_iter()
        .filter(|r| {
          let keep = r.is_informative();
          if !keep {
            debug!(
              dataset = %r.dataset,
              classifier = r.classifier.label(),
              feature_selection = r.feature_selection.label(),
              resampling = r.resampling.label(),
              cost_sensitivity = r.cost_sensitivity.label(),
              "degenerate result discarded"
            );
          }
          keep
        })
        .collect(),
    )
  }

  fn evaluate_cell(
    &self,
    dataset: &str,
    k: u32,
    cell: &GridCell,
    training: &Partition,
    testing: &Partition,
  ) -> Result<ExperimentResult, EvalError> {
    let mut rng = StdRng::seed_from_u64(cell_seed(self.config.seed, dataset, cell));

    let selector = cell.feature_selection.selector(&self.config);
    let (training, testing) = selector.select(training, testing);

    let resampler = cell.resampling.resampler(&self.config);
    let sampled = resampler.resample(&training, &mut rng);

    let (model, rule) = cost::fit_with_costs(
      &self.learner,
      cell.classifier,
      cell.cost_sensitivity,
      &sampled,
      CostMatrix::from_config(&self.config),
      &mut rng,
    )?;
    let eval = metrics::evaluate(model.as_ref(), &rule, &testing)?;

    let sized = sampled.len() + testing.len();
    let training_percent = if sized == 0 {
      0.0
    } else {
      100.0 * sampled.len() as f64 / sized as f64
    };

    Ok(ExperimentResult {
      dataset: dataset.to_string(),
      training_release: k,
      classifier: cell.classifier,
      feature_selection: cell.feature_selection,
      resampling: cell.resampling,
      cost_sensitivity: cell.cost_sensitivity,
      training_percent,
      defective_training_percent: sampled.defective_percent(),
      defective_testing_percent: testing.defective_percent(),
      tp: eval.matrix.tp,
      fp: eval.matrix.fp,
      tn: eval.matrix.tn,
      r#fn: eval.matrix.r#fn,
      precision: eval.precision,
      recall: eval.recall,
      auc: eval.auc,
      kappa: eval.kappa,
    })
  }
}
