//! Core types for the evaluation harness (grid axes, partitions, results).

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Grid axes (closed variants; labels match the published result tables)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassifierKind {
  #[serde(rename = "RANDOM_FOREST")]
  RandomForest,
  #[serde(rename = "NAIVE_BAYES")]
  NaiveBayes,
  #[serde(rename = "IBK")]
  Ibk,
}

impl ClassifierKind {
  pub const ALL: [Self; 3] = [Self::RandomForest, Self::NaiveBayes, Self::Ibk];

  pub fn label(self) -> &'static str {
    match self {
      Self::RandomForest => "RANDOM_FOREST",
      Self::NaiveBayes => "NAIVE_BAYES",
      Self::Ibk => "IBK",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureSelectionKind {
  #[serde(rename = "NO_FEATURE_SELECTION")]
  None,
  /// Correlation-based subset evaluation with best-first forward search.
  #[serde(rename = "BEST_FIRST")]
  BestFirst,
}

impl FeatureSelectionKind {
  pub const ALL: [Self; 2] = [Self::None, Self::BestFirst];

  pub fn label(self) -> &'static str {
    match self {
      Self::None => "NO_FEATURE_SELECTION",
      Self::BestFirst => "BEST_FIRST",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResamplingKind {
  #[serde(rename = "NO_SAMPLING")]
  None,
  #[serde(rename = "OVERSAMPLING")]
  Oversampling,
  #[serde(rename = "UNDERSAMPLING")]
  Undersampling,
  #[serde(rename = "SMOTE")]
  Smote,
}

impl ResamplingKind {
  pub const ALL: [Self; 4] = [Self::None, Self::Oversampling, Self::Undersampling, Self::Smote];

  pub fn label(self) -> &'static str {
    match self {
      Self::None => "NO_SAMPLING",
      Self::Oversampling => "OVERSAMPLING",
      Self::Undersampling => "UNDERSAMPLING",
      Self::Smote => "SMOTE",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CostSensitiveKind {
  #[serde(rename = "NO_COST_SENSITIVE")]
  None,
  /// Keep the model, move the decision threshold to minimize expected cost.
  #[serde(rename = "SENSITIVE_THRESHOLD")]
  Threshold,
  /// Retrain on a cost-weighted resample of the training partition.
  #[serde(rename = "SENSITIVE_LEARNING")]
  Learning,
}

impl CostSensitiveKind {
  pub const ALL: [Self; 3] = [Self::None, Self::Threshold, Self::Learning];

  pub fn label(self) -> &'static str {
    match self {
      Self::None => "NO_COST_SENSITIVE",
      Self::Threshold => "SENSITIVE_THRESHOLD",
      Self::Learning => "SENSITIVE_LEARNING",
    }
  }
}

/// One combination of the four axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridCell {
  pub feature_selection: FeatureSelectionKind,
  pub resampling: ResamplingKind,
  pub classifier: ClassifierKind,
  pub cost_sensitivity: CostSensitiveKind,
}

impl GridCell {
  pub fn labels(&self) -> [&'static str; 4] {
    [
      self.feature_selection.label(),
      self.resampling.label(),
      self.classifier.label(),
      self.cost_sensitivity.label(),
    ]
  }
}

// ---------------------------------------------------------------------------
// Partitions
// ---------------------------------------------------------------------------

/// A feature matrix with its buggy labels. Grouping keys (release index,
/// file name) are never part of it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
  pub features: Vec<String>,
  pub rows: Vec<Vec<f64>>,
  pub labels: Vec<bool>,
}

impl Partition {
  pub fn new(features: Vec<String>) -> Self {
    Self {
      features,
      rows: Vec::new(),
      labels: Vec::new(),
    }
  }

  pub fn push(&mut self, values: Vec<f64>, buggy: bool) {
    self.rows.push(values);
    self.labels.push(buggy);
  }

  pub fn len(&self) -> usize {
    self.rows.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rows.is_empty()
  }

  /// Number of feature columns.
  pub fn width(&self) -> usize {
    self.features.len()
  }

  pub fn buggy_count(&self) -> usize {
    self.labels.iter().filter(|&&b| b).count()
  }

  pub fn clean_count(&self) -> usize {
    self.len() - self.buggy_count()
  }

  /// The smaller class. Buggy wins ties.
  pub fn minority_label(&self) -> bool {
    self.buggy_count() <= self.clean_count()
  }

  /// `(minority, majority)` class sizes.
  pub fn class_counts(&self) -> (usize, usize) {
    let (buggy, clean) = (self.buggy_count(), self.clean_count());
    if buggy > clean {
      (clean, buggy)
    } else {
      (buggy, clean)
    }
  }

  /// Row positions holding the given label, in partition order.
  pub fn indices_of(&self, buggy: bool) -> Vec<usize> {
    self
      .labels
      .iter()
      .enumerate()
      .filter(|(_, &b)| b == buggy)
      .map(|(i, _)| i)
      .collect()
  }

  /// Percentage of buggy rows; 0 for an empty partition.
  pub fn defective_percent(&self) -> f64 {
    if self.is_empty() {
      return 0.0;
    }
    100.0 * self.buggy_count() as f64 / self.len() as f64
  }

  pub fn column(&self, j: usize) -> impl Iterator<Item = f64> + '_ {
    self.rows.iter().map(move |r| r[j])
  }

  /// Keep only the given columns, in the given order.
  pub fn project(&self, columns: &[usize]) -> Self {
    Self {
      features: columns.iter().map(|&j| self.features[j].clone()).collect(),
      rows: self
        .rows
        .iter()
        .map(|r| columns.iter().map(|&j| r[j]).collect())
        .collect(),
      labels: self.labels.clone(),
    }
  }

  /// A new partition made of the given rows (repeats allowed).
  pub fn take(&self, indices: &[usize]) -> Self {
    Self {
      features: self.features.clone(),
      rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
      labels: indices.iter().map(|&i| self.labels[i]).collect(),
    }
  }
}

// ---------------------------------------------------------------------------
// Output types (JSON contract: one line per kept grid cell)
// ---------------------------------------------------------------------------

/// Evaluation of one grid cell at one walk-forward step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentResult {
  /// `{project}-step_{k}`.
  pub dataset: String,
  /// Last release in the training partition.
  pub training_release: u32,
  pub classifier: ClassifierKind,
  pub feature_selection: FeatureSelectionKind,
  pub resampling: ResamplingKind,
  pub cost_sensitivity: CostSensitiveKind,
  /// Rebalanced training size over training + testing size, as a percentage.
  pub training_percent: f64,
  pub defective_training_percent: f64,
  pub defective_testing_percent: f64,
  pub tp: usize,
  pub fp: usize,
  pub tn: usize,
  pub r#fn: usize,
  pub precision: f64,
  pub recall: f64,
  pub auc: f64,
  pub kappa: f64,
}

impl ExperimentResult {
  /// False for the degenerate precision == recall == AUC == 1 case, which only
  /// arises from trivially separable (usually single-class) test partitions.
  pub fn is_informative(&self) -> bool {
    !(self.precision == 1.0 && self.recall == 1.0 && self.auc == 1.0)
  }
}
