//! Walk-forward evaluation of defect-prediction classifiers.
//!
//! Trains on releases `1..=k`, tests on release `k + 1`, for every cutoff and
//! every combination of feature selection, rebalancing, classifier and cost
//! policy. Learners sit behind the `Learner`/`Model` traits.

pub mod classify;
pub mod config;
pub mod cost;
pub mod error;
pub mod harness;
pub mod metrics;
pub mod rebalance;
pub mod select;
pub mod split;
pub mod types;

pub use classify::{BuiltinLearner, Learner, Model};
pub use config::Config;
pub use error::EvalError;
pub use harness::Harness;
pub use split::FeatureSet;
pub use types::{
  ClassifierKind, CostSensitiveKind, ExperimentResult, FeatureSelectionKind, GridCell, Partition,
  ResamplingKind,
};
