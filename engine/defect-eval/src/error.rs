//! Structured error types for the evaluation harness.

use defect_dataset::DatasetError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvalError {
  #[error("validation: {field}: {reason}")]
  Validation { field: String, reason: String },

  /// A learner could not be trained. Fatal for the run; cells are never skipped.
  #[error("fit: {0}")]
  Fit(String),

  #[error("json: {0}")]
  Json(#[from] serde_json::Error),

  #[error("config: {0}")]
  Config(String),

  #[error("io: {0}")]
  Io(#[from] std::io::Error),

  #[error(transparent)]
  Dataset(#[from] DatasetError),
}

impl EvalError {
  pub fn validation(field: &str, reason: &str) -> Self {
    Self::Validation {
      field: field.to_string(),
      reason: reason.to_string(),
    }
  }

  pub fn fit(msg: impl Into<String>) -> Self {
    Self::Fit(msg.into())
  }
}
