//! Builder configuration with sane defaults, optionally loaded from TOML.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::DatasetError;

/// Where the affix goes when deriving an SCM tag from a tracker version name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AffixPosition {
  Prefix,
  Suffix,
}

/// Maps a tracker version name ("1.4.0") to its tag name ("release-1.4.0").
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TagNaming {
  pub position: AffixPosition,
  pub affix: String,
}

impl TagNaming {
  pub fn derive(&self, name: &str) -> String {
    match self.position {
      AffixPosition::Prefix => format!("{}{}", self.affix, name),
      AffixPosition::Suffix => format!("{}{}", name, self.affix),
    }
  }
}

impl Default for TagNaming {
  fn default() -> Self {
    Self {
      position: AffixPosition::Prefix,
      affix: "release-".into(),
    }
  }
}

/// Which prior reports feed the proportion average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProportionPolicy {
  /// Trailing window of the most recent `ceil(proportion_window * N)` reports.
  Moving,
  /// Every report processed so far.
  Global,
}

/// Tunable knobs for dataset construction.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Leading fraction of released versions kept for analysis (0..=1).
  pub subset_fraction: f64,
  /// Trailing window size for the moving proportion, as a fraction of processed reports.
  pub proportion_window: f64,
  pub proportion_policy: ProportionPolicy,
  pub tag_naming: TagNaming,
  /// Only paths ending with this suffix are tracked. `None` keeps every path.
  pub source_extension: Option<String>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      subset_fraction: 0.5,
      proportion_window: 0.03,
      proportion_policy: ProportionPolicy::Moving,
      tag_naming: TagNaming::default(),
      source_extension: Some(".java".into()),
    }
  }
}

impl Config {
  /// Load from a TOML file; `None` yields the defaults.
  pub fn load(path: Option<&Path>) -> Result<Self, DatasetError> {
    let config = match path {
      Some(path) => {
        let content = fs::read_to_string(path)
          .map_err(|e| DatasetError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        toml::from_str(&content)
          .map_err(|e| DatasetError::Config(format!("cannot parse {}: {}", path.display(), e)))?
      }
      None => Self::default(),
    };
    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<(), DatasetError> {
    if !(self.subset_fraction > 0.0 && self.subset_fraction <= 1.0) {
      return Err(DatasetError::validation("subset_fraction", "expected a value in (0, 1]"));
    }
    if !(self.proportion_window > 0.0 && self.proportion_window <= 1.0) {
      return Err(DatasetError::validation("proportion_window", "expected a value in (0, 1]"));
    }
    Ok(())
  }

  /// Whether a path counts as a tracked source file.
  pub fn tracks(&self, path: &str) -> bool {
    match &self.source_extension {
      Some(ext) => path.ends_with(ext.as_str()),
      None => true,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tag_naming_prefix_and_suffix() {
    let prefix = TagNaming::default();
    assert_eq!(prefix.derive("1.7.0"), "release-1.7.0");

    let suffix = TagNaming {
      position: AffixPosition::Suffix,
      affix: "-final".into(),
    };
    assert_eq!(suffix.derive("4.2"), "4.2-final");
  }

  #[test]
  fn toml_overrides_keep_other_defaults() {
    let config: Config = toml::from_str(
      r#"
      subset_fraction = 1.0
      proportion_policy = "global"

      [tag_naming]
      position = "suffix"
      affix = "-rc"
      "#,
    )
    .unwrap();
    assert_eq!(config.subset_fraction, 1.0);
    assert_eq!(config.proportion_policy, ProportionPolicy::Global);
    assert_eq!(config.tag_naming.derive("2.0"), "2.0-rc");
    assert_eq!(config.proportion_window, 0.03);
    assert_eq!(config.source_extension.as_deref(), Some(".java"));
  }

  #[test]
  fn rejects_out_of_range_fraction() {
    let config = Config {
      subset_fraction: 0.0,
      ..Config::default()
    };
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("subset_fraction"));
  }

  #[test]
  fn tracks_by_extension() {
    let config = Config::default();
    assert!(config.tracks("src/main/java/Foo.java"));
    assert!(!config.tracks("README.md"));

    let all = Config {
      source_extension: None,
      ..Config::default()
    };
    assert!(all.tracks("README.md"));
  }
}
