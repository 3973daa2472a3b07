//! Two-phase validity checks for defect reports.
//!
//! The first phase runs on raw reports before injected versions are estimated;
//! the second runs on completed reports against the analyzed range. They use
//! different criteria and must stay separate.

use crate::types::{DefectReport, Release, ReportStatus};

impl DefectReport {
  fn index_of(release: &Option<Release>) -> Option<u32> {
    release.as_ref().map(|r| r.index)
  }

  /// injected <= opening <= fix, with the injected bound skipped while unknown.
  fn is_consistent(&self) -> bool {
    let (Some(opening), Some(fix)) = (Self::index_of(&self.opening), Self::index_of(&self.fix)) else {
      return false;
    };
    match Self::index_of(&self.injected) {
      Some(injected) => injected <= opening && injected <= fix && opening <= fix,
      None => opening <= fix,
    }
  }

  /// Pre-estimation check. `IvIsFv` is not reported here; such
  /// reports still feed the proportion history and are dropped afterwards.
  pub fn validate_before_estimation(&self) -> ReportStatus {
    if self.opening.is_none() || self.fix.is_none() {
      return ReportStatus::NullVersion;
    }
    if !self.is_consistent() {
      return ReportStatus::Inconsistent;
    }
    if self.injected.is_none() && self.commits.is_empty() {
      return ReportStatus::NullEmpty;
    }
    ReportStatus::Valid
  }

  /// Post-estimation check against the last analyzed release.
  pub fn validate_after_estimation(&self, last_analyzed: &Release) -> ReportStatus {
    if !self.is_consistent() {
      return ReportStatus::Inconsistent;
    }
    let (Some(injected), Some(fix)) = (Self::index_of(&self.injected), Self::index_of(&self.fix)) else {
      return ReportStatus::NullVersion;
    };
    if injected == fix {
      return ReportStatus::IvIsFv;
    }
    if self.touched_files.is_empty() {
      return ReportStatus::EmptyTouchedFiles;
    }
    if injected > last_analyzed.index {
      return ReportStatus::AfterLastRelease;
    }
    ReportStatus::Valid
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::Commit;
  use chrono::{TimeZone, Utc};

  fn release(index: u32) -> Release {
    Release {
      index,
      id: index.to_string(),
      name: format!("1.{}", index),
      tag: format!("release-1.{}", index),
      date: Some(Utc.with_ymd_and_hms(2020, index, 1, 0, 0, 0).unwrap()),
      released: true,
    }
  }

  fn report(injected: Option<u32>, opening: Option<u32>, fix: Option<u32>) -> DefectReport {
    DefectReport {
      id: "1".into(),
      key: "P-1".into(),
      sequence: 1,
      created: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
      opening: opening.map(release),
      fix: fix.map(release),
      injected: injected.map(release),
      injected_estimated: false,
      touched_files: vec!["A.java".into()],
      commits: vec![Commit {
        sha: "c".into(),
        author: "a".into(),
        date: Utc.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap(),
        message: "P-1".into(),
        touched: vec![],
      }],
    }
  }

  #[test]
  fn missing_versions() {
    assert_eq!(report(None, None, Some(3)).validate_before_estimation(), ReportStatus::NullVersion);
    assert_eq!(report(None, Some(1), None).validate_before_estimation(), ReportStatus::NullVersion);
  }

  #[test]
  fn inconsistent_orders() {
    assert_eq!(report(Some(3), Some(2), Some(4)).validate_before_estimation(), ReportStatus::Inconsistent);
    assert_eq!(report(None, Some(4), Some(2)).validate_before_estimation(), ReportStatus::Inconsistent);
    assert_eq!(report(Some(1), Some(2), Some(3)).validate_before_estimation(), ReportStatus::Valid);
  }

  #[test]
  fn unknown_injected_without_commits() {
    let mut r = report(None, Some(1), Some(3));
    r.commits.clear();
    assert_eq!(r.validate_before_estimation(), ReportStatus::NullEmpty);
  }

  #[test]
  fn iv_is_fv_only_after_estimation() {
    let r = report(Some(2), Some(2), Some(2));
    assert_eq!(r.validate_before_estimation(), ReportStatus::Valid);
    assert_eq!(r.validate_after_estimation(&release(3)), ReportStatus::IvIsFv);
  }

  #[test]
  fn empty_touched_files_after_estimation() {
    let mut r = report(Some(1), Some(2), Some(3));
    r.touched_files.clear();
    assert_eq!(r.validate_before_estimation(), ReportStatus::Valid);
    assert_eq!(r.validate_after_estimation(&release(3)), ReportStatus::EmptyTouchedFiles);
  }

  #[test]
  fn injected_after_last_analyzed() {
    let r = report(Some(3), Some(3), Some(4));
    assert_eq!(r.validate_after_estimation(&release(2)), ReportStatus::AfterLastRelease);
    assert_eq!(r.validate_after_estimation(&release(3)), ReportStatus::Valid);
  }
}
