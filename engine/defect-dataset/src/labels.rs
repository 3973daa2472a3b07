//! Buggy-label propagation across the injected -> fixed release range.

use tracing::debug;

use crate::frame::DatasetFrame;
use crate::types::{DefectReport, Release, ReportStatus, ReportTally};

/// Mark every touched file buggy in releases `[injected, fix)`, capped at the
/// last analyzed release. Reports failing the post-estimation check are
/// tallied and skipped. Returns the number of row markings.
pub fn propagate(
  frame: &mut DatasetFrame,
  reports: &[DefectReport],
  last_analyzed: &Release,
  tally: &mut ReportTally,
) -> usize {
  let mut marked = 0;

  for report in reports {
    let status = report.validate_after_estimation(last_analyzed);
    tally.record(status);
    if status != ReportStatus::Valid {
      debug!(key = %report.key, ?status, "report excluded from labeling");
      continue;
    }
    let (Some(injected), Some(fix)) = (&report.injected, &report.fix) else {
      continue;
    };

    let upper = fix.index.min(last_analyzed.index + 1);
    for release_index in injected.index..upper {
      for path in &report.touched_files {
        if let Some(row) = frame.get_mut(release_index, path) {
          row.mark_buggy();
          marked += 1;
        }
      }
    }
  }

  marked
}
