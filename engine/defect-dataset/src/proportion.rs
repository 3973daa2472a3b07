//! Injected-version estimation with the incremental proportion heuristic.
//!
//! For reports with a known injected version the ratio
//! `p = (fix - injected) / (fix - opening)` is observable. Reports without one
//! get `injected = round(fix - (fix - opening) * p)` where `p` averages the
//! ratios of previously processed reports. Estimated reports join the history,
//! so the pass is strictly sequential in key order.

use tracing::debug;

use crate::config::{Config, ProportionPolicy};
use crate::timeline::{Timeline, FRACTION_EPSILON};
use crate::types::{DefectReport, Release};

/// Version indices of one completed report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionTriple {
  pub injected: u32,
  pub opening: u32,
  pub fix: u32,
}

impl VersionTriple {
  /// `(fix - injected) / (fix - opening)`, or 1.0 when fix == opening.
  pub fn ratio(&self) -> f64 {
    if self.fix == self.opening {
      return 1.0;
    }
    (self.fix as f64 - self.injected as f64) / (self.fix as f64 - self.opening as f64)
  }
}

/// Append-only history of processed reports, threaded through the fold.
#[derive(Debug, Clone, Default)]
pub struct ProportionState {
  history: Vec<VersionTriple>,
}

impl ProportionState {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.history.len()
  }

  pub fn is_empty(&self) -> bool {
    self.history.is_empty()
  }

  pub fn record(&mut self, triple: VersionTriple) {
    self.history.push(triple);
  }

  /// Reports contributing to the next estimate.
  pub fn window(&self, policy: ProportionPolicy, fraction: f64) -> &[VersionTriple] {
    let n = self.history.len();
    match policy {
      ProportionPolicy::Global => &self.history,
      ProportionPolicy::Moving if self.is_empty() => &self.history,
      ProportionPolicy::Moving => {
        // Tolerate products like 0.07 * 100 landing a hair above the integer.
        let size = ((fraction * n as f64 - FRACTION_EPSILON).ceil() as usize).clamp(1, n);
        &self.history[n - size..]
      }
    }
  }

  /// Mean ratio over the window; 1.0 when the window is empty.
  pub fn proportion(&self, policy: ProportionPolicy, fraction: f64) -> f64 {
    let window = self.window(policy, fraction);
    if window.is_empty() {
      return 1.0;
    }
    window.iter().map(VersionTriple::ratio).sum::<f64>() / window.len() as f64
  }
}

/// Apply the proportion to one report's opening/fix pair.
///
/// Indices at or below zero clamp to release 1; indices past the released
/// range resolve to the first unreleased version (or `fix` if there is none).
pub fn estimate_injected(opening: &Release, fix: &Release, p: f64, timeline: &Timeline) -> Release {
  let span = fix.index as f64 - opening.index as f64;
  let raw = (fix.index as f64 - span * p).round() as i64;
  let index = raw.max(1) as u32;

  if index > timeline.released_count() {
    return timeline.first_unreleased().unwrap_or(fix).clone();
  }
  timeline.by_index(index).unwrap_or(fix).clone()
}

/// Fill in missing injected versions, in order, returning the completed reports
/// and how many were estimated. Reports lacking opening/fix pass through.
pub fn estimate_all(
  reports: Vec<DefectReport>,
  timeline: &Timeline,
  config: &Config,
) -> (Vec<DefectReport>, usize) {
  let (_, completed, estimated) = reports.into_iter().fold(
    (ProportionState::new(), Vec::new(), 0usize),
    |(mut state, mut completed, mut estimated), mut report| {
      let (Some(opening), Some(fix)) = (report.opening.clone(), report.fix.clone()) else {
        completed.push(report);
        return (state, completed, estimated);
      };

      let injected = match report.injected.clone() {
        Some(known) => known,
        None => {
          let p = state.proportion(config.proportion_policy, config.proportion_window);
          let guess = estimate_injected(&opening, &fix, p, timeline);
          debug!(
            key = %report.key,
            opening = opening.index,
            fix = fix.index,
            p,
            history = state.len(),
            injected = guess.index,
            "estimated injected version"
          );
          report.injected = Some(guess.clone());
          report.injected_estimated = true;
          estimated += 1;
          guess
        }
      };

      state.record(VersionTriple {
        injected: injected.index,
        opening: opening.index,
        fix: fix.index,
      });
      completed.push(report);
      (state, completed, estimated)
    },
  );
  (completed, estimated)
}
