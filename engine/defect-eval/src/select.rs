//! Feature selection: identity, or correlation-based subset evaluation (CFS)
//! driven by a best-first forward search.
//!
//! The subset is always chosen on the training partition and then applied to
//! both partitions, so training and testing share one column layout.

use std::collections::HashSet;

use crate::config::Config;
use crate::types::{FeatureSelectionKind, Partition};

/// Chooses a column subset from training data.
pub trait FeatureSelector: Send + Sync {
  /// Kept column indices, ascending.
  fn columns(&self, training: &Partition) -> Vec<usize>;

  fn select(&self, training: &Partition, testing: &Partition) -> (Partition, Partition) {
    let columns = self.columns(training);
    (training.project(&columns), testing.project(&columns))
  }
}

/// Keep every column.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllFeatures;

impl FeatureSelector for AllFeatures {
  fn columns(&self, training: &Partition) -> Vec<usize> {
    (0..training.width()).collect()
  }

  fn select(&self, training: &Partition, testing: &Partition) -> (Partition, Partition) {
    (training.clone(), testing.clone())
  }
}

/// CFS merit maximized by best-first forward search.
#[derive(Debug, Clone, Copy)]
pub struct CfsBestFirst {
  pub stale_limit: usize,
}

impl FeatureSelector for CfsBestFirst {
  fn columns(&self, training: &Partition) -> Vec<usize> {
    let correlations = Correlations::measure(training);
    best_first(&correlations, training.width(), self.stale_limit)
  }
}

impl FeatureSelectionKind {
  pub fn selector(self, config: &Config) -> Box<dyn FeatureSelector> {
    match self {
      Self::None => Box::new(AllFeatures),
      Self::BestFirst => Box::new(CfsBestFirst {
        stale_limit: config.best_first_stale_limit,
      }),
    }
  }
}

/// Absolute Pearson correlations, feature-class and feature-feature.
#[derive(Debug, Clone)]
pub struct Correlations {
  class: Vec<f64>,
  pairwise: Vec<Vec<f64>>,
}

impl Correlations {
  pub fn measure(partition: &Partition) -> Self {
    let width = partition.width();
    let columns: Vec<Vec<f64>> = (0..width).map(|j| partition.column(j).collect()).collect();
    let target: Vec<f64> = partition.labels.iter().map(|&b| if b { 1.0 } else { 0.0 }).collect();

    let class = columns.iter().map(|c| pearson(c, &target)).collect();
    let mut pairwise = vec![vec![1.0; width]; width];
    for a in 0..width {
      for b in (a + 1)..width {
        let r = pearson(&columns[a], &columns[b]);
        pairwise[a][b] = r;
        pairwise[b][a] = r;
      }
    }
    Self { class, pairwise }
  }

  /// `k * mean(r_cf) / sqrt(k + k(k-1) * mean(r_ff))`; 0 for the empty subset.
  pub fn merit(&self, subset: &[usize]) -> f64 {
    let k = subset.len();
    if k == 0 {
      return 0.0;
    }
    let kf = k as f64;
    let r_cf = subset.iter().map(|&j| self.class[j]).sum::<f64>() / kf;

    let mut pair_sum = 0.0;
    for (i, &a) in subset.iter().enumerate() {
      for &b in &subset[i + 1..] {
        pair_sum += self.pairwise[a][b];
      }
    }
    let pairs = kf * (kf - 1.0) / 2.0;
    let r_ff = if pairs > 0.0 { pair_sum / pairs } else { 0.0 };

    kf * r_cf / (kf + kf * (kf - 1.0) * r_ff).sqrt()
  }
}

/// |r|, or 0 when either side has no variance.
fn pearson(x: &[f64], y: &[f64]) -> f64 {
  let n = x.len();
  if n == 0 {
    return 0.0;
  }
  let mean_x = x.iter().sum::<f64>() / n as f64;
  let mean_y = y.iter().sum::<f64>() / n as f64;
  let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
  for (a, b) in x.iter().zip(y) {
    let (dx, dy) = (a - mean_x, b - mean_y);
    cov += dx * dy;
    var_x += dx * dx;
    var_y += dy * dy;
  }
  if var_x <= 0.0 || var_y <= 0.0 {
    return 0.0;
  }
  (cov / (var_x * var_y).sqrt()).abs()
}

/// Forward best-first search from the empty subset. Stops after `stale_limit`
/// consecutive expansions that fail to beat the best merit seen.
fn best_first(correlations: &Correlations, width: usize, stale_limit: usize) -> Vec<usize> {
  let mut visited: HashSet<Vec<usize>> = HashSet::new();
  let mut open: Vec<(f64, Vec<usize>)> = vec![(0.0, Vec::new())];
  let mut best: (f64, Vec<usize>) = (0.0, Vec::new());
  let mut stale = 0;

  while stale < stale_limit {
    // Highest merit first; the earliest queued wins ties.
    let Some(pos) = open
      .iter()
      .enumerate()
      .fold(None, |acc: Option<(usize, f64)>, (i, (merit, _))| match acc {
        Some((_, m)) if m >= *merit => acc,
        _ => Some((i, *merit)),
      })
      .map(|(i, _)| i)
    else {
      break;
    };
    let (_, subset) = open.remove(pos);

    let mut improved = false;
    for j in 0..width {
      if subset.contains(&j) {
        continue;
      }
      let mut child = subset.clone();
      child.push(j);
      child.sort_unstable();
      if !visited.insert(child.clone()) {
        continue;
      }
      let merit = correlations.merit(&child);
      if merit > best.0 {
        best = (merit, child.clone());
        improved = true;
      }
      open.push((merit, child));
    }

    if improved {
      stale = 0;
    } else {
      stale += 1;
    }
  }

  best.1
}

#[cfg(test)]
mod tests {
  use super::*;

  /// col 0 tracks the label, col 1 duplicates col 0, col 2 is noise, col 3 is constant.
  fn partition() -> Partition {
    let mut p = Partition::new(vec!["signal".into(), "copy".into(), "noise".into(), "flat".into()]);
    let data = [
      (9.0, 1.0, true),
      (8.0, 3.0, true),
      (7.5, 2.0, true),
      (1.0, 1.0, false),
      (2.0, 3.0, false),
      (1.5, 2.0, false),
      (0.5, 2.5, false),
    ];
    for (signal, noise, label) in data {
      p.push(vec![signal, signal * 2.0, noise, 4.0], label);
    }
    p
  }

  #[test]
  fn pearson_degenerate_columns() {
    assert_eq!(pearson(&[1.0, 1.0, 1.0], &[0.0, 1.0, 0.0]), 0.0);
    assert_eq!(pearson(&[], &[]), 0.0);
    assert!((pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]) - 1.0).abs() < 1e-12);
  }

  #[test]
  fn merit_penalizes_redundancy() {
    let c = Correlations::measure(&partition());
    let alone = c.merit(&[0]);
    let with_copy = c.merit(&[0, 1]);
    // A perfectly correlated copy adds nothing.
    assert!((alone - with_copy).abs() < 1e-9);
    assert!(c.merit(&[0]) > c.merit(&[2]));
    assert_eq!(c.merit(&[3]), 0.0);
    assert_eq!(c.merit(&[]), 0.0);
  }

  #[test]
  fn best_first_picks_the_signal() {
    let cols = CfsBestFirst { stale_limit: 5 }.columns(&partition());
    assert!(cols.contains(&0) || cols.contains(&1));
    assert!(!cols.contains(&3));
    assert!(!cols.contains(&2));
  }

  #[test]
  fn same_columns_applied_to_both_partitions() {
    let train = partition();
    let test = partition().take(&[0, 3]);
    let (a, b) = CfsBestFirst { stale_limit: 5 }.select(&train, &test);
    assert_eq!(a.features, b.features);
    assert_eq!(b.len(), 2);
    assert_eq!(a.labels, train.labels);
  }

  #[test]
  fn uninformative_training_selects_nothing() {
    let mut p = Partition::new(vec!["flat".into()]);
    p.push(vec![1.0], true);
    p.push(vec![1.0], false);
    assert!(CfsBestFirst { stale_limit: 5 }.columns(&p).is_empty());
  }

  #[test]
  fn identity_keeps_everything() {
    let p = partition();
    let (a, b) = AllFeatures.select(&p, &p);
    assert_eq!(a, p);
    assert_eq!(b.width(), 4);
    assert_eq!(AllFeatures.columns(&p), vec![0, 1, 2, 3]);
  }
}
