//! Training-set rebalancing. Testing partitions never come through here.
//!
//! Minority/majority are the smaller/larger class by count (buggy on ties).
//! Every policy degrades to the identity when the minority class is empty.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::Config;
use crate::types::{Partition, ResamplingKind};

/// Rebalances one training partition using the cell's RNG.
pub trait Resampler: Send + Sync {
  fn resample(&self, training: &Partition, rng: &mut StdRng) -> Partition;
}

/// Target sample size as a percentage of the partition size.
///
/// - Oversampling: `200 * majority / n`
/// - Smote: `100 * (majority - minority) / minority` (synthetic rows to add)
/// - Undersampling: `100 * 2 * minority / n` (informational)
///
/// Oversampling and Smote report 0 when the minority class is empty.
pub fn target_percent(kind: ResamplingKind, partition: &Partition) -> f64 {
  let (minority, majority) = partition.class_counts();
  let n = partition.len() as f64;
  match kind {
    ResamplingKind::None => 100.0,
    _ if minority == 0 => 0.0,
    ResamplingKind::Oversampling => 200.0 * majority as f64 / n,
    ResamplingKind::Smote => 100.0 * (majority - minority) as f64 / minority as f64,
    ResamplingKind::Undersampling => 100.0 * 2.0 * minority as f64 / n,
  }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoResampling;

impl Resampler for NoResampling {
  fn resample(&self, training: &Partition, _rng: &mut StdRng) -> Partition {
    training.clone()
  }
}

/// Sampling with replacement, biased fully towards a uniform class mix.
#[derive(Debug, Clone, Copy, Default)]
pub struct Oversampling;

impl Resampler for Oversampling {
  fn resample(&self, training: &Partition, rng: &mut StdRng) -> Partition {
    let percent = target_percent(ResamplingKind::Oversampling, training);
    if percent == 0.0 {
      return training.clone();
    }
    let total = (training.len() as f64 * percent / 100.0).round() as usize;
    let buggy = training.indices_of(true);
    let clean = training.indices_of(false);

    // Buggy comes first in class order and takes the odd draw.
    let buggy_draws = total - total / 2;
    let mut picked = Vec::with_capacity(total);
    picked.extend((0..buggy_draws).map(|_| buggy[rng.gen_range(0..buggy.len())]));
    picked.extend((0..total / 2).map(|_| clean[rng.gen_range(0..clean.len())]));
    training.take(&picked)
  }
}

/// Random majority subsampling down to a 1:1 class spread.
#[derive(Debug, Clone, Copy, Default)]
pub struct Undersampling;

impl Resampler for Undersampling {
  fn resample(&self, training: &Partition, rng: &mut StdRng) -> Partition {
    let (minority, _) = training.class_counts();
    if minority == 0 {
      return training.clone();
    }
    let minority_label = training.minority_label();
    let majority_rows = training.indices_of(!minority_label);

    let mut kept = training.indices_of(minority_label);
    kept.extend(majority_rows.choose_multiple(rng, minority).copied());
    kept.sort_unstable();
    training.take(&kept)
  }
}

/// Synthetic minority oversampling: new rows interpolated between a minority
/// row and one of its nearest minority neighbours.
#[derive(Debug, Clone, Copy)]
pub struct Smote {
  pub neighbors: usize,
}

impl Resampler for Smote {
  fn resample(&self, training: &Partition, rng: &mut StdRng) -> Partition {
    let percent = target_percent(ResamplingKind::Smote, training);
    if percent == 0.0 {
      return training.clone();
    }
    let label = training.minority_label();
    let minority = training.indices_of(label);
    let count = (minority.len() as f64 * percent / 100.0).round() as usize;

    let neighbours: Vec<Vec<usize>> = minority
      .iter()
      .map(|&i| nearest(training, i, &minority, self.neighbors))
      .collect();

    let mut out = training.clone();
    for s in 0..count {
      let slot = s % minority.len();
      let base = &training.rows[minority[slot]];
      let synthetic = match neighbours[slot].as_slice() {
        [] => base.clone(),
        candidates => {
          let other = &training.rows[candidates[rng.gen_range(0..candidates.len())]];
          let gap: f64 = rng.gen();
          base.iter().zip(other).map(|(a, b)| a + gap * (b - a)).collect()
        }
      };
      out.push(synthetic, label);
    }
    out
  }
}

/// The `k` minority rows closest to `row` (Euclidean), nearest first.
fn nearest(partition: &Partition, row: usize, minority: &[usize], k: usize) -> Vec<usize> {
  let origin = &partition.rows[row];
  let mut scored: Vec<(f64, usize)> = minority
    .iter()
    .filter(|&&i| i != row)
    .map(|&i| {
      let d = partition.rows[i]
        .iter()
        .zip(origin)
        .map(|(a, b)| (a - b) * (a - b))
        .sum::<f64>();
      (d, i)
    })
    .collect();
  scored.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
  scored.into_iter().take(k).map(|(_, i)| i).collect()
}

impl ResamplingKind {
  pub fn resampler(self, config: &Config) -> Box<dyn Resampler> {
    match self {
      Self::None => Box::new(NoResampling),
      Self::Oversampling => Box::new(Oversampling),
      Self::Undersampling => Box::new(Undersampling),
      Self::Smote => Box::new(Smote {
        neighbors: config.smote_neighbors,
      }),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::SeedableRng;

  fn partition(buggy: usize, clean: usize) -> Partition {
    let mut p = Partition::new(vec!["x".into(), "y".into()]);
    for i in 0..buggy {
      p.push(vec![10.0 + i as f64, 1.0], true);
    }
    for i in 0..clean {
      p.push(vec![i as f64, 0.0], false);
    }
    p
  }

  fn rng() -> StdRng {
    StdRng::seed_from_u64(7)
  }

  #[test]
  fn zero_minority_gives_zero_target() {
    let p = partition(0, 8);
    assert_eq!(target_percent(ResamplingKind::Oversampling, &p), 0.0);
    assert_eq!(target_percent(ResamplingKind::Smote, &p), 0.0);
    assert_eq!(target_percent(ResamplingKind::Undersampling, &p), 0.0);
    assert_eq!(target_percent(ResamplingKind::None, &p), 100.0);

    let all_buggy = partition(5, 0);
    assert_eq!(target_percent(ResamplingKind::Oversampling, &all_buggy), 0.0);
    assert_eq!(target_percent(ResamplingKind::Smote, &all_buggy), 0.0);
  }

  #[test]
  fn zero_minority_is_identity_for_every_policy() {
    let p = partition(0, 6);
    let config = Config::default();
    for kind in ResamplingKind::ALL {
      assert_eq!(kind.resampler(&config).resample(&p, &mut rng()), p, "{:?}", kind);
    }
    assert_eq!(target_percent(ResamplingKind::Oversampling, &Partition::default()), 0.0);
  }

  #[test]
  fn target_percent_formulas() {
    let p = partition(2, 8);
    assert_eq!(target_percent(ResamplingKind::Oversampling, &p), 160.0);
    assert_eq!(target_percent(ResamplingKind::Smote, &p), 300.0);
    assert_eq!(target_percent(ResamplingKind::Undersampling, &p), 40.0);
  }

  #[test]
  fn oversampling_balances_to_majority() {
    let p = partition(2, 8);
    let out = Oversampling.resample(&p, &mut rng());
    // 10 * 160% = 16 rows, half per class.
    assert_eq!(out.len(), 16);
    assert_eq!(out.buggy_count(), 8);
    assert_eq!(out.clean_count(), 8);
    assert!(out.rows.iter().all(|r| p.rows.contains(r)));
  }

  #[test]
  fn undersampling_keeps_every_minority_row() {
    let p = partition(3, 9);
    let out = Undersampling.resample(&p, &mut rng());
    assert_eq!(out.len(), 6);
    assert_eq!(out.buggy_count(), 3);
    for i in 0..3 {
      assert!(out.rows.contains(&p.rows[i]));
    }
  }

  #[test]
  fn undersampling_handles_buggy_majority() {
    let p = partition(7, 2);
    let out = Undersampling.resample(&p, &mut rng());
    assert_eq!(out.clean_count(), 2);
    assert_eq!(out.buggy_count(), 2);
  }

  #[test]
  fn smote_adds_interpolated_minority_rows() {
    let p = partition(3, 9);
    let out = Smote { neighbors: 5 }.resample(&p, &mut rng());
    // 100 * (9 - 3) / 3 = 200% of 3 minority rows.
    assert_eq!(out.len(), 12 + 6);
    assert_eq!(out.buggy_count(), 9);
    for synthetic in &out.rows[12..] {
      assert!((10.0..=12.0).contains(&synthetic[0]));
      assert_eq!(synthetic[1], 1.0);
    }
    assert_eq!(&out.rows[..12], &p.rows[..]);
  }

  #[test]
  fn smote_single_minority_row_duplicates_it() {
    let p = partition(1, 3);
    let out = Smote { neighbors: 5 }.resample(&p, &mut rng());
    assert_eq!(out.len(), 6);
    assert_eq!(out.rows[4], p.rows[0]);
    assert_eq!(out.rows[5], p.rows[0]);
  }

  #[test]
  fn same_seed_same_sample() {
    let p = partition(4, 20);
    let a = Oversampling.resample(&p, &mut rng());
    let b = Oversampling.resample(&p, &mut rng());
    assert_eq!(a, b);
  }
}
