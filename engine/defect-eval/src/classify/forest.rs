//! Random forest on aprender's `RandomForestClassifier`.
//!
//! aprender only reports hard class votes, so the forest is kept as
//! independently seeded single-tree members and the buggy probability is the
//! share of members voting buggy.

use aprender::tree::RandomForestClassifier;
use rand::rngs::StdRng;
use rand::Rng;

use super::{class_ids, to_matrix, Model};
use crate::error::EvalError;
use crate::types::Partition;

#[derive(Debug)]
pub struct RandomForest {
  members: Vec<RandomForestClassifier>,
  width: usize,
}

impl RandomForest {
  pub fn fit(training: &Partition, trees: usize, rng: &mut StdRng) -> Result<Self, EvalError> {
    let width = training.width();
    let x = to_matrix(&training.rows, width)?;
    let y = class_ids(training);

    let members = (0..trees.max(1))
      .map(|_| {
        let mut member = RandomForestClassifier::new(1).with_random_state(rng.gen());
        member
          .fit(&x, &y)
          .map_err(|e| EvalError::fit(format!("random forest: {e}")))?;
        Ok(member)
      })
      .collect::<Result<Vec<_>, EvalError>>()?;
    Ok(Self { members, width })
  }
}

impl Model for RandomForest {
  fn prob_buggy(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, EvalError> {
    if rows.is_empty() {
      return Ok(Vec::new());
    }
    let x = to_matrix(rows, self.width)?;
    let mut votes = vec![0usize; rows.len()];
    for member in &self.members {
      for (vote, class) in votes.iter_mut().zip(member.predict(&x)) {
        *vote += usize::from(class == 1);
      }
    }
    let total = self.members.len() as f64;
    Ok(votes.into_iter().map(|v| v as f64 / total).collect())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::SeedableRng;

  fn stripes() -> Partition {
    // Buggy iff x in [10, 20); y is noise.
    let mut p = Partition::new(vec!["x".into(), "y".into()]);
    for x in 0..30 {
      p.push(vec![x as f64, (x * 7 % 5) as f64], (10..20).contains(&x));
    }
    p
  }

  #[test]
  fn votes_are_shares_of_members() {
    let forest = RandomForest::fit(&stripes(), 8, &mut StdRng::seed_from_u64(5)).unwrap();
    let probs = forest.prob_buggy(&[vec![15.0, 0.0], vec![2.0, 4.0]]).unwrap();
    for p in &probs {
      assert_eq!((p * 8.0).fract(), 0.0, "{}", p);
    }
    assert!(probs[0] > probs[1], "{:?}", probs);
  }

  #[test]
  fn forest_is_reproducible_from_seed() {
    let p = stripes();
    let a = RandomForest::fit(&p, 10, &mut StdRng::seed_from_u64(9)).unwrap();
    let b = RandomForest::fit(&p, 10, &mut StdRng::seed_from_u64(9)).unwrap();
    let rows: Vec<Vec<f64>> = (0..30).map(|x| vec![x as f64, 2.0]).collect();
    assert_eq!(a.prob_buggy(&rows).unwrap(), b.prob_buggy(&rows).unwrap());
  }

  #[test]
  fn zero_trees_still_grows_one() {
    let forest = RandomForest::fit(&stripes(), 0, &mut StdRng::seed_from_u64(1)).unwrap();
    assert_eq!(forest.members.len(), 1);
    assert!(forest.prob_buggy(&[]).unwrap().is_empty());
  }
}
