//! Summary statistics of computed spectra.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Number of leading eigenvalues kept in the summary.
pub const NLEADING: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrumStatistics {
  pub count: usize,
  pub min: f64,
  pub max: f64,
  pub mean: f64,
  pub median: f64,
  /// Population standard deviation.
  pub std: f64,
  /// The first (up to) ten eigenvalues.
  pub first: Vec<f64>,
  /// Consecutive gaps among the first ten eigenvalues.
  pub gaps: Vec<f64>,
}

impl SpectrumStatistics {
  /// Statistics of an ascending eigenvalue sequence.
  ///
  /// Returns `None` for an empty sequence.
  pub fn from_eigenvalues(eigenvalues: &[f64]) -> Option<Self> {
    let count = eigenvalues.len();
    if count == 0 {
      return None;
    }
    debug_assert!(eigenvalues.windows(2).all(|w| w[0] <= w[1]));

    let mean = eigenvalues.iter().sum::<f64>() / count as f64;
    let variance = eigenvalues
      .iter()
      .map(|&l| (l - mean).powi(2))
      .sum::<f64>()
      / count as f64;
    let median = if count % 2 == 1 {
      eigenvalues[count / 2]
    } else {
      0.5 * (eigenvalues[count / 2 - 1] + eigenvalues[count / 2])
    };

    let first = eigenvalues[..count.min(NLEADING)].to_vec();
    let gaps = crate::util::consecutive_diffs(&first);

    Some(Self {
      count,
      min: eigenvalues[0],
      max: eigenvalues[count - 1],
      mean,
      median,
      std: variance.sqrt(),
      first,
      gaps,
    })
  }
}

/// Step points $(lambda, N(lambda))$ of the eigenvalue counting function
/// $N(lambda) = |{i : lambda_i <= lambda}|$ of an ascending sequence.
///
/// Repeated eigenvalues form a single step.
pub fn counting_function(eigenvalues: &[f64]) -> Vec<(f64, usize)> {
  eigenvalues
    .iter()
    .dedup_with_count()
    .scan(0, |count, (multiplicity, &lambda)| {
      *count += multiplicity;
      Some((lambda, *count))
    })
    .collect()
}

/// Leading term of Weyl's law for the Dirichlet laplacian on a domain in
/// $RR^3$: $N(lambda) ~ |Omega| lambda^(3/2) / (6 pi^2)$.
pub fn weyl_asymptotic_count(lambda: f64, volume: f64) -> f64 {
  volume * lambda.powf(1.5) / (6.0 * PI * PI)
}

#[cfg(test)]
mod test {
  use super::*;

  use approx::assert_relative_eq;

  #[test]
  fn known_sequence() {
    let eigenvalues: Vec<f64> = (1..=12).map(|i| i as f64).collect();
    let stats = SpectrumStatistics::from_eigenvalues(&eigenvalues).unwrap();
    assert_eq!(stats.count, 12);
    assert_eq!(stats.min, 1.0);
    assert_eq!(stats.max, 12.0);
    assert_relative_eq!(stats.mean, 6.5);
    assert_relative_eq!(stats.median, 6.5);
    // population variance of 1..=n is (n^2 - 1) / 12
    assert_relative_eq!(stats.std, (143.0f64 / 12.0).sqrt());
    assert_eq!(stats.first, eigenvalues[..10].to_vec());
    assert_eq!(stats.gaps, vec![1.0; 9]);
  }

  #[test]
  fn short_sequence() {
    let stats = SpectrumStatistics::from_eigenvalues(&[2.0, 3.0, 7.0]).unwrap();
    assert_eq!(stats.median, 3.0);
    assert_eq!(stats.first.len(), 3);
    assert_eq!(stats.gaps, vec![1.0, 4.0]);

    let single = SpectrumStatistics::from_eigenvalues(&[5.0]).unwrap();
    assert_eq!(single.std, 0.0);
    assert!(single.gaps.is_empty());

    assert!(SpectrumStatistics::from_eigenvalues(&[]).is_none());
  }

  #[test]
  fn counting_steps() {
    let steps = counting_function(&[1.0, 2.0, 2.0, 3.5]);
    assert_eq!(steps, vec![(1.0, 1), (2.0, 3), (3.5, 4)]);
    assert!(counting_function(&[]).is_empty());
  }

  #[test]
  fn weyl_law() {
    // The unit cube has $N(lambda) = lambda^(3/2) / (6 pi^2)$ asymptotically.
    let lambda = 6.0 * PI * PI;
    assert_relative_eq!(
      weyl_asymptotic_count(lambda, 1.0),
      (6.0 * PI * PI).sqrt()
    );
  }

  #[test]
  fn serializes() {
    let stats = SpectrumStatistics::from_eigenvalues(&[1.0, 2.0]).unwrap();
    let json = serde_json::to_string(&stats).unwrap();
    let parsed: SpectrumStatistics = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, stats);
  }
}
