//! Lanczos iteration with full reorthogonalization for a few of the largest
//! eigenvalues of a symmetric operator.
//!
//! A single start vector only sees one copy of a repeated eigenvalue. The
//! iteration restarts with a fresh random vector whenever it finds an
//! invariant subspace, which recovers multiplicities in exact arithmetic.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use thiserror::Error;
use tracing::{debug, trace};

/// Relative size of the Lanczos residual below which the Krylov space is
/// considered invariant.
const BREAKDOWN_TOL: f64 = 1e-12;
/// Number of iterations between two Ritz convergence checks.
const CHECK_INTERVAL: usize = 5;

pub trait SymmetricOperator {
  fn dim(&self) -> usize;
  fn apply(&self, x: &na::DVector<f64>) -> na::DVector<f64>;

  /// The components the operator acts on. Start vectors vanish outside of
  /// them, so the Krylov space never leaves the support.
  fn support(&self) -> Option<&[bool]> {
    None
  }
}

impl SymmetricOperator for na::DMatrix<f64> {
  fn dim(&self) -> usize {
    self.nrows()
  }
  fn apply(&self, x: &na::DVector<f64>) -> na::DVector<f64> {
    self * x
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LanczosParams {
  /// Number of wanted eigenvalues.
  pub nev: usize,
  /// Relative tolerance on the Ritz residuals.
  pub tol: f64,
  pub max_iterations: usize,
  pub seed: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LanczosEigen {
  /// The largest eigenvalues, descending.
  pub eigenvalues: Vec<f64>,
  pub iterations: usize,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LanczosError {
  #[error(
    "lanczos did not converge: {nconverged} of {nev} ritz values converged in {iterations} iterations"
  )]
  NotConverged {
    iterations: usize,
    nconverged: usize,
    nev: usize,
  },
}

/// A Ritz value together with its residual norm estimate.
#[derive(Debug, Clone, Copy)]
struct RitzPair {
  value: f64,
  residual: f64,
}

/// Computes the `params.nev` largest eigenvalues of `op`.
///
/// The request is capped by the size of the support of the operator.
pub fn largest_eigenvalues(
  op: &impl SymmetricOperator,
  params: &LanczosParams,
) -> Result<LanczosEigen, LanczosError> {
  let support = op
    .support()
    .map_or_else(|| vec![true; op.dim()], |s| s.to_vec());
  let rank = support.iter().filter(|&&s| s).count();
  let nev = params.nev.min(rank);
  if nev == 0 {
    return Ok(LanczosEigen {
      eigenvalues: Vec::new(),
      iterations: 0,
    });
  }

  let mut rng = Pcg64::seed_from_u64(params.seed);
  let mut basis: Vec<na::DVector<f64>> = Vec::new();
  let mut alphas: Vec<f64> = Vec::new();
  let mut betas: Vec<f64> = Vec::new();
  let mut norm_estimate: f64 = 0.0;
  let mut nconverged = 0;

  let Some(mut v) = random_unit_vector(&mut rng, &support, &basis) else {
    return Ok(LanczosEigen {
      eigenvalues: Vec::new(),
      iterations: 0,
    });
  };

  for iteration in 1..=params.max_iterations {
    let mut w = op.apply(&v);
    let alpha = v.dot(&w);
    basis.push(v);
    alphas.push(alpha);

    orthogonalize(&mut w, &basis);
    let beta = w.norm();
    norm_estimate = norm_estimate.max(alpha.abs() + beta);

    if basis.len() == rank {
      debug!("krylov space exhausted after {iteration} iterations");
      return Ok(finish(ritz_pairs(&alphas, &betas, 0.0), nev, iteration));
    }

    // An invariant subspace may still miss copies of repeated eigenvalues,
    // so convergence is only checked on regular steps.
    let invariant = beta <= BREAKDOWN_TOL * norm_estimate;
    if !invariant && basis.len() >= nev && basis.len() % CHECK_INTERVAL == 0 {
      let ritz = ritz_pairs(&alphas, &betas, beta);
      nconverged = ritz[..nev]
        .iter()
        .filter(|pair| pair.residual <= params.tol * pair.value.abs())
        .count();
      trace!("iteration {iteration}: {nconverged} of {nev} ritz values converged");
      if nconverged == nev {
        debug!("lanczos converged after {iteration} iterations");
        return Ok(finish(ritz, nev, iteration));
      }
    }

    if invariant {
      trace!("invariant subspace of dimension {} found, restarting", basis.len());
      match random_unit_vector(&mut rng, &support, &basis) {
        Some(next) => v = next,
        None => return Ok(finish(ritz_pairs(&alphas, &betas, 0.0), nev, iteration)),
      }
      betas.push(0.0);
    } else {
      v = w / beta;
      betas.push(beta);
    }
  }

  Err(LanczosError::NotConverged {
    iterations: params.max_iterations,
    nconverged,
    nev,
  })
}

fn finish(ritz: Vec<RitzPair>, nev: usize, iterations: usize) -> LanczosEigen {
  LanczosEigen {
    eigenvalues: ritz.iter().take(nev).map(|pair| pair.value).collect(),
    iterations,
  }
}

/// Ritz pairs of the tridiagonal Lanczos matrix, descending.
///
/// The residual of Ritz value $theta_i$ is $|beta_m y_(m,i)|$.
fn ritz_pairs(alphas: &[f64], betas: &[f64], beta: f64) -> Vec<RitzPair> {
  let (values, last_components) = tridiagonal_eigen(alphas, betas).unwrap_or_else(|| {
    debug!("implicit QL did not converge, using a dense eigendecomposition");
    dense_tridiagonal_eigen(alphas, betas)
  });

  let mut pairs: Vec<RitzPair> = values
    .into_iter()
    .zip(last_components)
    .map(|(value, y)| RitzPair {
      value,
      residual: (beta * y).abs(),
    })
    .collect();
  pairs.sort_by(|a, b| b.value.total_cmp(&a.value));
  pairs
}

/// Eigenvalues of the symmetric tridiagonal matrix with diagonal `diag` and
/// off-diagonal `offdiag`, together with the last component of each
/// normalized eigenvector.
///
/// Implicit QL with Wilkinson shifts. Only the last row of the eigenvector
/// matrix is accumulated, so the cost is quadratic in the size.
/// Returns `None` if an eigenvalue does not converge.
fn tridiagonal_eigen(diag: &[f64], offdiag: &[f64]) -> Option<(Vec<f64>, Vec<f64>)> {
  const MAX_SWEEPS: usize = 60;

  let n = diag.len();
  let mut d = diag.to_vec();
  // e[i] couples i and i + 1
  let mut e: Vec<f64> = offdiag.iter().copied().take(n.saturating_sub(1)).collect();
  e.resize(n, 0.0);
  let mut z = vec![0.0; n];
  if n > 0 {
    z[n - 1] = 1.0;
  }

  for l in 0..n {
    let mut nsweeps = 0;
    loop {
      let mut m = l;
      while m + 1 < n {
        let dd = d[m].abs() + d[m + 1].abs();
        if e[m].abs() <= f64::EPSILON * dd {
          break;
        }
        m += 1;
      }
      if m == l {
        break;
      }
      nsweeps += 1;
      if nsweeps > MAX_SWEEPS {
        return None;
      }

      let mut g = (d[l + 1] - d[l]) / (2.0 * e[l]);
      let mut r = g.hypot(1.0);
      g = d[m] - d[l] + e[l] / (g + r.copysign(g));
      let (mut s, mut c, mut p) = (1.0, 1.0, 0.0);
      let mut deflated = false;
      for i in (l..m).rev() {
        let f = s * e[i];
        let b = c * e[i];
        r = f.hypot(g);
        e[i + 1] = r;
        if r == 0.0 {
          d[i + 1] -= p;
          e[m] = 0.0;
          deflated = true;
          break;
        }
        s = f / r;
        c = g / r;
        g = d[i + 1] - p;
        r = (d[i] - g) * s + 2.0 * c * b;
        p = s * r;
        d[i + 1] = g + p;
        g = c * r - b;

        let zi1 = z[i + 1];
        z[i + 1] = s * z[i] + c * zi1;
        z[i] = c * z[i] - s * zi1;
      }
      if deflated {
        continue;
      }
      d[l] -= p;
      e[l] = g;
      e[m] = 0.0;
    }
  }
  Some((d, z))
}

fn dense_tridiagonal_eigen(alphas: &[f64], betas: &[f64]) -> (Vec<f64>, Vec<f64>) {
  let m = alphas.len();
  let mut tridiag = na::DMatrix::from_diagonal(&na::DVector::from_column_slice(alphas));
  for (i, &b) in betas.iter().enumerate().take(m.saturating_sub(1)) {
    tridiag[(i, i + 1)] = b;
    tridiag[(i + 1, i)] = b;
  }
  let eigen = na::SymmetricEigen::new(tridiag);
  let last = (0..m).map(|i| eigen.eigenvectors[(m - 1, i)]).collect();
  (eigen.eigenvalues.iter().copied().collect(), last)
}

/// Gram-Schmidt against an orthonormal basis, applied twice.
fn orthogonalize(w: &mut na::DVector<f64>, basis: &[na::DVector<f64>]) {
  for _ in 0..2 {
    for v in basis {
      let coeff = v.dot(w);
      w.axpy(-coeff, v, 1.0);
    }
  }
}

/// A random unit vector on the support, orthogonal to `basis`.
///
/// Returns `None` if the basis already spans the support numerically.
fn random_unit_vector(
  rng: &mut Pcg64,
  support: &[bool],
  basis: &[na::DVector<f64>],
) -> Option<na::DVector<f64>> {
  let mut v = na::DVector::from_iterator(
    support.len(),
    support
      .iter()
      .map(|&s| if s { rng.gen_range(-1.0..1.0) } else { 0.0 }),
  );
  let initial_norm = v.norm();
  orthogonalize(&mut v, basis);
  let norm = v.norm();
  (norm > 1e-10 * initial_norm).then(|| v / norm)
}
