//! Elliptic Eigenvalue Problems
//!
//! Smallest eigenvalues of the generalized problem $A u = lambda M u$ with a
//! sparse stiffness matrix $A$ and a lumped (diagonal) mass matrix $M$.
//!
//! The problem is solved by Lanczos on the shift-inverted operator
//! $S = M^(1/2) A^(-1) M^(1/2)$, whose largest eigenvalues $mu = 1 / lambda$
//! belong to the smallest eigenvalues of the pencil. Dofs without mass are
//! outside the support of $S$ and never produce an eigenvalue.

use crate::{
  lanczos::{self, LanczosError, LanczosParams, SymmetricOperator},
  linalg::{FaerCholesky, LinalgError},
  sparse::SparseMatrix,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EigenConfig {
  /// Relative tolerance on the Ritz residuals.
  pub tol: f64,
  pub max_iterations: usize,
  /// Eigenvalues requested on top of the wanted ones.
  pub extra: usize,
  /// Eigenvalues at or below this are discarded as spurious.
  pub zero_threshold: f64,
  /// Seed of the Lanczos start vectors.
  pub seed: u64,
}
impl Default for EigenConfig {
  fn default() -> Self {
    Self {
      tol: 1e-6,
      max_iterations: 5000,
      extra: 10,
      zero_threshold: 1e-8,
      seed: 0,
    }
  }
}

#[derive(Debug, Error)]
pub enum EigenError {
  #[error("invalid eigenvalue request: {0}")]
  InvalidRequest(String),
  #[error("eigensolver failed: {0}")]
  Factorization(#[from] LinalgError),
  #[error(
    "eigensolver did not converge: {nconverged} of {nrequested} eigenvalues converged within {iterations} iterations"
  )]
  NotConverged {
    iterations: usize,
    nconverged: usize,
    nrequested: usize,
  },
  #[error("eigensolver found no eigenvalues above {threshold:e}")]
  NoPositiveEigenvalues { threshold: f64 },
}
impl From<LanczosError> for EigenError {
  fn from(err: LanczosError) -> Self {
    match err {
      LanczosError::NotConverged {
        iterations,
        nconverged,
        nev,
      } => Self::NotConverged {
        iterations,
        nconverged,
        nrequested: nev,
      },
    }
  }
}

/// $S = M^(1/2) A^(-1) M^(1/2)$
struct ShiftInvertOperator {
  cholesky: FaerCholesky,
  sqrt_mass: na::DVector<f64>,
  support: Vec<bool>,
}
impl SymmetricOperator for ShiftInvertOperator {
  fn dim(&self) -> usize {
    self.sqrt_mass.len()
  }
  fn apply(&self, x: &na::DVector<f64>) -> na::DVector<f64> {
    let rhs = x.component_mul(&self.sqrt_mass);
    self.cholesky.solve(&rhs).component_mul(&self.sqrt_mass)
  }
  fn support(&self) -> Option<&[bool]> {
    Some(&self.support)
  }
}

/// The `neigen` smallest eigenvalues of $A u = lambda M u$, ascending.
///
/// `mass` is the diagonal of $M$. Fewer than `neigen` eigenvalues are
/// returned if the problem does not have enough of them above
/// `config.zero_threshold`.
pub fn solve_smallest_eigenvalues(
  galmat: &SparseMatrix,
  mass: &na::DVector<f64>,
  neigen: usize,
  config: &EigenConfig,
) -> Result<na::DVector<f64>, EigenError> {
  if neigen == 0 {
    return Err(EigenError::InvalidRequest(
      "at least one eigenvalue must be requested".into(),
    ));
  }
  if galmat.nrows() == 0 || !galmat.is_square() {
    return Err(EigenError::InvalidRequest(format!(
      "expected a nonempty square matrix, got {}x{}",
      galmat.nrows(),
      galmat.ncols()
    )));
  }
  if mass.len() != galmat.nrows() || mass.iter().any(|m| !m.is_finite() || *m < 0.0) {
    return Err(EigenError::InvalidRequest(
      "mass must be nonnegative with one entry per row".into(),
    ));
  }

  let asymmetry = galmat.max_asymmetry();
  if asymmetry > 0.0 {
    debug!("symmetrizing matrix with asymmetry {asymmetry:e}");
  }
  let galmat = galmat.symmetrized();

  let support: Vec<bool> = mass.iter().map(|&m| m > 0.0).collect();
  let nsupport = support.iter().filter(|&&s| s).count();
  let nrequested = (neigen + config.extra).min(nsupport);
  if nrequested == 0 {
    return Err(EigenError::NoPositiveEigenvalues {
      threshold: config.zero_threshold,
    });
  }

  let op = ShiftInvertOperator {
    cholesky: FaerCholesky::new(&galmat)?,
    sqrt_mass: mass.map(f64::sqrt),
    support,
  };
  let params = LanczosParams {
    nev: nrequested,
    tol: config.tol,
    max_iterations: config.max_iterations,
    seed: config.seed,
  };
  let result = lanczos::largest_eigenvalues(&op, &params)?;
  debug!(
    "{} ritz values after {} lanczos iterations",
    result.eigenvalues.len(),
    result.iterations
  );

  let mut eigenvalues: Vec<f64> = result
    .eigenvalues
    .into_iter()
    .filter(|&mu| mu > 0.0)
    .map(f64::recip)
    .filter(|&lambda| lambda > config.zero_threshold)
    .collect();
  eigenvalues.sort_by(f64::total_cmp);
  eigenvalues.truncate(neigen);

  if eigenvalues.is_empty() {
    return Err(EigenError::NoPositiveEigenvalues {
      threshold: config.zero_threshold,
    });
  }
  if eigenvalues.len() < neigen {
    warn!(
      "only {} of {neigen} requested eigenvalues found",
      eigenvalues.len()
    );
  }
  Ok(na::DVector::from_vec(eigenvalues))
}

/// The `neigen` smallest eigenvalues of the standard problem $A u = lambda u$.
pub fn solve_smallest_standard_eigenvalues(
  galmat: &SparseMatrix,
  neigen: usize,
  config: &EigenConfig,
) -> Result<na::DVector<f64>, EigenError> {
  let mass = na::DVector::from_element(galmat.nrows(), 1.0);
  solve_smallest_eigenvalues(galmat, &mass, neigen, config)
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::{
    assemble::{self, assemble_galmat_dirichlet},
    fe::LaplaceElmat,
    mesh::TetMesh,
  };

  use approx::assert_relative_eq;
  use std::f64::consts::PI;

  /// Finite difference laplacian on $(0, 1)$ with `n` interior nodes, scaled
  /// by $h^2$.
  fn laplacian_1d(n: usize) -> SparseMatrix {
    let mut a = SparseMatrix::zeros(n, n);
    for i in 0..n {
      a.push(i, i, 2.0);
      if i > 0 {
        a.push(i, i - 1, -1.0);
        a.push(i - 1, i, -1.0);
      }
    }
    a
  }

  #[test]
  fn matches_dense_eigen() {
    let n = 60;
    let a = laplacian_1d(n);
    let computed = solve_smallest_standard_eigenvalues(&a, 5, &EigenConfig::default()).unwrap();

    let mut dense: Vec<f64> = na::SymmetricEigen::new(a.to_nalgebra_dense())
      .eigenvalues
      .iter()
      .copied()
      .collect();
    dense.sort_by(f64::total_cmp);

    assert_eq!(computed.len(), 5);
    for (k, (&c, &d)) in computed.iter().zip(&dense).enumerate() {
      let exact = 2.0 - 2.0 * ((k + 1) as f64 * PI / (n + 1) as f64).cos();
      assert_relative_eq!(c, d, max_relative = 1e-5);
      assert_relative_eq!(d, exact, max_relative = 1e-10);
    }
  }

  #[test]
  fn generalized_with_diagonal_mass() {
    // $A u = lambda M u$ with $M = 2 I$ halves the spectrum.
    let a = laplacian_1d(30);
    let mass = na::DVector::from_element(30, 2.0);
    let config = EigenConfig::default();
    let generalized = solve_smallest_eigenvalues(&a, &mass, 4, &config).unwrap();
    let standard = solve_smallest_standard_eigenvalues(&a, 4, &config).unwrap();
    assert_relative_eq!(2.0 * generalized, standard, max_relative = 1e-5);
  }

  #[test]
  fn massless_dofs_are_excluded() {
    let n = 20;
    let mut a = laplacian_1d(n);
    let pinned = [0, 7, n - 1];
    assemble::enforce_homogeneous_dirichlet(&mut a, &pinned);
    let mut mass = na::DVector::from_element(n, 1.0);
    assemble::pin_mass(&mut mass, &pinned);

    let eigenvalues = solve_smallest_eigenvalues(&a, &mass, n, &EigenConfig::default()).unwrap();
    assert_eq!(eigenvalues.len(), n - pinned.len());
    assert!(eigenvalues.iter().all(|&l| l > 0.0));
    assert!(eigenvalues.as_slice().windows(2).all(|w| w[0] <= w[1]));
  }

  #[test]
  fn unit_cube_fundamental_eigenvalue() {
    let mesh = TetMesh::new_unit_cube(6);
    let boundary = mesh.boundary_nodes();
    let galmat = assemble_galmat_dirichlet(&mesh, LaplaceElmat, &boundary);
    let mut mass = assemble::assemble_lumped_mass(&mesh);
    assemble::pin_mass(&mut mass, &boundary);

    let eigenvalues = solve_smallest_eigenvalues(&galmat, &mass, 4, &EigenConfig::default()).unwrap();
    assert_eq!(eigenvalues.len(), 4);
    // On this mesh the scheme coincides with the 7-point finite difference
    // stencil, whose fundamental eigenvalue is known in closed form.
    let h = 1.0 / 6.0;
    let discrete = 3.0 * 4.0 / (h * h) * (PI * h / 2.0).sin().powi(2);
    assert_relative_eq!(eigenvalues[0], discrete, max_relative = 1e-5);
    assert_relative_eq!(eigenvalues[0], 3.0 * PI * PI, max_relative = 0.05);
  }

  #[test]
  fn invalid_requests() {
    let a = laplacian_1d(4);
    let config = EigenConfig::default();
    assert!(matches!(
      solve_smallest_standard_eigenvalues(&a, 0, &config),
      Err(EigenError::InvalidRequest(_))
    ));
    assert!(matches!(
      solve_smallest_standard_eigenvalues(&SparseMatrix::zeros(0, 0), 1, &config),
      Err(EigenError::InvalidRequest(_))
    ));
    assert!(matches!(
      solve_smallest_eigenvalues(&a, &na::DVector::zeros(3), 1, &config),
      Err(EigenError::InvalidRequest(_))
    ));
  }

  #[test]
  fn all_massless_has_no_eigenvalues() {
    let a = laplacian_1d(4);
    let result = solve_smallest_eigenvalues(&a, &na::DVector::zeros(4), 2, &EigenConfig::default());
    assert!(matches!(result, Err(EigenError::NoPositiveEigenvalues { .. })));
  }

  #[test]
  fn indefinite_fails_factorization() {
    let mut a = laplacian_1d(4);
    a.push(2, 2, -10.0);
    let result = solve_smallest_standard_eigenvalues(&a, 1, &EigenConfig::default());
    assert!(matches!(result, Err(EigenError::Factorization(_))));
  }

  #[test]
  fn iteration_limit() {
    let config = EigenConfig {
      max_iterations: 3,
      ..Default::default()
    };
    let result = solve_smallest_standard_eigenvalues(&laplacian_1d(100), 5, &config);
    assert!(matches!(
      result,
      Err(EigenError::NotConverged {
        iterations: 3,
        nconverged: 0,
        nrequested: 15
      })
    ));
  }
}
