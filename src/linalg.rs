use crate::sparse::SparseMatrix;

use faer::solvers::SpSolver;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LinalgError {
  #[error("expected a square matrix, got {nrows}x{ncols}")]
  NotSquare { nrows: usize, ncols: usize },
  #[error("sparse cholesky factorization failed: {0}")]
  Factorization(String),
}

/// Sparse Cholesky factorization of a symmetric positive definite matrix.
pub struct FaerCholesky {
  raw: faer::sparse::linalg::solvers::Cholesky<usize, f64>,
}
impl FaerCholesky {
  pub fn new(a: &SparseMatrix) -> Result<Self, LinalgError> {
    if !a.is_square() {
      return Err(LinalgError::NotSquare {
        nrows: a.nrows(),
        ncols: a.ncols(),
      });
    }
    let raw = a
      .to_faer_csc()
      .sp_cholesky(faer::Side::Lower)
      .map_err(|err| LinalgError::Factorization(format!("{err:?}")))?;
    Ok(Self { raw })
  }

  pub fn solve(&self, b: &na::DVector<f64>) -> na::DVector<f64> {
    let b = faer::col::from_slice(b.as_slice());
    na::DVector::from_vec(self.raw.solve(b).as_slice().to_vec())
  }
}

pub fn assert_mat_eq(a: &na::DMatrix<f64>, b: &na::DMatrix<f64>, epsilon: f64) {
  assert_eq!(a.shape(), b.shape());
  let diff = (a - b).abs().max();
  assert!(diff <= epsilon, "matrices differ by {diff:e}\n{a}\n{b}");
}
