//! Sparse matrices stored as unordered triplets.
//!
//! Triplets with the same position are summed whenever the matrix is
//! converted into a compressed format.

use std::collections::HashMap;

pub type Triplet = (usize, usize, f64);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseMatrix {
  nrows: usize,
  ncols: usize,
  triplets: Vec<Triplet>,
}

impl SparseMatrix {
  pub fn zeros(nrows: usize, ncols: usize) -> Self {
    Self::new(nrows, ncols, Vec::new())
  }
  pub fn new(nrows: usize, ncols: usize, triplets: Vec<Triplet>) -> Self {
    assert!(
      triplets.iter().all(|&(r, c, _)| r < nrows && c < ncols),
      "triplet out of bounds of {nrows}x{ncols} matrix"
    );
    Self {
      nrows,
      ncols,
      triplets,
    }
  }

  pub fn nrows(&self) -> usize {
    self.nrows
  }
  pub fn ncols(&self) -> usize {
    self.ncols
  }
  pub fn is_square(&self) -> bool {
    self.nrows == self.ncols
  }
  pub fn triplets(&self) -> &[Triplet] {
    &self.triplets
  }
  pub fn ntriplets(&self) -> usize {
    self.triplets.len()
  }

  pub fn push(&mut self, r: usize, c: usize, v: f64) {
    assert!(r < self.nrows && c < self.ncols, "({r},{c}) out of bounds");
    self.triplets.push((r, c, v));
  }

  pub fn set_zero<F>(&mut self, predicate: F)
  where
    F: Fn(usize, usize) -> bool,
  {
    self.triplets.retain(|&(r, c, _)| !predicate(r, c));
  }

  /// The value at `(r, c)`, summing all triplets at this position.
  pub fn get(&self, r: usize, c: usize) -> f64 {
    self
      .triplets
      .iter()
      .filter(|t| t.0 == r && t.1 == c)
      .map(|t| t.2)
      .sum()
  }

  pub fn to_nalgebra_coo(&self) -> nas::CooMatrix<f64> {
    let mut coo = nas::CooMatrix::new(self.nrows, self.ncols);
    for &(r, c, v) in &self.triplets {
      coo.push(r, c, v);
    }
    coo
  }

  pub fn to_nalgebra_csr(&self) -> nas::CsrMatrix<f64> {
    (&self.to_nalgebra_coo()).into()
  }

  pub fn to_nalgebra_csc(&self) -> nas::CscMatrix<f64> {
    (&self.to_nalgebra_coo()).into()
  }

  pub fn to_nalgebra_dense(&self) -> na::DMatrix<f64> {
    (&self.to_nalgebra_coo()).into()
  }

  pub fn to_faer_csc(&self) -> faer::sparse::SparseColMat<usize, f64> {
    nalgebra2faer(self.to_nalgebra_csc())
  }

  /// Equivalent matrix with one triplet per nonzero position, ordered by row
  /// and then by column.
  pub fn aggregated(&self) -> Self {
    let csr = self.to_nalgebra_csr();
    let triplets = csr
      .triplet_iter()
      .filter(|(_, _, &v)| v != 0.0)
      .map(|(r, c, &v)| (r, c, v))
      .collect();
    Self::new(self.nrows, self.ncols, triplets)
  }

  pub fn transpose(&self) -> Self {
    let triplets = self.triplets.iter().map(|&(r, c, v)| (c, r, v)).collect();
    Self::new(self.ncols, self.nrows, triplets)
  }

  /// The symmetric part $1/2 (A + A^T)$.
  pub fn symmetrized(&self) -> Self {
    assert!(self.is_square());
    let triplets = self
      .triplets
      .iter()
      .flat_map(|&(r, c, v)| [(r, c, 0.5 * v), (c, r, 0.5 * v)])
      .collect();
    Self::new(self.nrows, self.ncols, triplets).aggregated()
  }

  /// The largest absolute entry of $A - A^T$.
  pub fn max_asymmetry(&self) -> f64 {
    let mut entries: HashMap<(usize, usize), f64> = HashMap::new();
    for &(r, c, v) in &self.triplets {
      *entries.entry((r, c)).or_default() += v;
    }
    entries
      .iter()
      .map(|(&(r, c), &v)| (v - entries.get(&(c, r)).copied().unwrap_or(0.0)).abs())
      .fold(0.0, f64::max)
  }

  pub fn diagonal(&self) -> na::DVector<f64> {
    let mut diagonal = na::DVector::zeros(self.nrows.min(self.ncols));
    for &(r, c, v) in &self.triplets {
      if r == c {
        diagonal[r] += v;
      }
    }
    diagonal
  }

  pub fn mul_vec(&self, x: &na::DVector<f64>) -> na::DVector<f64> {
    assert_eq!(x.len(), self.ncols);
    let mut y = na::DVector::zeros(self.nrows);
    for &(r, c, v) in &self.triplets {
      y[r] += v * x[c];
    }
    y
  }
}

type SparseMatrixFaer = faer::sparse::SparseColMat<usize, f64>;

pub fn nalgebra2faer(m: nas::CscMatrix<f64>) -> SparseMatrixFaer {
  let nrows = m.nrows();
  let ncols = m.ncols();
  let (col_ptrs, row_indices, values) = m.disassemble();

  let symbolic =
    faer::sparse::SymbolicSparseColMat::new_checked(nrows, ncols, col_ptrs, None, row_indices);
  faer::sparse::SparseColMat::new(symbolic, values)
}

#[cfg(test)]
mod test {
  use super::*;

  use approx::assert_relative_eq;

  fn example() -> SparseMatrix {
    SparseMatrix::new(
      3,
      3,
      vec![
        (0, 0, 2.0),
        (0, 1, -1.0),
        (1, 0, -1.0),
        (0, 0, 1.0),
        (2, 2, 4.0),
        (1, 1, 3.0),
        (1, 2, 0.5),
      ],
    )
  }

  #[test]
  fn duplicates_are_summed() {
    let m = example();
    assert_eq!(m.get(0, 0), 3.0);
    let dense = m.to_nalgebra_dense();
    assert_eq!(dense[(0, 0)], 3.0);
    assert_eq!(dense[(1, 2)], 0.5);
    assert_eq!(dense[(2, 1)], 0.0);

    let aggregated = m.aggregated();
    assert_eq!(aggregated.ntriplets(), 6);
    assert_eq!(aggregated.triplets()[0], (0, 0, 3.0));
    assert_eq!(aggregated.to_nalgebra_dense(), dense);
  }

  #[test]
  fn symmetry() {
    let m = example();
    assert_eq!(m.max_asymmetry(), 0.5);
    let sym = m.symmetrized();
    assert_eq!(sym.max_asymmetry(), 0.0);
    let dense = m.to_nalgebra_dense();
    assert_relative_eq!(sym.to_nalgebra_dense(), 0.5 * (&dense + dense.transpose()));
    assert_eq!(m.transpose().to_nalgebra_dense(), dense.transpose());
  }

  #[test]
  fn set_zero_removes_entries() {
    let mut m = example();
    m.set_zero(|r, c| r == 1 || c == 1);
    let dense = m.to_nalgebra_dense();
    assert!(dense.row(1).iter().all(|&v| v == 0.0));
    assert!(dense.column(1).iter().all(|&v| v == 0.0));
    assert_eq!(dense[(0, 0)], 3.0);
  }

  #[test]
  fn mul_vec_and_diagonal() {
    let m = example();
    let x = na::DVector::from_vec(vec![1.0, 2.0, 3.0]);
    assert_eq!(m.mul_vec(&x), m.to_nalgebra_dense() * &x);
    assert_eq!(m.diagonal(), na::DVector::from_vec(vec![3.0, 3.0, 4.0]));
  }

  #[test]
  fn faer_conversion() {
    let m = example();
    let faer = m.to_faer_csc();
    assert_eq!(faer.nrows(), 3);
    assert_eq!(faer.row_indices().len(), 6);
  }

  #[test]
  #[should_panic]
  fn out_of_bounds_push() {
    SparseMatrix::zeros(2, 2).push(2, 0, 1.0);
  }
}
