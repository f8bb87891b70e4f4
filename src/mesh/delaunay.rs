//! Delaunay tetrahedralization of a point set through TetGen.
//!
//! TetGen uses exact predicates, so cospherical and coplanar inputs (like
//! the lattice points on the cube faces) are handled.

use super::{Tet, VertexIdx};
use crate::geometry::Coord;

use thiserror::Error;
use tracing::debug;
use tritet::Tetgen;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DelaunayError {
  #[error("{0} points are too few for a tetrahedralization")]
  TooFewPoints(usize),
  #[error("tetgen failed: {0}")]
  Tetgen(String),
  #[error("tetgen returned {nout} points for {nin} input points")]
  PointMismatch { nin: usize, nout: usize },
  #[error("tetgen returned cells with {0} points")]
  NonLinearCells(usize),
}

fn tetgen_error(err: &str) -> DelaunayError {
  DelaunayError::Tetgen(err.to_string())
}

/// Computes the Delaunay tetrahedralization of `points`.
///
/// The returned tetrahedra index into `points`, which must be pairwise
/// distinct.
pub fn tetrahedralize(points: &[Coord]) -> Result<Vec<Tet>, DelaunayError> {
  if points.len() < 4 {
    return Err(DelaunayError::TooFewPoints(points.len()));
  }

  let mut tetgen = Tetgen::new(points.len(), None, None, None).map_err(tetgen_error)?;
  for (ipoint, p) in points.iter().enumerate() {
    tetgen
      .set_point(ipoint, 0, p.x, p.y, p.z)
      .map_err(tetgen_error)?;
  }
  tetgen.generate_delaunay(false).map_err(tetgen_error)?;

  // Without steiner points the output nodes are the input points.
  if tetgen.out_npoint() != points.len() {
    return Err(DelaunayError::PointMismatch {
      nin: points.len(),
      nout: tetgen.out_npoint(),
    });
  }
  if tetgen.out_cell_npoint() != 4 {
    return Err(DelaunayError::NonLinearCells(tetgen.out_cell_npoint()));
  }

  let tets: Vec<Tet> = (0..tetgen.out_ncell())
    .map(|icell| [0, 1, 2, 3].map(|m| tetgen.out_cell_point(icell, m) as VertexIdx))
    .collect();
  debug!(
    "tetrahedralized {} points into {} tetrahedra",
    points.len(),
    tets.len()
  );
  Ok(tets)
}
