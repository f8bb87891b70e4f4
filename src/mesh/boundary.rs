use crate::geometry::Coord;

use super::{TetMesh, VertexIdx};

/// Distance to a cube face below which a node counts as boundary node.
pub const BOUNDARY_TOL: f64 = 1e-5;

/// Whether any coordinate is within `tol` of 0 or 1.
pub fn is_on_unit_cube_boundary(coord: &Coord, tol: f64) -> bool {
  coord.iter().any(|&x| x.abs() <= tol || (x - 1.0).abs() <= tol)
}

impl TetMesh {
  /// The nodes on the faces of the unit cube, ascending.
  pub fn boundary_nodes(&self) -> Vec<VertexIdx> {
    self.boundary_nodes_tol(BOUNDARY_TOL)
  }

  pub fn boundary_nodes_tol(&self, tol: f64) -> Vec<VertexIdx> {
    self
      .coords()
      .matrix()
      .column_iter()
      .enumerate()
      .filter(|(_, c)| is_on_unit_cube_boundary(&c.into_owned(), tol))
      .map(|(inode, _)| inode)
      .collect()
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn cube_boundary_classification() {
    assert!(is_on_unit_cube_boundary(&Coord::new(0.0, 0.5, 0.5), BOUNDARY_TOL));
    assert!(is_on_unit_cube_boundary(&Coord::new(0.3, 1.0 - 1e-6, 0.5), BOUNDARY_TOL));
    assert!(is_on_unit_cube_boundary(&Coord::new(0.3, 0.2, 5e-6), BOUNDARY_TOL));
    assert!(!is_on_unit_cube_boundary(&Coord::new(0.3, 0.2, 1e-3), BOUNDARY_TOL));
    assert!(!is_on_unit_cube_boundary(&Coord::new(0.5, 0.5, 0.5), BOUNDARY_TOL));
  }
}
