use super::{Tet, VertexIdx};
use crate::geometry::{Coord, TetGeometry};

#[derive(Debug, Clone, PartialEq)]
pub struct MeshNodeCoords {
  /// The node coordinates in the columns of a matrix.
  matrix: na::Matrix3xX<f64>,
}
impl MeshNodeCoords {
  pub fn new(matrix: na::Matrix3xX<f64>) -> Self {
    Self { matrix }
  }
  pub fn from_points(points: &[Coord]) -> Self {
    if points.is_empty() {
      return Self::new(na::Matrix3xX::zeros(0));
    }
    Self::new(na::Matrix3xX::from_columns(points))
  }

  pub fn nnodes(&self) -> usize {
    self.matrix.ncols()
  }
  pub fn coord(&self, inode: VertexIdx) -> Coord {
    self.matrix.column(inode).into_owned()
  }
  pub fn matrix(&self) -> &na::Matrix3xX<f64> {
    &self.matrix
  }

  pub fn tet_geometry(&self, tet: &Tet) -> TetGeometry {
    TetGeometry::new(tet.map(|inode| self.coord(inode)))
  }

  pub fn eval_coord_fn<F>(&self, f: F) -> na::DVector<f64>
  where
    F: FnMut(na::VectorView3<f64>) -> f64,
  {
    na::DVector::from_iterator(self.nnodes(), self.matrix.column_iter().map(f))
  }

  /// Keeps only the given nodes, in the given order.
  pub fn restrict(&self, nodes: &[VertexIdx]) -> Self {
    Self::new(self.matrix.select_columns(nodes))
  }
}
