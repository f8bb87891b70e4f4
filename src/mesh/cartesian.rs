//! Structured tetrahedral meshes of the unit cube.

use super::{coordinates::MeshNodeCoords, Tet, TetMesh, VertexIdx};
use crate::geometry::Coord;

/// Kuhn subdivision of a box into six tetrahedra sharing the main diagonal.
///
/// Local box vertex `i + 2 (j + 2 k)` sits at offset $(i, j, k)$.
const KUHN_TETS: [[usize; 4]; 6] = [
  [0, 1, 3, 7],
  [0, 1, 5, 7],
  [0, 2, 3, 7],
  [0, 2, 6, 7],
  [0, 4, 5, 7],
  [0, 4, 6, 7],
];

/// converts cartesian index to linear index, with x running fastest
pub fn cartesian_index2linear_index(idx: [usize; 3], dim_len: usize) -> usize {
  idx[0] + dim_len * (idx[1] + dim_len * idx[2])
}

/// converts linear index to cartesian index, with x running fastest
pub fn linear_index2cartesian_index(mut lin_idx: usize, dim_len: usize) -> [usize; 3] {
  let mut idx = [0; 3];
  for comp in &mut idx {
    *comp = lin_idx % dim_len;
    lin_idx /= dim_len;
  }
  idx
}

impl TetMesh {
  /// Uniform mesh of the unit cube with `nboxes_per_dim` boxes along each axis,
  /// each box split into six tetrahedra.
  pub fn new_unit_cube(nboxes_per_dim: usize) -> Self {
    assert!(nboxes_per_dim > 0);
    let nnodes_per_dim = nboxes_per_dim + 1;
    let h = (nboxes_per_dim as f64).recip();

    let points: Vec<Coord> = (0..nnodes_per_dim.pow(3))
      .map(|inode| {
        let [x, y, z] = linear_index2cartesian_index(inode, nnodes_per_dim);
        Coord::new(h * x as f64, h * y as f64, h * z as f64)
      })
      .collect();

    let mut cells: Vec<Tet> = Vec::with_capacity(6 * nboxes_per_dim.pow(3));
    for ibox in 0..nboxes_per_dim.pow(3) {
      let [xbox, ybox, zbox] = linear_index2cartesian_index(ibox, nboxes_per_dim);
      let mut box_nodes: [VertexIdx; 8] = [0; 8];
      for (ilocal, node) in box_nodes.iter_mut().enumerate() {
        let offset = linear_index2cartesian_index(ilocal, 2);
        *node = cartesian_index2linear_index(
          [xbox + offset[0], ybox + offset[1], zbox + offset[2]],
          nnodes_per_dim,
        );
      }
      cells.extend(KUHN_TETS.iter().map(|tet| tet.map(|i| box_nodes[i])));
    }

    Self::new(MeshNodeCoords::from_points(&points), cells)
  }
}

#[cfg(test)]
mod test {
  use super::*;

  use approx::assert_relative_eq;

  #[test]
  fn index_conversion() {
    for lin in 0..64 {
      let cart = linear_index2cartesian_index(lin, 4);
      assert_eq!(cartesian_index2linear_index(cart, 4), lin);
    }
    assert_eq!(linear_index2cartesian_index(5, 2), [1, 0, 1]);
  }

  #[test]
  fn unit_cube_mesh() {
    for n in 1..=4 {
      let mesh = TetMesh::new_unit_cube(n);
      assert_eq!(mesh.nnodes(), (n + 1).pow(3));
      assert_eq!(mesh.ncells(), 6 * n.pow(3));
      assert_relative_eq!(mesh.total_volume(), 1.0, epsilon = 1e-12);
      let expected_boundary = (n + 1).pow(3) - (n - 1).pow(3);
      assert_eq!(mesh.boundary_nodes().len(), expected_boundary);
    }
  }
}
