//! Euclidean geometry of tetrahedra in $RR^3$.

pub type Coord = na::Vector3<f64>;

/// Elements with an absolute volume below this are considered degenerate.
pub const MIN_TET_VOLUME: f64 = 1e-12;

/// The local face numbering: face `i` is opposite of vertex `i`.
pub const TET_FACES: [[usize; 3]; 4] = [[1, 2, 3], [0, 2, 3], [0, 1, 3], [0, 1, 2]];

/// A tetrahedron given by the coordinates of its four vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct TetGeometry {
  vertices: [Coord; 4],
}
impl TetGeometry {
  pub fn new(vertices: [Coord; 4]) -> Self {
    Self { vertices }
  }

  /// The reference tetrahedron spanned by the origin and the unit vectors.
  pub fn new_ref() -> Self {
    Self::new([
      Coord::zeros(),
      Coord::new(1.0, 0.0, 0.0),
      Coord::new(0.0, 1.0, 0.0),
      Coord::new(0.0, 0.0, 1.0),
    ])
  }

  pub fn vertices(&self) -> &[Coord; 4] {
    &self.vertices
  }
  pub fn vertex(&self, ivertex: usize) -> &Coord {
    &self.vertices[ivertex]
  }

  /// The spanning edge vectors $v_i - v_0$.
  pub fn spanning_vectors(&self) -> [Coord; 3] {
    let v0 = self.vertices[0];
    [
      self.vertices[1] - v0,
      self.vertices[2] - v0,
      self.vertices[3] - v0,
    ]
  }

  /// Signed volume through the scalar triple product
  /// $1/6 (e_1 times e_2) dot e_3$.
  pub fn signed_vol(&self) -> f64 {
    let [e1, e2, e3] = self.spanning_vectors();
    e1.cross(&e2).dot(&e3) / 6.0
  }

  /// The (unsigned) volume.
  pub fn vol(&self) -> f64 {
    self.signed_vol().abs()
  }

  pub fn is_degenerate(&self) -> bool {
    self.vol() <= MIN_TET_VOLUME
  }

  /// The augmented coordinate matrix, one row $[1, x, y, z]$ per vertex.
  pub fn augmented_matrix(&self) -> na::Matrix4<f64> {
    let mut mat = na::Matrix4::zeros();
    for (ivertex, v) in self.vertices.iter().enumerate() {
      mat[(ivertex, 0)] = 1.0;
      mat[(ivertex, 1)] = v.x;
      mat[(ivertex, 2)] = v.y;
      mat[(ivertex, 3)] = v.z;
    }
    mat
  }

  /// Area of the triangular face opposite of vertex `iface`.
  pub fn face_area(&self, iface: usize) -> f64 {
    let [a, b, c] = TET_FACES[iface].map(|i| self.vertices[i]);
    0.5 * (b - a).cross(&(c - a)).norm()
  }

  pub fn face_areas(&self) -> [f64; 4] {
    [0, 1, 2, 3].map(|iface| self.face_area(iface))
  }

  /// The largest distance between two vertices.
  pub fn diameter(&self) -> f64 {
    let mut diameter: f64 = 0.0;
    for i in 0..4 {
      for j in (i + 1)..4 {
        diameter = diameter.max((self.vertices[i] - self.vertices[j]).norm());
      }
    }
    diameter
  }
}
