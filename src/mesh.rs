//! Tetrahedral meshes of the unit cube $[0, 1]^3$.
//!
//! A mesh is generated from a randomly sampled point cloud, refined towards
//! a boundary singularity, cleared of near-duplicates and tetrahedralized.

pub mod boundary;
pub mod cartesian;
pub mod coordinates;
pub mod delaunay;
pub mod kdtree;
pub mod refine;

pub use refine::BoundaryType;

use crate::{
  geometry::{Coord, TetGeometry, MIN_TET_VOLUME},
  Dim, DIM,
};
use coordinates::MeshNodeCoords;
use delaunay::DelaunayError;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

pub type VertexIdx = usize;
pub type CellIdx = usize;
pub type Tet = [VertexIdx; 4];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeshError {
  #[error("mesh degeneracy: {npoints} points are too few for a tetrahedralization")]
  TooFewPoints { npoints: usize },
  #[error("mesh degeneracy: none of {ncandidates} tetrahedra has a volume above {min_vol:e}")]
  NoElements { ncandidates: usize, min_vol: f64 },
  #[error("mesh degeneracy: delaunay tetrahedralization failed: {0}")]
  Triangulation(#[from] DelaunayError),
  #[error("unsupported spatial dimension {0}, only 3 is supported")]
  UnsupportedDimension(Dim),
}

/// Parameters of the mesh generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshConfig {
  /// Number of randomly sampled points.
  pub npoints: usize,
  pub boundary: BoundaryType,
  pub dim: Dim,
  pub seed: u64,
  /// Points closer than this are considered duplicates.
  pub min_distance: f64,
  /// Subdivisions per cube edge of the lattice seeded on the cube faces.
  /// `None` derives it from `npoints`, `Some(0)` disables the lattice.
  pub face_subdivisions: Option<usize>,
}
impl Default for MeshConfig {
  fn default() -> Self {
    Self {
      npoints: 1000,
      boundary: BoundaryType::Smooth,
      dim: DIM,
      seed: 42,
      min_distance: 1e-3,
      face_subdivisions: None,
    }
  }
}
impl MeshConfig {
  pub fn new(npoints: usize, boundary: BoundaryType) -> Self {
    Self {
      npoints,
      boundary,
      ..Default::default()
    }
  }

  pub fn face_subdivisions(&self) -> usize {
    self
      .face_subdivisions
      .unwrap_or_else(|| ((self.npoints as f64).cbrt().round() as usize).max(2))
  }
}

/// A tetrahedral mesh in $RR^3$.
///
/// Every node is a vertex of at least one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct TetMesh {
  coords: MeshNodeCoords,
  cells: Vec<Tet>,
}

impl TetMesh {
  pub fn new(coords: MeshNodeCoords, cells: Vec<Tet>) -> Self {
    assert!(cells
      .iter()
      .flatten()
      .all(|&inode| inode < coords.nnodes()));
    Self { coords, cells }
  }

  /// Builds a mesh from candidate tetrahedra, discarding degenerate ones and
  /// the nodes no longer referenced afterwards.
  pub fn from_candidates(coords: MeshNodeCoords, candidates: Vec<Tet>) -> Result<Self, MeshError> {
    let ncandidates = candidates.len();
    let cells: Vec<Tet> = candidates
      .into_iter()
      .filter(|tet| !coords.tet_geometry(tet).is_degenerate())
      .collect();
    if cells.is_empty() {
      return Err(MeshError::NoElements {
        ncandidates,
        min_vol: MIN_TET_VOLUME,
      });
    }
    debug!(
      "discarded {} degenerate of {ncandidates} tetrahedra",
      ncandidates - cells.len()
    );

    let mut used = vec![false; coords.nnodes()];
    cells.iter().flatten().for_each(|&inode| used[inode] = true);
    let kept: Vec<VertexIdx> = crate::util::flags_to_indicies(&used);
    if kept.len() == coords.nnodes() {
      return Ok(Self::new(coords, cells));
    }

    warn!(
      "removing {} nodes not belonging to any tetrahedron",
      coords.nnodes() - kept.len()
    );
    let mut new_index = vec![usize::MAX; coords.nnodes()];
    for (inew, &iold) in kept.iter().enumerate() {
      new_index[iold] = inew;
    }
    let cells = cells
      .into_iter()
      .map(|tet| tet.map(|iold| new_index[iold]))
      .collect();
    Ok(Self::new(coords.restrict(&kept), cells))
  }

  pub fn coords(&self) -> &MeshNodeCoords {
    &self.coords
  }
  pub fn cells(&self) -> &[Tet] {
    &self.cells
  }
  pub fn nnodes(&self) -> usize {
    self.coords.nnodes()
  }
  pub fn ncells(&self) -> usize {
    self.cells.len()
  }

  pub fn tet_geometry(&self, icell: CellIdx) -> TetGeometry {
    self.coords.tet_geometry(&self.cells[icell])
  }
  pub fn tet_geometries(&self) -> impl Iterator<Item = TetGeometry> + '_ {
    self.cells.iter().map(|tet| self.coords.tet_geometry(tet))
  }

  pub fn total_volume(&self) -> f64 {
    self.tet_geometries().map(|geo| geo.vol()).sum()
  }

  /// The smallest cell volume.
  pub fn min_cell_volume(&self) -> f64 {
    self
      .tet_geometries()
      .map(|geo| geo.vol())
      .fold(f64::INFINITY, f64::min)
  }

  /// The mesh width $h$, which is the largest diameter of all cells.
  pub fn mesh_width(&self) -> f64 {
    self
      .tet_geometries()
      .map(|geo| geo.diameter())
      .fold(0.0, f64::max)
  }
}

/// Samples `config.npoints` points uniformly in the unit cube, warped by the
/// boundary refinement and clipped back into the cube.
pub fn sample_points(config: &MeshConfig) -> Vec<Coord> {
  let mut rng = Pcg64::seed_from_u64(config.seed);
  (0..config.npoints)
    .map(|_| Coord::new(rng.gen(), rng.gen(), rng.gen()))
    .map(|p| refine::clip_unit_cube(config.boundary.warp(p)))
    .collect()
}

/// Regular lattice points on the faces of the unit cube.
pub fn face_lattice(nsubdivisions: usize) -> Vec<Coord> {
  if nsubdivisions == 0 {
    return Vec::new();
  }
  let n = nsubdivisions;
  let t = |i: usize| i as f64 / n as f64;
  let is_face = |i: usize| i == 0 || i == n;

  let mut points = Vec::with_capacity((n + 1).pow(3) - (n - 1).pow(3));
  for k in 0..=n {
    for j in 0..=n {
      for i in 0..=n {
        if is_face(i) || is_face(j) || is_face(k) {
          points.push(Coord::new(t(i), t(j), t(k)));
        }
      }
    }
  }
  points
}

/// Generates a tetrahedral mesh of the unit cube.
pub fn generate_mesh(config: &MeshConfig) -> Result<TetMesh, MeshError> {
  if config.dim != DIM {
    return Err(MeshError::UnsupportedDimension(config.dim));
  }
  if config.npoints < DIM + 1 {
    return Err(MeshError::TooFewPoints {
      npoints: config.npoints,
    });
  }

  let mut points = face_lattice(config.face_subdivisions());
  let nlattice = points.len();
  points.extend(sample_points(config));
  let nsampled = points.len();

  let points = kdtree::remove_close_points(points, config.min_distance);
  debug!(
    "{nlattice} lattice points, {} sampled points, {} removed as duplicates",
    config.npoints,
    nsampled - points.len()
  );
  if points.len() < DIM + 1 {
    return Err(MeshError::TooFewPoints {
      npoints: points.len(),
    });
  }

  let candidates = delaunay::tetrahedralize(&points)?;
  let mesh = TetMesh::from_candidates(MeshNodeCoords::from_points(&points), candidates)?;
  info!(
    "generated {} mesh: {} nodes, {} elements",
    config.boundary,
    mesh.nnodes(),
    mesh.ncells()
  );
  debug!(
    "mesh width {:.3e}, smallest volume {:.3e}",
    mesh.mesh_width(),
    mesh.min_cell_volume()
  );
  Ok(mesh)
}
