use crate::{
  fe::{ElMatProvider, ElVecProvider, LumpedMassElvec},
  mesh::{TetMesh, VertexIdx},
  sparse::{SparseMatrix, Triplet},
  util,
};

use itertools::iproduct;
use rayon::prelude::*;

pub type GalMat = SparseMatrix;
pub type GalVec = na::DVector<f64>;

/// Assembly algorithm for the Galerkin Matrix.
///
/// Contributions of different cells to the same entry are kept as separate
/// triplets and summed on conversion.
pub fn assemble_galmat(mesh: &TetMesh, elmat: impl ElMatProvider) -> GalMat {
  assemble_galmat_masked(mesh, elmat, None)
}

/// Assembly of the Galerkin Matrix with homogeneous dirichlet boundary
/// conditions on `dofs` built in.
///
/// Entries in the rows and columns of `dofs` are never scattered and the
/// unit diagonal is pushed afterwards. The result is equivalent to
/// [`assemble_galmat`] followed by [`enforce_homogeneous_dirichlet`].
pub fn assemble_galmat_dirichlet(
  mesh: &TetMesh,
  elmat: impl ElMatProvider,
  dofs: &[VertexIdx],
) -> GalMat {
  let dof_flags = util::indicies_to_flags(dofs, mesh.nnodes());
  let mut galmat = assemble_galmat_masked(mesh, elmat, Some(&dof_flags));
  push_unit_diagonal(&mut galmat, &dof_flags);
  galmat
}

fn assemble_galmat_masked(
  mesh: &TetMesh,
  elmat: impl ElMatProvider,
  masked: Option<&[bool]>,
) -> GalMat {
  let is_masked = |idof: usize| masked.map_or(false, |flags| flags[idof]);

  let triplets: Vec<Triplet> = mesh
    .cells()
    .par_iter()
    .flat_map_iter(|cell| {
      let elmat = elmat.eval(&mesh.coords().tet_geometry(cell));
      iproduct!(0..4, 0..4).filter_map(move |(ilocal, jlocal)| {
        let (iglobal, jglobal) = (cell[ilocal], cell[jlocal]);
        let val = elmat[(ilocal, jlocal)];
        (val != 0.0 && !is_masked(iglobal) && !is_masked(jglobal)).then_some((iglobal, jglobal, val))
      })
    })
    .collect();

  GalMat::new(mesh.nnodes(), mesh.nnodes(), triplets)
}

/// Assembly algorithm for the Galerkin Vector.
pub fn assemble_galvec(mesh: &TetMesh, elvec: impl ElVecProvider) -> GalVec {
  let entries: Vec<(usize, f64)> = mesh
    .cells()
    .par_iter()
    .flat_map_iter(|cell| {
      let elvec = elvec.eval(&mesh.coords().tet_geometry(cell));
      (0..4).map(move |ilocal| (cell[ilocal], elvec[ilocal]))
    })
    .collect();

  let mut galvec = GalVec::zeros(mesh.nnodes());
  for (irow, val) in entries {
    galvec[irow] += val;
  }
  galvec
}

/// The diagonal of the lumped P1 mass matrix.
pub fn assemble_lumped_mass(mesh: &TetMesh) -> GalVec {
  assemble_galvec(mesh, LumpedMassElvec)
}

/// Homogeneous dirichlet boundary conditions on `dofs`.
///
/// Row and column of every dof are zeroed and the diagonal entry set to one.
pub fn enforce_homogeneous_dirichlet(galmat: &mut GalMat, dofs: &[VertexIdx]) {
  let dof_flags = util::indicies_to_flags(dofs, galmat.nrows());
  galmat.set_zero(|i, j| dof_flags[i] || dof_flags[j]);
  push_unit_diagonal(galmat, &dof_flags);
}

fn push_unit_diagonal(galmat: &mut GalMat, dof_flags: &[bool]) {
  for idof in util::flags_to_indicies(dof_flags) {
    galmat.push(idof, idof, 1.0);
  }
}

/// Removes the mass of the pinned `dofs`.
pub fn pin_mass(mass: &mut GalVec, dofs: &[VertexIdx]) {
  for &idof in dofs {
    mass[idof] = 0.0;
  }
}
