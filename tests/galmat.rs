use weyl::{
  assemble::{self, GalVec},
  fe::LaplaceElmat,
  linalg::assert_mat_eq,
  mesh::{self, BoundaryType, MeshConfig},
};

use approx::assert_relative_eq;

fn generated_mesh(boundary: BoundaryType) -> mesh::TetMesh {
  mesh::generate_mesh(&MeshConfig::new(200, boundary)).unwrap()
}

#[test]
fn assembled_stiffness_is_symmetric() {
  for boundary in BoundaryType::ALL {
    let mesh = generated_mesh(boundary);
    let galmat = assemble::assemble_galmat(&mesh, LaplaceElmat);
    assert_eq!(galmat.nrows(), mesh.nnodes());
    assert!(galmat.aggregated().max_asymmetry() < 1e-12);
    assert!(galmat.symmetrized().max_asymmetry() < 1e-12);

    let ones = GalVec::from_element(mesh.nnodes(), 1.0);
    assert!(galmat.mul_vec(&ones).amax() < 1e-10);
  }
}

#[test]
fn stiffness_energy_of_linear_function() {
  // the gradient of x + 2y - z has squared norm 6 everywhere
  let mesh = generated_mesh(BoundaryType::Smooth);
  let galmat = assemble::assemble_galmat(&mesh, LaplaceElmat);
  let u = mesh.coords().eval_coord_fn(|p| p[0] + 2.0 * p[1] - p[2]);
  let energy = u.dot(&galmat.mul_vec(&u));
  assert_relative_eq!(energy, 6.0 * mesh.total_volume(), epsilon = 1e-9);
}

#[test]
fn boundary_dofs_are_pinned() {
  let mesh = generated_mesh(BoundaryType::Cusp);
  let boundary_nodes = mesh.boundary_nodes();
  assert!(!boundary_nodes.is_empty());

  let galmat =
    assemble::assemble_galmat_dirichlet(&mesh, LaplaceElmat, &boundary_nodes).to_nalgebra_dense();
  for &idof in &boundary_nodes {
    for jdof in 0..mesh.nnodes() {
      let expected = if idof == jdof { 1.0 } else { 0.0 };
      assert_eq!(galmat[(idof, jdof)], expected);
      assert_eq!(galmat[(jdof, idof)], expected);
    }
  }

  let mut enforced = assemble::assemble_galmat(&mesh, LaplaceElmat);
  assemble::enforce_homogeneous_dirichlet(&mut enforced, &boundary_nodes);
  assert_mat_eq(&galmat, &enforced.to_nalgebra_dense(), 1e-14);
}

#[test]
fn lumped_mass_partitions_volume() {
  let mesh = generated_mesh(BoundaryType::Conical);
  let mut mass = assemble::assemble_lumped_mass(&mesh);
  assert_relative_eq!(mass.sum(), mesh.total_volume(), epsilon = 1e-12);
  assert!(mass.iter().all(|&m| m > 0.0));

  let boundary_nodes = mesh.boundary_nodes();
  assemble::pin_mass(&mut mass, &boundary_nodes);
  assert_eq!(
    mass.iter().filter(|&&m| m > 0.0).count(),
    mesh.nnodes() - boundary_nodes.len()
  );
}
