//! P1 (linear Lagrangian) finite element matrices on tetrahedra.

use crate::geometry::TetGeometry;

pub type ElMat = na::Matrix4<f64>;
pub type ElVec = na::Vector4<f64>;

pub trait ElMatProvider: Sync {
  fn eval(&self, geo: &TetGeometry) -> ElMat;
}
impl<F> ElMatProvider for F
where
  F: Fn(&TetGeometry) -> ElMat + Sync,
{
  fn eval(&self, geo: &TetGeometry) -> ElMat {
    self(geo)
  }
}

pub trait ElVecProvider: Sync {
  fn eval(&self, geo: &TetGeometry) -> ElVec;
}
impl<F> ElVecProvider for F
where
  F: Fn(&TetGeometry) -> ElVec + Sync,
{
  fn eval(&self, geo: &TetGeometry) -> ElVec {
    self(geo)
  }
}

/// Element matrix provider for the negative Laplacian.
///
/// $A = [(grad phi_j, grad phi_i)_(L^2(K))]_(i,j)$
pub struct LaplaceElmat;
impl ElMatProvider for LaplaceElmat {
  fn eval(&self, geo: &TetGeometry) -> ElMat {
    laplace_elmat(geo)
  }
}

/// Element vector provider for the diagonal of the lumped mass matrix,
/// obtained through the trapezoidal quadrature rule.
pub struct LumpedMassElvec;
impl ElVecProvider for LumpedMassElvec {
  fn eval(&self, geo: &TetGeometry) -> ElVec {
    ElVec::from_element(geo.vol() / 4.0)
  }
}

/// The constant gradients of the four barycentric coordinate functions,
/// one per column.
///
/// Returns `None` for degenerate tetrahedra.
pub fn shape_gradients(geo: &TetGeometry) -> Option<na::Matrix3x4<f64>> {
  let augmented = geo.augmented_matrix();
  if augmented.determinant().abs() / 6.0 <= 0.0 {
    return None;
  }
  // Column j of the inverse holds the coefficients of the affine function
  // which is one at vertex j and zero at the others.
  let inverse = augmented.try_inverse()?;
  Some(inverse.fixed_rows::<3>(1).into_owned())
}

/// P1 stiffness matrix $K_(i j) = |K| grad phi_i dot grad phi_j$.
///
/// Degenerate tetrahedra contribute nothing and give the zero matrix.
pub fn laplace_elmat(geo: &TetGeometry) -> ElMat {
  let vol = geo.augmented_matrix().determinant().abs() / 6.0;
  match shape_gradients(geo) {
    Some(grads) => vol * grads.transpose() * grads,
    None => ElMat::zeros(),
  }
}
