//! Boundary-singularity refinement of sampled point clouds.
//!
//! Each boundary type warps uniformly sampled points of the unit cube such
//! that they concentrate near the singularity the type is named after.

use crate::geometry::Coord;

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Largest radius of a point of the unit cube, measured from the origin.
const RHO_MAX: f64 = 1.732_050_807_568_877_2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryType {
  /// No refinement.
  Smooth,
  /// Refinement towards the face $x = 0$.
  Edge,
  /// Refinement towards the face $z = 0$.
  Cusp,
  /// Refinement towards the vertex at the origin.
  Conical,
}

impl BoundaryType {
  pub const ALL: [Self; 4] = [Self::Smooth, Self::Edge, Self::Cusp, Self::Conical];

  pub fn name(self) -> &'static str {
    match self {
      Self::Smooth => "smooth",
      Self::Edge => "edge",
      Self::Cusp => "cusp",
      Self::Conical => "conical",
    }
  }

  /// Applies the refinement transform to a single point.
  ///
  /// The result may leave the unit cube for general inputs and must be clipped.
  pub fn warp(self, point: Coord) -> Coord {
    match self {
      Self::Smooth => point,
      Self::Edge => Coord::new(0.5 * point.x, point.y, point.z),
      Self::Cusp => Coord::new(point.x, point.y, point.z.powi(2)),
      Self::Conical => {
        let (rho, theta, phi) = to_spherical(&point);
        from_spherical(rho.powi(2) / RHO_MAX, theta, phi)
      }
    }
  }
}

impl fmt::Display for BoundaryType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.pad(self.name())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown boundary type `{0}`, expected one of smooth, edge, cusp, conical")]
pub struct ParseBoundaryTypeError(String);

impl FromStr for BoundaryType {
  type Err = ParseBoundaryTypeError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|b| b.name().eq_ignore_ascii_case(s.trim()))
      .ok_or_else(|| ParseBoundaryTypeError(s.to_string()))
  }
}

/// Clips every coordinate into $[0, 1]$.
pub fn clip_unit_cube(point: Coord) -> Coord {
  point.map(|x| x.clamp(0.0, 1.0))
}

/// Radius, polar angle and azimuth about the origin.
fn to_spherical(p: &Coord) -> (f64, f64, f64) {
  let rho = p.norm();
  if rho == 0.0 {
    return (0.0, 0.0, 0.0);
  }
  let theta = (p.z / rho).clamp(-1.0, 1.0).acos();
  let phi = p.y.atan2(p.x);
  (rho, theta, phi)
}

fn from_spherical(rho: f64, theta: f64, phi: f64) -> Coord {
  Coord::new(
    rho * theta.sin() * phi.cos(),
    rho * theta.sin() * phi.sin(),
    rho * theta.cos(),
  )
}
