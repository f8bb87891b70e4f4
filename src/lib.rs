extern crate nalgebra as na;
extern crate nalgebra_sparse as nas;

pub mod assemble;
pub mod evp;
pub mod fe;
pub mod geometry;
pub mod io;
pub mod lanczos;
pub mod linalg;
pub mod mesh;
pub mod simulation;
pub mod sparse;
pub mod stats;
pub mod util;

pub type Dim = usize;

/// The only spatial dimension the pipeline supports.
pub const DIM: Dim = 3;
