use weyl::{
  evp::EigenConfig,
  mesh::{BoundaryType, MeshConfig},
  simulation::{self, BatchParams, SimulationParams},
};

use clap::Parser;
use std::{path::PathBuf, process::ExitCode};
use tracing_subscriber::EnvFilter;

/// Dirichlet laplacian eigenvalues of the unit cube on randomly refined
/// tetrahedral meshes.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Args {
  /// Number of randomly sampled mesh points.
  #[arg(long, default_value_t = 1000)]
  npoints: usize,
  /// Number of eigenvalues to compute.
  #[arg(long, default_value_t = 50)]
  neigen: usize,
  /// Boundary refinement, repeatable. Defaults to all four.
  #[arg(long = "boundary")]
  boundaries: Vec<BoundaryType>,
  #[arg(long, default_value_t = 42)]
  seed: u64,
  /// Points closer than this are merged.
  #[arg(long, default_value_t = 1e-3)]
  min_distance: f64,
  /// Lattice subdivisions per cube edge seeded on the faces.
  #[arg(long)]
  face_subdivisions: Option<usize>,
  #[arg(long, default_value_t = 1e-6)]
  tol: f64,
  #[arg(long, default_value_t = 5000)]
  max_iterations: usize,
  #[arg(long, default_value = "out")]
  out_dir: PathBuf,
}

impl Args {
  fn batch(&self) -> BatchParams {
    let base = SimulationParams {
      neigen: self.neigen,
      mesh: MeshConfig {
        npoints: self.npoints,
        seed: self.seed,
        min_distance: self.min_distance,
        face_subdivisions: self.face_subdivisions,
        ..Default::default()
      },
      eigen: EigenConfig {
        tol: self.tol,
        max_iterations: self.max_iterations,
        seed: self.seed,
        ..Default::default()
      },
    };
    let boundaries = if self.boundaries.is_empty() {
      BoundaryType::ALL.to_vec()
    } else {
      self.boundaries.clone()
    };
    BatchParams::for_boundaries(&base, &boundaries).with_out_dir(&self.out_dir)
  }
}

fn main() -> ExitCode {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let args = Args::parse();
  let report = simulation::run_batch(&args.batch());

  match report.save(&args.out_dir) {
    Ok(path) => tracing::info!("wrote {}", path.display()),
    Err(err) => tracing::error!("failed to write batch report: {err}"),
  }

  for entry in &report.runs {
    match &entry.outcome {
      simulation::RunOutcome::Completed(record) => println!(
        "{:>8} N={:<6} nodes={:<6} elements={:<7} lambda_1={:.4} time={:.2}s",
        entry.boundary,
        entry.npoints,
        record.nnodes,
        record.ncells,
        record.statistics.min,
        record.elapsed,
      ),
      simulation::RunOutcome::Failed { message, .. } => {
        println!("{:>8} N={:<6} FAILED: {message}", entry.boundary, entry.npoints)
      }
    }
  }

  if report.all_failed() {
    ExitCode::FAILURE
  } else {
    ExitCode::SUCCESS
  }
}
