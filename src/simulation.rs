//! Simulation runs: mesh generation, assembly, eigensolve and statistics for
//! one boundary type, and batches of isolated runs.

use crate::{
  assemble,
  evp::{self, EigenConfig, EigenError},
  fe::LaplaceElmat,
  io::{self, IoError},
  mesh::{self, BoundaryType, MeshConfig, MeshError},
  stats::{self, SpectrumStatistics},
  Dim,
};

use serde::{Deserialize, Serialize};
use std::{
  fmt,
  path::{Path, PathBuf},
  time::Instant,
};
use thiserror::Error;
use tracing::{debug, error, info, info_span};

pub const BATCH_REPORT_FILE: &str = "batch_results.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParams {
  /// Number of wanted eigenvalues.
  pub neigen: usize,
  pub mesh: MeshConfig,
  pub eigen: EigenConfig,
}
impl Default for SimulationParams {
  fn default() -> Self {
    Self {
      neigen: 50,
      mesh: MeshConfig::default(),
      eigen: EigenConfig::default(),
    }
  }
}
impl SimulationParams {
  pub fn new(npoints: usize, boundary: BoundaryType, neigen: usize) -> Self {
    Self {
      neigen,
      mesh: MeshConfig::new(npoints, boundary),
      ..Default::default()
    }
  }

  pub fn npoints(&self) -> usize {
    self.mesh.npoints
  }
  pub fn boundary(&self) -> BoundaryType {
    self.mesh.boundary
  }
  pub fn dim(&self) -> Dim {
    self.mesh.dim
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
  Mesh,
  Assembly,
  Eigensolver,
  Statistics,
  Persistence,
}
impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::Mesh => "mesh",
      Self::Assembly => "assembly",
      Self::Eigensolver => "eigensolver",
      Self::Statistics => "statistics",
      Self::Persistence => "persistence",
    };
    f.pad(name)
  }
}

#[derive(Debug, Error)]
pub enum StageError {
  #[error(transparent)]
  Mesh(#[from] MeshError),
  #[error("mesh has no interior nodes")]
  NoInteriorNodes,
  #[error(transparent)]
  Eigen(#[from] EigenError),
  #[error("empty spectrum")]
  EmptySpectrum,
  #[error(transparent)]
  Io(#[from] IoError),
}

/// A fatal failure of a run, identifying the stage and the parameters.
#[derive(Debug, Error)]
#[error("{stage} stage failed for N = {npoints}, boundary type {boundary}: {source}")]
pub struct SimulationError {
  pub stage: Stage,
  pub npoints: usize,
  pub boundary: BoundaryType,
  pub source: StageError,
}
impl SimulationError {
  fn new(params: &SimulationParams, stage: Stage, source: impl Into<StageError>) -> Self {
    Self {
      stage,
      npoints: params.npoints(),
      boundary: params.boundary(),
      source: source.into(),
    }
  }
}

/// The result record of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
  pub boundary: BoundaryType,
  pub npoints: usize,
  pub dim: Dim,
  pub neigen: usize,
  pub nnodes: usize,
  pub ncells: usize,
  pub nboundary_nodes: usize,
  /// Wall-clock time of the run in seconds.
  pub elapsed: f64,
  pub statistics: SpectrumStatistics,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
  pub record: RunRecord,
  /// The computed eigenvalues, ascending.
  pub eigenvalues: na::DVector<f64>,
}

/// Runs the whole pipeline for one parameter set.
pub fn run_simulation(params: &SimulationParams) -> Result<SimulationResult, SimulationError> {
  let _span =
    info_span!("run", boundary = %params.boundary(), npoints = params.npoints()).entered();
  let start = Instant::now();

  let mesh = info_span!("mesh")
    .in_scope(|| mesh::generate_mesh(&params.mesh))
    .map_err(|err| SimulationError::new(params, Stage::Mesh, err))?;

  let boundary_nodes = mesh.boundary_nodes();
  if boundary_nodes.len() == mesh.nnodes() {
    return Err(SimulationError::new(
      params,
      Stage::Assembly,
      StageError::NoInteriorNodes,
    ));
  }
  let (galmat, mass) = info_span!("assembly").in_scope(|| {
    let galmat = assemble::assemble_galmat_dirichlet(&mesh, LaplaceElmat, &boundary_nodes);
    let mut mass = assemble::assemble_lumped_mass(&mesh);
    assemble::pin_mass(&mut mass, &boundary_nodes);
    info!(
      "assembled {} triplets, {} dofs pinned",
      galmat.ntriplets(),
      boundary_nodes.len()
    );
    (galmat, mass)
  });

  let eigenvalues = info_span!("eigensolver")
    .in_scope(|| evp::solve_smallest_eigenvalues(&galmat, &mass, params.neigen, &params.eigen))
    .map_err(|err| SimulationError::new(params, Stage::Eigensolver, err))?;

  let statistics = SpectrumStatistics::from_eigenvalues(eigenvalues.as_slice())
    .ok_or_else(|| SimulationError::new(params, Stage::Statistics, StageError::EmptySpectrum))?;

  let elapsed = start.elapsed().as_secs_f64();
  info!(
    "computed {} eigenvalues in {elapsed:.2}s, smallest {:.4}",
    eigenvalues.len(),
    statistics.min
  );
  debug!(
    "N({:.4}) = {}, weyl estimate {:.2}",
    statistics.max,
    statistics.count,
    stats::weyl_asymptotic_count(statistics.max, mesh.total_volume())
  );

  let record = RunRecord {
    boundary: params.boundary(),
    npoints: params.npoints(),
    dim: params.dim(),
    neigen: params.neigen,
    nnodes: mesh.nnodes(),
    ncells: mesh.ncells(),
    nboundary_nodes: boundary_nodes.len(),
    elapsed,
    statistics,
  };
  Ok(SimulationResult {
    record,
    eigenvalues,
  })
}

pub fn run_file_name(boundary: BoundaryType, npoints: usize) -> String {
  format!("result_{boundary}_{npoints}.json")
}

/// Persists the eigenvalues, the counting function and the record of a
/// completed run into `dir`.
pub fn persist_run(result: &SimulationResult, dir: impl AsRef<Path>) -> Result<(), IoError> {
  let dir = dir.as_ref();
  let (boundary, npoints) = (result.record.boundary, result.record.npoints);
  std::fs::create_dir_all(dir)?;

  io::write_eigenvalues(&result.eigenvalues, dir, boundary, npoints)?;
  let steps = stats::counting_function(result.eigenvalues.as_slice());
  io::save_counting_function(&steps, dir, boundary, npoints)?;
  io::write_json(&result.record, dir.join(run_file_name(boundary, npoints)))?;
  Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchParams {
  pub runs: Vec<SimulationParams>,
  /// Output directory, nothing is persisted if `None`.
  pub out_dir: Option<PathBuf>,
}
impl BatchParams {
  /// One run per boundary type, otherwise sharing `base`.
  pub fn for_boundaries(base: &SimulationParams, boundaries: &[BoundaryType]) -> Self {
    let runs = boundaries
      .iter()
      .map(|&boundary| {
        let mut params = base.clone();
        params.mesh.boundary = boundary;
        params
      })
      .collect();
    Self {
      runs,
      out_dir: None,
    }
  }

  pub fn with_out_dir(mut self, out_dir: impl Into<PathBuf>) -> Self {
    self.out_dir = Some(out_dir.into());
    self
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RunOutcome {
  Completed(RunRecord),
  Failed { stage: Stage, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
  pub boundary: BoundaryType,
  pub npoints: usize,
  pub outcome: RunOutcome,
}

/// The combined record of a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
  pub runs: Vec<BatchEntry>,
}
impl BatchReport {
  pub fn ncompleted(&self) -> usize {
    self
      .runs
      .iter()
      .filter(|entry| matches!(entry.outcome, RunOutcome::Completed(_)))
      .count()
  }
  pub fn nfailed(&self) -> usize {
    self.runs.len() - self.ncompleted()
  }
  pub fn all_failed(&self) -> bool {
    !self.runs.is_empty() && self.ncompleted() == 0
  }

  pub fn save(&self, dir: impl AsRef<Path>) -> Result<PathBuf, IoError> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;
    let path = dir.join(BATCH_REPORT_FILE);
    io::write_json(self, &path)?;
    Ok(path)
  }
}

/// Runs every parameter set in sequence.
///
/// A failing run is recorded and does not affect the others. Files of a run
/// are only written once it completed.
pub fn run_batch(batch: &BatchParams) -> BatchReport {
  let mut report = BatchReport::default();
  for params in &batch.runs {
    let outcome = run_simulation(params).and_then(|result| {
      if let Some(dir) = &batch.out_dir {
        persist_run(&result, dir)
          .map_err(|err| SimulationError::new(params, Stage::Persistence, err))?;
      }
      Ok(result.record)
    });

    let outcome = match outcome {
      Ok(record) => RunOutcome::Completed(record),
      Err(err) => {
        error!("{err}");
        RunOutcome::Failed {
          stage: err.stage,
          message: err.to_string(),
        }
      }
    };
    report.runs.push(BatchEntry {
      boundary: params.boundary(),
      npoints: params.npoints(),
      outcome,
    });
  }
  info!(
    "batch finished: {} completed, {} failed",
    report.ncompleted(),
    report.nfailed()
  );
  report
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn stage_error_message_names_parameters() {
    let params = SimulationParams::new(3, BoundaryType::Edge, 5);
    let err = run_simulation(&params).unwrap_err();
    assert_eq!(err.stage, Stage::Mesh);
    assert!(matches!(
      err.source,
      StageError::Mesh(MeshError::TooFewPoints { npoints: 3 })
    ));
    let message = err.to_string();
    assert!(message.contains("mesh stage"));
    assert!(message.contains("N = 3"));
    assert!(message.contains("edge"));
  }

  #[test]
  fn invalid_eigen_request_fails_in_eigensolver() {
    let params = SimulationParams::new(100, BoundaryType::Smooth, 0);
    let err = run_simulation(&params).unwrap_err();
    assert_eq!(err.stage, Stage::Eigensolver);
  }

  #[test]
  fn record_keeps_requested_neigen() {
    // more eigenvalues than interior dofs
    let params = SimulationParams::new(100, BoundaryType::Smooth, 500);
    let result = run_simulation(&params).unwrap();
    assert_eq!(result.record.neigen, 500);
    assert!(result.eigenvalues.len() < 500);
    assert_eq!(result.record.statistics.count, result.eigenvalues.len());
  }

  #[test]
  fn batch_for_boundaries() {
    let base = SimulationParams::new(100, BoundaryType::Smooth, 3);
    let batch = BatchParams::for_boundaries(&base, &BoundaryType::ALL);
    assert_eq!(batch.runs.len(), 4);
    assert_eq!(batch.runs[3].boundary(), BoundaryType::Conical);
    assert!(batch.runs.iter().all(|params| params.npoints() == 100));
    assert!(batch.out_dir.is_none());
  }

  #[test]
  fn outcome_serialization() {
    let failed = RunOutcome::Failed {
      stage: Stage::Eigensolver,
      message: "did not converge".into(),
    };
    let json = serde_json::to_value(&failed).unwrap();
    assert_eq!(json["status"], "failed");
    assert_eq!(json["stage"], "eigensolver");
  }

  #[test]
  fn report_counts() {
    let entry = |outcome| BatchEntry {
      boundary: BoundaryType::Cusp,
      npoints: 10,
      outcome,
    };
    let failed = || RunOutcome::Failed {
      stage: Stage::Mesh,
      message: String::new(),
    };
    let report = BatchReport {
      runs: vec![entry(failed()), entry(failed())],
    };
    assert_eq!(report.nfailed(), 2);
    assert!(report.all_failed());
    assert!(!BatchReport::default().all_failed());
  }
}
