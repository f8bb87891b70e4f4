//! Persistence of computed spectra.
//!
//! Eigenvalue arrays are stored in the PETSc binary vector layout (big
//! endian class id, length and values).

use crate::mesh::BoundaryType;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use serde::Serialize;
use std::{
  fs::File,
  io::{BufReader, BufWriter, Read, Write},
  path::{Path, PathBuf},
};
use thiserror::Error;

const PETSC_VEC_FILE_CLASSID: i32 = 1211214;

#[derive(Debug, Error)]
pub enum IoError {
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
  #[error("serialization error: {0}")]
  Json(#[from] serde_json::Error),
  #[error("not a PETSc vector file: class id {0}")]
  InvalidClassId(i32),
  #[error("invalid PETSc vector length {0}")]
  InvalidLength(i64),
}

pub fn eigenvalues_file_name(boundary: BoundaryType, npoints: usize) -> String {
  format!("eigenvalues_{boundary}_{npoints}.bin")
}

pub fn counting_file_name(boundary: BoundaryType, npoints: usize) -> String {
  format!("counting_{boundary}_{npoints}.txt")
}

pub fn write_petsc_vector<W: Write>(
  mut writer: W,
  vector: &na::DVector<f64>,
) -> Result<(), IoError> {
  let nrows =
    i32::try_from(vector.nrows()).map_err(|_| IoError::InvalidLength(vector.nrows() as i64))?;
  writer.write_i32::<BigEndian>(PETSC_VEC_FILE_CLASSID)?;
  writer.write_i32::<BigEndian>(nrows)?;
  for &value in vector {
    writer.write_f64::<BigEndian>(value)?;
  }
  writer.flush()?;
  Ok(())
}

pub fn read_petsc_vector<R: Read>(mut reader: R) -> Result<na::DVector<f64>, IoError> {
  let classid = reader.read_i32::<BigEndian>()?;
  if classid != PETSC_VEC_FILE_CLASSID {
    return Err(IoError::InvalidClassId(classid));
  }
  let nrows = reader.read_i32::<BigEndian>()?;
  let nrows = usize::try_from(nrows).map_err(|_| IoError::InvalidLength(nrows.into()))?;

  let mut vector = na::DVector::zeros(nrows);
  for value in vector.iter_mut() {
    *value = reader.read_f64::<BigEndian>()?;
  }
  Ok(vector)
}

/// Writes the eigenvalues of a run into `dir` and returns the file path.
pub fn write_eigenvalues(
  eigenvalues: &na::DVector<f64>,
  dir: impl AsRef<Path>,
  boundary: BoundaryType,
  npoints: usize,
) -> Result<PathBuf, IoError> {
  let path = dir.as_ref().join(eigenvalues_file_name(boundary, npoints));
  let writer = BufWriter::new(File::create(&path)?);
  write_petsc_vector(writer, eigenvalues)?;
  Ok(path)
}

pub fn read_eigenvalues(path: impl AsRef<Path>) -> Result<na::DVector<f64>, IoError> {
  let reader = BufReader::new(File::open(path)?);
  read_petsc_vector(reader)
}

/// Writes the step points of $N(lambda)$, one `lambda count` pair per line.
pub fn write_counting_function<W: Write>(
  mut writer: W,
  steps: &[(f64, usize)],
) -> Result<(), IoError> {
  writeln!(writer, "# lambda N(lambda)")?;
  for &(lambda, count) in steps {
    writeln!(writer, "{lambda:.12e} {count}")?;
  }
  writer.flush()?;
  Ok(())
}

pub fn save_counting_function(
  steps: &[(f64, usize)],
  dir: impl AsRef<Path>,
  boundary: BoundaryType,
  npoints: usize,
) -> Result<PathBuf, IoError> {
  let path = dir.as_ref().join(counting_file_name(boundary, npoints));
  write_counting_function(BufWriter::new(File::create(&path)?), steps)?;
  Ok(path)
}

/// Pretty printed JSON.
pub fn write_json(value: &impl Serialize, path: impl AsRef<Path>) -> Result<(), IoError> {
  let mut writer = BufWriter::new(File::create(path)?);
  serde_json::to_writer_pretty(&mut writer, value)?;
  writeln!(writer)?;
  writer.flush()?;
  Ok(())
}
