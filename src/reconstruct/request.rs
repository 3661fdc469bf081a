//! The reconstruction request and its driver.

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::config::ReconstructConfig;
use super::context::ReconstructionContext;
use super::engine::ReconstructionSummary;
use crate::export::{export, ExportError, ExportFormat};
use crate::feature::{FeatureLoader, LoadError};
use crate::ids::PlateId;
use crate::rotation::{RotationError, RotationFileError};

/// Errors that abort a whole reconstruction request.
#[derive(Error, Debug)]
pub enum ReconstructError {
    #[error("Reconstruction time must be finite and >= 0, got {0}")]
    NegativeTime(f64),
    #[error(transparent)]
    RotationFile(#[from] RotationFileError),
    #[error("Invalid rotation model: {0}")]
    RotationModel(#[from] RotationError),
    #[error(transparent)]
    Load(#[from] LoadError),
    /// The reconstruction finished but writing it failed. `summary` holds
    /// the per-feature outcomes, with `export` unset.
    #[error("Failed to export {} reconstructed geometries: {source}", .summary.geometries)]
    Export {
        summary: Box<ReconstructionSummary>,
        #[source]
        source: ExportError,
    },
}

impl ReconstructError {
    /// The computed outcomes, when the request failed only at export.
    pub fn summary(&self) -> Option<&ReconstructionSummary> {
        match self {
            ReconstructError::Export { summary, .. } => Some(summary.as_ref()),
            _ => None,
        }
    }
}

/// Everything needed to reconstruct one set of files at one time.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconstructRequest {
    pub reconstructable_files: Vec<PathBuf>,
    pub rotation_files: Vec<PathBuf>,
    /// Reconstruction time in Ma, >= 0.
    pub time: f64,
    pub anchor_plate_id: PlateId,
    pub output_path: PathBuf,
    pub output_format: ExportFormat,
}

impl ReconstructRequest {
    /// Creates a request with no input files; the format follows the output
    /// extension.
    pub fn new(time: f64, anchor_plate_id: PlateId, output_path: impl Into<PathBuf>) -> Result<Self, ExportError> {
        let output_path = output_path.into();
        let output_format = ExportFormat::from_path(&output_path)?;
        Ok(Self {
            reconstructable_files: Vec::new(),
            rotation_files: Vec::new(),
            time,
            anchor_plate_id,
            output_path,
            output_format,
        })
    }

    pub fn with_features(mut self, path: impl AsRef<Path>) -> Self {
        self.reconstructable_files.push(path.as_ref().to_path_buf());
        self
    }

    pub fn with_rotations(mut self, path: impl AsRef<Path>) -> Self {
        self.rotation_files.push(path.as_ref().to_path_buf());
        self
    }

    pub fn with_format(mut self, format: ExportFormat) -> Self {
        self.output_format = format;
        self
    }
}

/// Loads the request's inputs, reconstructs every feature and writes the
/// results.
///
/// Per-feature failures are listed in the returned summary. Unreadable or
/// malformed inputs and a cyclic rotation hierarchy abort the request. An
/// export failure is returned as [`ReconstructError::Export`], which still
/// carries the summary of the computed reconstruction.
pub fn reconstruct(
    request: &ReconstructRequest,
    loader: &dyn FeatureLoader,
    config: &ReconstructConfig,
) -> Result<ReconstructionSummary, ReconstructError> {
    if !request.time.is_finite() || request.time < 0.0 {
        return Err(ReconstructError::NegativeTime(request.time));
    }

    let context = ReconstructionContext::load(
        &request.reconstructable_files,
        &request.rotation_files,
        loader,
        config.clone(),
    )?;
    let report = context.reconstruct(request.time, request.anchor_plate_id)?;
    let mut summary = report.summary();
    match export(report.geometries(), request.output_format, &request.output_path) {
        Ok(exported) => {
            summary.export = Some(exported);
            Ok(summary)
        }
        Err(source) => Err(ReconstructError::Export {
            summary: Box::new(summary),
            source,
        }),
    }
}
