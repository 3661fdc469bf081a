//! The loaded state of a reconstruction session.

use std::path::PathBuf;

use tracing::info;

use super::config::ReconstructConfig;
use super::engine::{ReconstructionReport, Reconstructor};
use super::request::ReconstructError;
use crate::feature::{FeatureCollection, FeatureLoader};
use crate::ids::PlateId;
use crate::rotation::{load_rotation_files, RotationModel, RotationStore};

/// A built rotation model together with the features to reconstruct.
///
/// The context is immutable once loaded and is handed by reference to the
/// driver and to registered utilities.
#[derive(Debug)]
pub struct ReconstructionContext {
    model: RotationModel,
    features: FeatureCollection,
    config: ReconstructConfig,
}

impl ReconstructionContext {
    /// Builds a context from an in-memory store and features.
    pub fn new(
        store: RotationStore,
        features: FeatureCollection,
        config: ReconstructConfig,
    ) -> Result<Self, ReconstructError> {
        let model = RotationModel::build(store, config.rotation.clone())?;
        Ok(Self {
            model,
            features,
            config,
        })
    }

    /// Reads rotation files and reconstructable files, in the order given.
    pub fn load(
        reconstructable_files: &[PathBuf],
        rotation_files: &[PathBuf],
        loader: &dyn FeatureLoader,
        config: ReconstructConfig,
    ) -> Result<Self, ReconstructError> {
        let (store, _) = load_rotation_files(rotation_files)?;
        let mut features = FeatureCollection::new();
        for path in reconstructable_files {
            features.extend(loader.load(path)?);
        }
        info!(
            "Loaded {} features from {} file(s)",
            features.len(),
            reconstructable_files.len()
        );
        Self::new(store, features, config)
    }

    pub fn model(&self) -> &RotationModel {
        &self.model
    }

    pub fn features(&self) -> &FeatureCollection {
        &self.features
    }

    pub fn config(&self) -> &ReconstructConfig {
        &self.config
    }

    pub fn reconstructor(&self) -> Reconstructor<'_> {
        Reconstructor::new(&self.model, &self.config)
    }

    /// Reconstructs all loaded features at `time` relative to `anchor`.
    pub fn reconstruct(&self, time: f64, anchor: PlateId) -> Result<ReconstructionReport<'_>, ReconstructError> {
        self.reconstructor().reconstruct(self.features.features(), time, anchor)
    }
}
