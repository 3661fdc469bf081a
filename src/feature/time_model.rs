//! Effective plate id and validity of a feature at a reconstruction time.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::collection::Feature;
use crate::ids::{FeatureId, PlateId};

/// What to do with a feature that has no reconstruction plate id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPlateIdPolicy {
    /// Reconstruct the feature on the given plate.
    UseDefault(PlateId),
    /// Fail the feature with `MissingReconstructionPlateId`.
    Reject,
}

impl Default for MissingPlateIdPolicy {
    fn default() -> Self {
        MissingPlateIdPolicy::UseDefault(PlateId::GLOBAL_REFERENCE)
    }
}

/// Errors raised while reading a feature's reconstruction properties.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeatureError {
    #[error("Feature {feature} has no reconstruction plate id")]
    MissingReconstructionPlateId { feature: FeatureId },
    #[error("Feature {feature} has a reconstruction plate id that is not a plate id: {found}")]
    InvalidReconstructionPlateId { feature: FeatureId, found: String },
}

/// Resolves which plate a feature rides on and whether it exists at a time.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureTimeModel {
    missing_plate_id: MissingPlateIdPolicy,
}

impl FeatureTimeModel {
    pub fn new(missing_plate_id: MissingPlateIdPolicy) -> Self {
        Self { missing_plate_id }
    }

    /// True if `time` lies in the feature's valid-time window.
    ///
    /// A feature without a window is valid at all times.
    pub fn is_valid_at(&self, feature: &Feature, time: f64) -> bool {
        feature.valid_time().map_or(true, |period| period.contains(time))
    }

    /// Returns the plate to reconstruct `feature` on and whether it is valid
    /// at `time`.
    ///
    /// Validity is decided first: a feature outside its window is reported
    /// as invalid even when its plate id is missing under
    /// [`MissingPlateIdPolicy::Reject`] or cannot be read. A valid feature
    /// whose plate id property is neither a plate id nor a non-negative
    /// integer fails with `InvalidReconstructionPlateId`.
    pub fn effective_plate_and_validity(
        &self,
        feature: &Feature,
        time: f64,
    ) -> Result<(PlateId, bool), FeatureError> {
        let valid = self.is_valid_at(feature, time);
        let plate = match feature.reconstruction_plate_id_value() {
            Some(value) => match value.as_plate_id() {
                Some(plate) => plate,
                None if !valid => PlateId::GLOBAL_REFERENCE,
                None => {
                    return Err(FeatureError::InvalidReconstructionPlateId {
                        feature: feature.id().clone(),
                        found: format!("{:?}", value),
                    });
                }
            },
            None => match self.missing_plate_id {
                MissingPlateIdPolicy::UseDefault(plate) => plate,
                MissingPlateIdPolicy::Reject if !valid => PlateId::GLOBAL_REFERENCE,
                MissingPlateIdPolicy::Reject => {
                    return Err(FeatureError::MissingReconstructionPlateId {
                        feature: feature.id().clone(),
                    });
                }
            },
        };
        Ok((plate, valid))
    }
}
