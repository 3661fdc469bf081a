//! The rotation model: interpolated per-plate rotations and composed
//! plate-circuit rotations.

use std::collections::HashMap;

use tracing::{debug, info};

use super::cache::{RotationCache, RotationKey};
use super::circuit::PlateCircuit;
use super::config::RotationConfig;
use super::error::RotationError;
use super::sequence::{RotationSample, SequenceLookup};
use super::store::RotationStore;
use crate::geometry::FiniteRotation;
use crate::ids::PlateId;

/// The rotation of one plate relative to its fixed plate at a given time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeRotation {
    pub moving_plate: PlateId,
    pub fixed_plate: PlateId,
    pub rotation: FiniteRotation,
}

/// Raw single-edge lookup before re-parented intervals are resolved.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Edge<'a> {
    /// The plate has no sequence: it roots the hierarchy.
    Root,
    /// Rotation relative to a single fixed plate.
    Direct(EdgeRotation),
    /// The bracketing samples name different fixed plates. `near` decides the
    /// fixed plate; `far` must be re-expressed relative to it before slerping
    /// with weight `weight`.
    Reparented {
        near: &'a RotationSample,
        far: &'a RotationSample,
        weight: f64,
    },
}

/// Immutable rotation model built from a [`RotationStore`].
///
/// The model is `Send + Sync` and may be shared by reference across worker
/// threads for the duration of a request.
#[derive(Debug)]
pub struct RotationModel {
    store: RotationStore,
    config: RotationConfig,
    cache: Option<RotationCache>,
}

impl RotationModel {
    /// Builds a model, validating the hierarchy if configured.
    ///
    /// # Errors
    /// Returns `CyclicPlateCircuit` when, at any sample time, following
    /// fixed-plate references from some plate leads back to a plate already
    /// visited.
    pub fn build(store: RotationStore, config: RotationConfig) -> Result<Self, RotationError> {
        let cache = config.cache_rotations.then(RotationCache::new);
        let model = Self { store, config, cache };
        if model.config.validate_hierarchy {
            model.validate_hierarchy()?;
        }
        info!(
            "Rotation model ready: {} moving plates, {} samples",
            model.store.len(),
            model.store.sample_count()
        );
        Ok(model)
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &RotationStore {
        &self.store
    }

    /// Returns the model configuration.
    pub fn config(&self) -> &RotationConfig {
        &self.config
    }

    /// Number of cached composed rotations (0 when caching is disabled).
    pub fn cached_rotations(&self) -> usize {
        self.cache.as_ref().map_or(0, RotationCache::len)
    }

    /// Drops all cached composed rotations.
    ///
    /// Long-running callers that step through many times call this between
    /// steps to keep the cache bounded.
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    /// Rotation of `moving` relative to `anchor` at `time` Ma.
    ///
    /// # Errors
    /// Any [`RotationError`] raised while resolving the plate circuit.
    pub fn rotation(&self, moving: PlateId, time: f64, anchor: PlateId) -> Result<FiniteRotation, RotationError> {
        if !time.is_finite() || time < 0.0 {
            return Err(RotationError::InvalidTime { time });
        }
        if moving == anchor {
            return Ok(FiniteRotation::IDENTITY);
        }

        let compute = || PlateCircuit::new(self).composed_rotation(moving, time, anchor);
        match &self.cache {
            Some(cache) => cache.get_or_compute(RotationKey::new(moving, time, anchor), compute),
            None => compute(),
        }
    }

    /// Rotation of `moving` relative to its own fixed plate at `time`.
    ///
    /// Returns `Ok(None)` for root plates, which have no sequence.
    pub fn edge(&self, moving: PlateId, time: f64) -> Result<Option<EdgeRotation>, RotationError> {
        if !time.is_finite() || time < 0.0 {
            return Err(RotationError::InvalidTime { time });
        }
        PlateCircuit::new(self).edge(moving, time)
    }

    /// Looks up the edge leaving `plate` at `time` without resolving re-parenting.
    pub(crate) fn lookup_edge(&self, plate: PlateId, time: f64) -> Result<Edge<'_>, RotationError> {
        let Some(sequence) = self.store.sequence(plate) else {
            return if self.store.is_known(plate) {
                Ok(Edge::Root)
            } else {
                Err(RotationError::MissingRotationSequence { plate })
            };
        };

        let edge = match sequence.lookup(time, self.config.time_range_policy)? {
            SequenceLookup::Exact(s) | SequenceLookup::Clamped(s) => Edge::Direct(EdgeRotation {
                moving_plate: plate,
                fixed_plate: s.fixed_plate,
                rotation: s.rotation,
            }),
            SequenceLookup::Between {
                younger,
                older,
                fraction,
            } if younger.fixed_plate == older.fixed_plate => Edge::Direct(EdgeRotation {
                moving_plate: plate,
                fixed_plate: younger.fixed_plate,
                rotation: younger.rotation.slerp(&older.rotation, fraction),
            }),
            SequenceLookup::Between {
                younger,
                older,
                fraction,
            } => {
                if fraction <= 0.5 {
                    Edge::Reparented {
                        near: younger,
                        far: older,
                        weight: fraction,
                    }
                } else {
                    Edge::Reparented {
                        near: older,
                        far: younger,
                        weight: 1.0 - fraction,
                    }
                }
            }
        };
        Ok(edge)
    }

    /// Checks every sample time for cycles in the fixed-plate hierarchy.
    fn validate_hierarchy(&self) -> Result<(), RotationError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            InProgress,
            Done,
        }

        let policy = self.config.time_range_policy;
        let times = self.store.sample_times();
        for &time in &times {
            let mut marks: HashMap<PlateId, Mark> = HashMap::new();
            for sequence in self.store.sequences() {
                let mut path = Vec::new();
                let mut current = sequence.moving_plate();
                loop {
                    match marks.get(&current) {
                        Some(Mark::Done) => break,
                        Some(Mark::InProgress) => {
                            return Err(RotationError::CyclicPlateCircuit { plate: current, time });
                        }
                        None => {}
                    }
                    marks.insert(current, Mark::InProgress);
                    path.push(current);
                    match self
                        .store
                        .sequence(current)
                        .and_then(|s| s.fixed_plate_at(time, policy))
                    {
                        Some(next) => current = next,
                        None => break,
                    }
                }
                for plate in path {
                    marks.insert(plate, Mark::Done);
                }
            }
        }
        debug!("Validated rotation hierarchy at {} sample times", times.len());
        Ok(())
    }
}
