//! Storage of rotation sequences keyed by moving plate.

use std::collections::{HashMap, HashSet};

use super::error::RotationError;
use super::sequence::{RotationSample, RotationSequence};
use crate::ids::PlateId;

/// All rotation sequences loaded for one request.
#[derive(Debug, Clone, Default)]
pub struct RotationStore {
    sequences: HashMap<PlateId, RotationSequence>,
    /// Every plate named as a fixed plate by some sample.
    fixed_plates: HashSet<PlateId>,
}

impl RotationStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from samples in any order.
    pub fn from_samples(samples: impl IntoIterator<Item = RotationSample>) -> Result<Self, RotationError> {
        let mut store = Self::new();
        for sample in samples {
            store.insert(sample)?;
        }
        Ok(store)
    }

    /// Adds a sample to the sequence of its moving plate.
    pub fn insert(&mut self, sample: RotationSample) -> Result<(), RotationError> {
        let (moving, fixed) = (sample.moving_plate, sample.fixed_plate);
        let result = self
            .sequences
            .entry(moving)
            .or_insert_with(|| RotationSequence::new(moving))
            .insert(sample);
        if result.is_err() && self.sequences.get(&moving).is_some_and(RotationSequence::is_empty) {
            self.sequences.remove(&moving);
        }
        result?;
        self.fixed_plates.insert(fixed);
        Ok(())
    }

    /// Returns the sequence of a moving plate.
    pub fn sequence(&self, plate: PlateId) -> Option<&RotationSequence> {
        self.sequences.get(&plate)
    }

    /// Iterates over all sequences in unspecified order.
    pub fn sequences(&self) -> impl Iterator<Item = &RotationSequence> {
        self.sequences.values()
    }

    /// True if `plate` moves or is referenced as a fixed plate.
    pub fn is_known(&self, plate: PlateId) -> bool {
        self.sequences.contains_key(&plate) || self.fixed_plates.contains(&plate)
    }

    /// True if `plate` appears only as a fixed plate, i.e. it roots a hierarchy.
    pub fn is_root(&self, plate: PlateId) -> bool {
        !self.sequences.contains_key(&plate) && self.fixed_plates.contains(&plate)
    }

    /// All plates that have a sequence, sorted by numeric id.
    pub fn moving_plates(&self) -> Vec<PlateId> {
        let mut plates: Vec<PlateId> = self.sequences.keys().copied().collect();
        plates.sort_by_key(|p| p.value());
        plates
    }

    /// All root plates, sorted by numeric id.
    pub fn root_plates(&self) -> Vec<PlateId> {
        let mut plates: Vec<PlateId> = self
            .fixed_plates
            .iter()
            .copied()
            .filter(|p| !self.sequences.contains_key(p))
            .collect();
        plates.sort_by_key(|p| p.value());
        plates
    }

    /// Distinct sample times across all sequences, ascending.
    pub fn sample_times(&self) -> Vec<f64> {
        let mut times: Vec<f64> = self
            .sequences
            .values()
            .flat_map(|s| s.samples().iter().map(|sample| sample.time))
            .collect();
        times.sort_by(f64::total_cmp);
        times.dedup();
        times
    }

    /// `(youngest, oldest)` time over all sequences.
    pub fn time_span(&self) -> Option<(f64, f64)> {
        self.sequences
            .values()
            .filter_map(RotationSequence::time_span)
            .reduce(|(a0, a1), (b0, b1)| (a0.min(b0), a1.max(b1)))
    }

    /// Number of moving plates.
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Total number of samples.
    pub fn sample_count(&self) -> usize {
        self.sequences.values().map(RotationSequence::len).sum()
    }
}
