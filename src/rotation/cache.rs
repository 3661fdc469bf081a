//! Concurrent read-through cache of composed rotations.
//!
//! A model is immutable once built, so a value computed for a key stays
//! correct for the model's lifetime; entries are only dropped by
//! [`RotationCache::clear`] to bound memory. Each key is computed at most once
//! while cached; concurrent callers for the same key block on the first
//! computation and share its result.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::OnceCell;

use super::error::RotationError;
use crate::geometry::FiniteRotation;
use crate::ids::PlateId;

type Slot = Arc<OnceCell<Result<FiniteRotation, RotationError>>>;

/// Cache key: (moving plate, time, anchor plate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RotationKey {
    moving: PlateId,
    time_bits: u64,
    anchor: PlateId,
}

impl RotationKey {
    /// Creates a key. `-0.0` and `0.0` map to the same key.
    pub fn new(moving: PlateId, time: f64, anchor: PlateId) -> Self {
        Self {
            moving,
            time_bits: (time + 0.0).to_bits(),
            anchor,
        }
    }
}

/// Memo of composed rotations, shareable across worker threads.
#[derive(Debug, Default)]
pub struct RotationCache {
    entries: RwLock<HashMap<RotationKey, Slot>>,
}

impl RotationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached result for `key`, computing it with `compute` if absent.
    ///
    /// Failures are cached too, so a failing key is not recomputed.
    pub fn get_or_compute<F>(&self, key: RotationKey, compute: F) -> Result<FiniteRotation, RotationError>
    where
        F: FnOnce() -> Result<FiniteRotation, RotationError>,
    {
        // The map lock is released before computing; only the slot blocks.
        let slot = self.slot(key);
        slot.get_or_init(compute).clone()
    }

    /// Returns the cached result for `key` without computing it.
    pub fn get(&self, key: &RotationKey) -> Option<Result<FiniteRotation, RotationError>> {
        let slot = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()?;
        slot.get().cloned()
    }

    /// Number of keys computed or in progress.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry. Callers already computing a key keep their slot and
    /// still receive its value.
    pub fn clear(&self) {
        self.entries.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    fn slot(&self, key: RotationKey) -> Slot {
        if let Some(slot) = self.entries.read().unwrap_or_else(PoisonError::into_inner).get(&key) {
            return Arc::clone(slot);
        }
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(entries.entry(key).or_default())
    }
}
