//! Configuration for rotation lookups.

use serde::{Deserialize, Serialize};

/// What to do when a query time falls outside a plate's rotation sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRangePolicy {
    /// Report `TimeOutOfRange`. Extrapolating misrepresents the plate's history.
    #[default]
    Fail,
    /// Use the nearest endpoint sample.
    Clamp,
}

/// Configuration parameters for the rotation model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    /// Behaviour for times outside a sequence.
    pub time_range_policy: TimeRangePolicy,
    /// Memoize composed rotations per (moving plate, time, anchor).
    pub cache_rotations: bool,
    /// Reject hierarchies containing a cycle at any sample time when building.
    pub validate_hierarchy: bool,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            time_range_policy: TimeRangePolicy::Fail,
            cache_rotations: true,
            validate_hierarchy: true,
        }
    }
}

impl RotationConfig {
    /// Configuration that clamps out-of-range times to the sequence ends.
    pub fn clamped() -> Self {
        Self {
            time_range_policy: TimeRangePolicy::Clamp,
            ..Default::default()
        }
    }
}
