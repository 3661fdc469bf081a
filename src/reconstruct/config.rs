//! Configuration for reconstruction requests.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::feature::MissingPlateIdPolicy;
use crate::rotation::{RotationConfig, TimeRangePolicy};

/// Errors that can occur while reading a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Configuration parameters for a reconstruction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructConfig {
    /// Rotation model settings.
    pub rotation: RotationConfig,
    /// Handling of features without a reconstruction plate id.
    pub missing_plate_id: MissingPlateIdPolicy,
    /// Reconstruct features on the rayon thread pool.
    pub parallel: bool,
}

impl Default for ReconstructConfig {
    fn default() -> Self {
        Self {
            rotation: RotationConfig::default(),
            missing_plate_id: MissingPlateIdPolicy::default(),
            parallel: true,
        }
    }
}

impl ReconstructConfig {
    /// Fails on out-of-range times and on features without a plate id.
    pub fn strict() -> Self {
        Self {
            rotation: RotationConfig {
                time_range_policy: TimeRangePolicy::Fail,
                validate_hierarchy: true,
                ..Default::default()
            },
            missing_plate_id: MissingPlateIdPolicy::Reject,
            ..Default::default()
        }
    }

    /// Clamps out-of-range times and puts features without a plate id on plate 0.
    pub fn lenient() -> Self {
        Self {
            rotation: RotationConfig::clamped(),
            ..Default::default()
        }
    }

    /// Parses a JSON configuration. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a JSON configuration file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }
}
