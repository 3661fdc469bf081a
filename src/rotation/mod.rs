//! Rotation sequences, the rotation model and plate-circuit resolution.
//!
//! This module implements the kinematic core of plate reconstruction:
//! - Per-plate sequences of total reconstruction poles
//! - Reading PLATES4 rotation files
//! - Interpolated rotations relative to a plate's fixed plate
//! - Composed rotations relative to any anchor plate via plate circuits

mod cache;
mod config;
mod error;
mod model;
mod sequence;
mod store;
pub mod circuit;
pub mod parser;

pub use cache::{RotationCache, RotationKey};
pub use circuit::{PlateCircuit, MAX_REFRAME_DEPTH};
pub use config::{RotationConfig, TimeRangePolicy};
pub use error::RotationError;
pub use model::{EdgeRotation, RotationModel};
pub use parser::{load_rotation_file, load_rotation_files, parse_rotation_str, ParseStats, RotationFileError};
pub use sequence::{RotationSample, RotationSequence, SequenceLookup};
pub use store::RotationStore;
