//! Reconstruction of features to a past geological time.
//!
//! The driver loads rotation and feature files, builds the rotation model,
//! reconstructs each feature independently and writes the results in input
//! order.

mod config;
mod context;
mod engine;
mod request;

pub use config::{ConfigError, ReconstructConfig};
pub use context::ReconstructionContext;
pub use engine::{
    FeatureOutcome, FeatureReconstructionError, FeatureStatus, ReconstructedFeatureGeometry,
    ReconstructionReport, ReconstructionSummary, Reconstructor,
};
pub use request::{reconstruct, ReconstructError, ReconstructRequest};
