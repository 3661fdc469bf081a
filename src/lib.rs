//! Plate reconstruction engine.
//!
//! This crate reconstructs geological features to their position at a past
//! time using finite rotations read from PLATES4 rotation files, composed
//! across a time-dependent plate hierarchy.

pub mod export;
pub mod feature;
pub mod geometry;
pub mod ids;
pub mod reconstruct;
pub mod registry;
pub mod rotation;

pub use export::{ExportError, ExportFormat};
pub use feature::{Feature, FeatureCollection, FeatureLoader, JsonFeatureLoader};
pub use geometry::{apply_rotation, FiniteRotation, GeometryOnSphere, PointOnSphere};
pub use ids::{FeatureId, PlateId, QualifiedName};
pub use reconstruct::{reconstruct, ReconstructConfig, ReconstructError, ReconstructRequest, ReconstructionContext};
pub use registry::{CancellationToken, Registry, Utility};
pub use rotation::{PlateCircuit, RotationError, RotationModel, RotationStore, TimeRangePolicy};
