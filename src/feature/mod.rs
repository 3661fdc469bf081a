//! The feature model consumed by reconstruction.
//!
//! Features are loaded by a [`FeatureLoader`]; the engine reads only their
//! reconstruction plate id, valid-time window and geometry properties.

mod collection;
mod loader;
mod property;
mod time_model;

pub use collection::{Feature, FeatureCollection, TopLevelProperty, RECONSTRUCTION_PLATE_ID, VALID_TIME};
pub use loader::{FeatureLoader, JsonFeatureLoader, LoadError, MemoryFeatureLoader};
pub use property::{GeoTimeInstant, PropertyValue, TimePeriod};
pub use time_model::{FeatureError, FeatureTimeModel, MissingPlateIdPolicy};
