//! Spherical geometry module.
//!
//! Provides unit-sphere points, point/polyline/polygon geometries, finite
//! rotations stored as unit quaternions, and the transformer that applies a
//! rotation to a geometry.

mod point;
mod rotation;
mod shape;
mod transform;

pub use point::{lat_lon_to_vector, LatLonPoint, PointOnSphere, UNIT_LENGTH_TOLERANCE};
pub use rotation::FiniteRotation;
pub use shape::{GeometryError, GeometryKind, GeometryOnSphere, PolygonOnSphere, PolylineOnSphere};
pub use transform::apply_rotation;
