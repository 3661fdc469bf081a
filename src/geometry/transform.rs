//! Applying finite rotations to geometries.

use super::rotation::FiniteRotation;
use super::shape::{GeometryError, GeometryOnSphere};

/// Rotates every vertex of `geometry` by `rotation`.
///
/// The variant, vertex count and vertex order are preserved, and every rotated
/// vertex is re-normalized onto the unit sphere.
///
/// # Errors
/// Returns [`GeometryError::InvalidGeometryTopology`] for polylines with fewer
/// than two points or polygons with fewer than three, before any rotation.
pub fn apply_rotation(
    rotation: &FiniteRotation,
    geometry: &GeometryOnSphere,
) -> Result<GeometryOnSphere, GeometryError> {
    geometry.validate()?;

    let rotated = geometry
        .points()
        .iter()
        .map(|p| rotation.rotate_point(p))
        .collect();

    Ok(geometry.with_points(rotated))
}
