//! Geometry variants on the sphere: point, polyline and polygon.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::point::{PointOnSphere, UNIT_LENGTH_TOLERANCE};

/// Errors raised by geometry construction and validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Invalid geometry topology: {kind} has {points} point(s), at least {required} required")]
    InvalidGeometryTopology {
        kind: GeometryKind,
        points: usize,
        required: usize,
    },
    #[error("Vector of length {length} is not on the unit sphere")]
    NotUnitVector { length: f64 },
    #[error("Invalid coordinate: lat {lat}, lon {lon}")]
    InvalidCoordinate { lat: f64, lon: f64 },
}

/// The shape of a geometry, without its points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryKind {
    Point,
    Polyline,
    Polygon,
}

impl GeometryKind {
    /// Minimum number of points for a well-formed geometry of this kind.
    pub const fn min_points(self) -> usize {
        match self {
            GeometryKind::Point => 1,
            GeometryKind::Polyline => 2,
            GeometryKind::Polygon => 3,
        }
    }

    /// Returns the lowercase name of this kind.
    pub const fn name(self) -> &'static str {
        match self {
            GeometryKind::Point => "point",
            GeometryKind::Polyline => "polyline",
            GeometryKind::Polygon => "polygon",
        }
    }
}

impl std::fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An open, ordered sequence of at least two points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolylineOnSphere {
    points: Vec<PointOnSphere>,
}

impl PolylineOnSphere {
    /// Creates a polyline, rejecting fewer than two points.
    pub fn new(points: Vec<PointOnSphere>) -> Result<Self, GeometryError> {
        check_point_count(GeometryKind::Polyline, points.len())?;
        Ok(Self { points })
    }

    /// Returns the vertices in order.
    pub fn points(&self) -> &[PointOnSphere] {
        &self.points
    }
}

/// A closed ring of at least three points.
///
/// The ring is implicitly closed; the first vertex is not repeated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolygonOnSphere {
    points: Vec<PointOnSphere>,
}

impl PolygonOnSphere {
    /// Creates a polygon, rejecting fewer than three points.
    pub fn new(points: Vec<PointOnSphere>) -> Result<Self, GeometryError> {
        check_point_count(GeometryKind::Polygon, points.len())?;
        Ok(Self { points })
    }

    /// Returns the ring vertices in order.
    pub fn points(&self) -> &[PointOnSphere] {
        &self.points
    }
}

/// A geometry on the unit sphere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryOnSphere {
    Point(PointOnSphere),
    Polyline(PolylineOnSphere),
    Polygon(PolygonOnSphere),
}

impl GeometryOnSphere {
    /// Returns the kind of this geometry.
    pub fn kind(&self) -> GeometryKind {
        match self {
            GeometryOnSphere::Point(_) => GeometryKind::Point,
            GeometryOnSphere::Polyline(_) => GeometryKind::Polyline,
            GeometryOnSphere::Polygon(_) => GeometryKind::Polygon,
        }
    }

    /// Returns all vertices in order.
    pub fn points(&self) -> &[PointOnSphere] {
        match self {
            GeometryOnSphere::Point(p) => std::slice::from_ref(p),
            GeometryOnSphere::Polyline(line) => line.points(),
            GeometryOnSphere::Polygon(polygon) => polygon.points(),
        }
    }

    /// Checks point count and unit length of every vertex.
    ///
    /// Deserialized geometries bypass the constructors, so this is re-checked
    /// before any rotation is applied.
    pub fn validate(&self) -> Result<(), GeometryError> {
        check_point_count(self.kind(), self.points().len())?;
        for p in self.points() {
            let length = p.position().length();
            if !length.is_finite() || (length - 1.0).abs() > UNIT_LENGTH_TOLERANCE {
                return Err(GeometryError::NotUnitVector { length });
            }
        }
        Ok(())
    }

    /// Rebuilds a geometry of the same kind from new vertices.
    ///
    /// Callers must supply the same number of points as `self`.
    pub(crate) fn with_points(&self, points: Vec<PointOnSphere>) -> GeometryOnSphere {
        match self {
            GeometryOnSphere::Point(_) => GeometryOnSphere::Point(points[0]),
            GeometryOnSphere::Polyline(_) => GeometryOnSphere::Polyline(PolylineOnSphere { points }),
            GeometryOnSphere::Polygon(_) => GeometryOnSphere::Polygon(PolygonOnSphere { points }),
        }
    }
}

impl From<PointOnSphere> for GeometryOnSphere {
    fn from(point: PointOnSphere) -> Self {
        GeometryOnSphere::Point(point)
    }
}

impl From<PolylineOnSphere> for GeometryOnSphere {
    fn from(line: PolylineOnSphere) -> Self {
        GeometryOnSphere::Polyline(line)
    }
}

impl From<PolygonOnSphere> for GeometryOnSphere {
    fn from(polygon: PolygonOnSphere) -> Self {
        GeometryOnSphere::Polygon(polygon)
    }
}

fn check_point_count(kind: GeometryKind, points: usize) -> Result<(), GeometryError> {
    let required = kind.min_points();
    if points < required {
        return Err(GeometryError::InvalidGeometryTopology {
            kind,
            points,
            required,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(f64, f64)]) -> Vec<PointOnSphere> {
        coords
            .iter()
            .map(|&(lat, lon)| PointOnSphere::from_lat_lon(lat, lon).unwrap())
            .collect()
    }

    #[test]
    fn test_polyline_requires_two_points() {
        let err = PolylineOnSphere::new(pts(&[(0.0, 0.0)])).unwrap_err();
        assert_eq!(
            err,
            GeometryError::InvalidGeometryTopology {
                kind: GeometryKind::Polyline,
                points: 1,
                required: 2
            }
        );
        assert!(PolylineOnSphere::new(pts(&[(0.0, 0.0), (1.0, 1.0)])).is_ok());
    }

    #[test]
    fn test_polygon_requires_three_points() {
        assert!(PolygonOnSphere::new(pts(&[(0.0, 0.0), (1.0, 1.0)])).is_err());
        assert!(PolygonOnSphere::new(pts(&[(0.0, 0.0), (1.0, 1.0), (0.0, 2.0)])).is_ok());
    }

    #[test]
    fn test_validate_catches_deserialized_degenerate_polygon() {
        let json = r#"{"polygon": [{"lat": 0.0, "lon": 0.0}, {"lat": 1.0, "lon": 1.0}]}"#;
        let geometry: GeometryOnSphere = serde_json::from_str(json).unwrap();
        assert!(matches!(
            geometry.validate(),
            Err(GeometryError::InvalidGeometryTopology { kind: GeometryKind::Polygon, .. })
        ));
    }

    #[test]
    fn test_points_accessor_per_variant() {
        let point = GeometryOnSphere::from(pts(&[(10.0, 10.0)])[0]);
        assert_eq!(point.points().len(), 1);
        assert_eq!(point.kind(), GeometryKind::Point);

        let line: GeometryOnSphere = PolylineOnSphere::new(pts(&[(0.0, 0.0), (0.0, 5.0), (0.0, 10.0)]))
            .unwrap()
            .into();
        assert_eq!(line.points().len(), 3);
        assert!(line.validate().is_ok());
    }
}
