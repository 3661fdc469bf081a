//! Points on the unit sphere.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use super::shape::GeometryError;

/// Tolerance on `|v| - 1` for a vector to count as a point on the sphere.
pub const UNIT_LENGTH_TOLERANCE: f64 = 1e-9;

/// A geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLonPoint {
    /// Latitude in degrees, [-90, 90].
    pub lat: f64,
    /// Longitude in degrees, [-180, 180].
    pub lon: f64,
}

impl LatLonPoint {
    /// Creates a new coordinate without validation.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A unit vector on the sphere.
///
/// The x axis points at (0°N, 0°E), the y axis at (0°N, 90°E) and the z axis
/// at the north pole.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LatLonPoint", into = "LatLonPoint")]
pub struct PointOnSphere {
    position: DVec3,
}

impl PointOnSphere {
    /// Creates a point from a vector that must already be of unit length.
    pub fn new(position: DVec3) -> Result<Self, GeometryError> {
        let length = position.length();
        if !length.is_finite() || (length - 1.0).abs() > UNIT_LENGTH_TOLERANCE {
            return Err(GeometryError::NotUnitVector { length });
        }
        Ok(Self { position })
    }

    /// Creates a point from latitude and longitude in degrees.
    pub fn from_lat_lon(lat: f64, lon: f64) -> Result<Self, GeometryError> {
        if !lat.is_finite() || !lon.is_finite() || lat.abs() > 90.0 {
            return Err(GeometryError::InvalidCoordinate { lat, lon });
        }
        Ok(Self {
            position: lat_lon_to_vector(lat, lon),
        })
    }

    /// Normalizes `v` onto the sphere. Used after rotation to bound drift.
    pub(crate) fn from_vector_normalized(v: DVec3) -> Self {
        Self {
            position: v.normalize(),
        }
    }

    /// Returns the underlying unit vector.
    pub fn position(&self) -> DVec3 {
        self.position
    }

    /// Converts to latitude/longitude in degrees. Longitude is in (-180, 180].
    pub fn to_lat_lon(&self) -> LatLonPoint {
        let p = self.position;
        let lat = p.z.clamp(-1.0, 1.0).asin().to_degrees();
        // At the poles longitude is undefined; report 0.
        let lon = if p.x.abs() < 1e-15 && p.y.abs() < 1e-15 {
            0.0
        } else {
            p.y.atan2(p.x).to_degrees()
        };
        // Adding 0.0 turns -0.0 into 0.0 so exported text never shows "-0".
        LatLonPoint::new(lat + 0.0, lon + 0.0)
    }

    /// Great-circle distance to another point in radians.
    pub fn angular_distance(&self, other: &PointOnSphere) -> f64 {
        self.position.dot(other.position).clamp(-1.0, 1.0).acos()
    }
}

impl TryFrom<LatLonPoint> for PointOnSphere {
    type Error = GeometryError;

    fn try_from(value: LatLonPoint) -> Result<Self, Self::Error> {
        Self::from_lat_lon(value.lat, value.lon)
    }
}

impl From<PointOnSphere> for LatLonPoint {
    fn from(point: PointOnSphere) -> Self {
        point.to_lat_lon()
    }
}

/// Converts latitude/longitude in degrees to a unit vector.
pub fn lat_lon_to_vector(lat: f64, lon: f64) -> DVec3 {
    let (lat, lon) = (lat.to_radians(), lon.to_radians());
    DVec3::new(lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axes() {
        let cases = [
            ((0.0, 0.0), DVec3::X),
            ((0.0, 90.0), DVec3::Y),
            ((90.0, 0.0), DVec3::Z),
            ((-90.0, 0.0), DVec3::NEG_Z),
        ];
        for ((lat, lon), expected) in cases {
            let p = PointOnSphere::from_lat_lon(lat, lon).unwrap();
            assert!(
                (p.position() - expected).length() < 1e-12,
                "({}, {}) mapped to {:?}",
                lat,
                lon,
                p.position()
            );
        }
    }

    #[test]
    fn test_lat_lon_roundtrip() {
        for &(lat, lon) in &[(45.0, -120.0), (-33.5, 151.2), (10.0, 179.5), (-89.0, -1.0)] {
            let ll = PointOnSphere::from_lat_lon(lat, lon).unwrap().to_lat_lon();
            assert!((ll.lat - lat).abs() < 1e-10);
            assert!((ll.lon - lon).abs() < 1e-10);
        }
    }

    #[test]
    fn test_pole_longitude_is_zero() {
        let ll = PointOnSphere::from_lat_lon(90.0, 123.0).unwrap().to_lat_lon();
        assert!((ll.lat - 90.0).abs() < 1e-12);
        assert_eq!(ll.lon, 0.0);
    }

    #[test]
    fn test_rejects_non_unit_vector() {
        assert!(matches!(
            PointOnSphere::new(DVec3::new(2.0, 0.0, 0.0)),
            Err(GeometryError::NotUnitVector { .. })
        ));
        assert!(PointOnSphere::new(DVec3::new(0.0, 0.0, 1.0)).is_ok());
    }

    #[test]
    fn test_rejects_bad_latitude() {
        assert!(PointOnSphere::from_lat_lon(91.0, 0.0).is_err());
        assert!(PointOnSphere::from_lat_lon(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_angular_distance() {
        let a = PointOnSphere::from_lat_lon(0.0, 0.0).unwrap();
        let b = PointOnSphere::from_lat_lon(0.0, 90.0).unwrap();
        assert!((a.angular_distance(&b) - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_serde_as_lat_lon() {
        let p: PointOnSphere = serde_json::from_str(r#"{"lat": 10.0, "lon": 20.0}"#).unwrap();
        let ll = p.to_lat_lon();
        assert!((ll.lat - 10.0).abs() < 1e-10 && (ll.lon - 20.0).abs() < 1e-10);
        assert!(serde_json::from_str::<PointOnSphere>(r#"{"lat": 100.0, "lon": 0.0}"#).is_err());
    }
}
