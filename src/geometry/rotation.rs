//! Finite rotations of the sphere.
//!
//! A finite rotation is stored as a unit quaternion. Poles are given as
//! latitude/longitude in degrees and angles in degrees, matching the
//! conventions of total reconstruction poles in rotation files.

use glam::{DQuat, DVec3};

use super::point::{lat_lon_to_vector, LatLonPoint, PointOnSphere};

/// Below this `|sin(angle/2)|` the rotation axis is numerically undefined.
const AXIS_EPSILON: f64 = 1e-12;

/// Above this quaternion dot product slerp falls back to normalized lerp.
const SLERP_LINEAR_THRESHOLD: f64 = 1.0 - 1e-12;

/// A rigid rotation of the sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FiniteRotation {
    quat: DQuat,
}

impl Default for FiniteRotation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl FiniteRotation {
    /// The identity rotation (present day).
    pub const IDENTITY: FiniteRotation = FiniteRotation {
        quat: DQuat::IDENTITY,
    };

    /// Returns the identity rotation.
    pub const fn identity() -> Self {
        Self::IDENTITY
    }

    /// Creates a rotation from an Euler pole and an angle, all in degrees.
    ///
    /// Positive angles rotate counter-clockwise when looking down on the pole
    /// from outside the sphere.
    pub fn from_pole_and_angle(pole_lat: f64, pole_lon: f64, angle_deg: f64) -> Self {
        if angle_deg == 0.0 {
            return Self::IDENTITY;
        }
        Self::from_axis_angle(lat_lon_to_vector(pole_lat, pole_lon), angle_deg.to_radians())
    }

    /// Creates a rotation about a unit axis by an angle in radians.
    pub fn from_axis_angle(axis: DVec3, angle_rad: f64) -> Self {
        Self::from_quat(DQuat::from_axis_angle(axis.normalize(), angle_rad))
    }

    /// Wraps a quaternion, normalizing it to unit magnitude.
    pub fn from_quat(quat: DQuat) -> Self {
        Self {
            quat: quat.normalize(),
        }
    }

    /// Returns the underlying unit quaternion.
    pub fn quat(&self) -> DQuat {
        self.quat
    }

    /// Returns `self ∘ first`: the rotation that applies `first`, then `self`.
    pub fn compose(&self, first: &FiniteRotation) -> FiniteRotation {
        Self::from_quat(self.quat * first.quat)
    }

    /// Returns the inverse rotation.
    pub fn inverse(&self) -> FiniteRotation {
        Self {
            quat: self.quat.conjugate(),
        }
    }

    /// Rotates a vector.
    pub fn rotate_vector(&self, v: DVec3) -> DVec3 {
        self.quat * v
    }

    /// Rotates a point, re-normalizing the result onto the sphere.
    pub fn rotate_point(&self, point: &PointOnSphere) -> PointOnSphere {
        if self.quat == DQuat::IDENTITY {
            return *point;
        }
        PointOnSphere::from_vector_normalized(self.rotate_vector(point.position()))
    }

    /// Spherical linear interpolation towards `end`.
    ///
    /// `t = 0` yields `self`, `t = 1` yields `end` (up to quaternion sign).
    /// Always follows the shorter arc.
    pub fn slerp(&self, end: &FiniteRotation, t: f64) -> FiniteRotation {
        let mut q1 = end.quat;
        let mut dot = self.quat.dot(q1);
        if dot < 0.0 {
            q1 = -q1;
            dot = -dot;
        }
        if dot > SLERP_LINEAR_THRESHOLD {
            return Self::from_quat(self.quat * (1.0 - t) + q1 * t);
        }
        let theta = dot.acos();
        let sin_theta = theta.sin();
        let a = ((1.0 - t) * theta).sin() / sin_theta;
        let b = (t * theta).sin() / sin_theta;
        Self::from_quat(self.quat * a + q1 * b)
    }

    /// Rotation angle in degrees, in [0, 180].
    pub fn angle_degrees(&self) -> f64 {
        let w = self.canonical().w.clamp(-1.0, 1.0);
        (2.0 * w.acos()).to_degrees()
    }

    /// Returns the Euler pole and angle (degrees).
    ///
    /// The angle is in [0, 180]; the identity reports the north pole and 0.
    pub fn to_pole_and_angle(&self) -> (LatLonPoint, f64) {
        let q = self.canonical();
        let axis = DVec3::new(q.x, q.y, q.z);
        let sin_half = axis.length();
        if sin_half < AXIS_EPSILON {
            return (LatLonPoint::new(90.0, 0.0), 0.0);
        }
        let pole = PointOnSphere::from_vector_normalized(axis / sin_half).to_lat_lon();
        (pole, self.angle_degrees())
    }

    /// True if this is the identity within `epsilon` per quaternion component.
    pub fn is_identity(&self, epsilon: f64) -> bool {
        self.approx_eq(&Self::IDENTITY, epsilon)
    }

    /// Component-wise comparison treating `q` and `-q` as the same rotation.
    pub fn approx_eq(&self, other: &FiniteRotation, epsilon: f64) -> bool {
        let a = self.quat;
        let b = if a.dot(other.quat) < 0.0 { -other.quat } else { other.quat };
        (a.x - b.x).abs() <= epsilon
            && (a.y - b.y).abs() <= epsilon
            && (a.z - b.z).abs() <= epsilon
            && (a.w - b.w).abs() <= epsilon
    }

    /// The quaternion with non-negative scalar part.
    fn canonical(&self) -> DQuat {
        if self.quat.w < 0.0 {
            -self.quat
        } else {
            self.quat
        }
    }
}
