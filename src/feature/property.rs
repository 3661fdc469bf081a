//! Property values attached to features.

use serde::{Deserialize, Serialize};

use crate::geometry::GeometryOnSphere;
use crate::ids::{PlateId, QualifiedName};

/// A geological time instant in Ma; larger values are older.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeoTimeInstant {
    /// Older than any real time.
    DistantPast,
    /// Younger than any real time.
    DistantFuture,
    /// A finite time in Ma.
    Real(f64),
}

impl GeoTimeInstant {
    /// The instant as Ma, with the distant past and future as +/- infinity.
    pub fn as_ma(self) -> f64 {
        match self {
            GeoTimeInstant::DistantPast => f64::INFINITY,
            GeoTimeInstant::DistantFuture => f64::NEG_INFINITY,
            GeoTimeInstant::Real(t) => t,
        }
    }
}

impl From<f64> for GeoTimeInstant {
    fn from(time: f64) -> Self {
        GeoTimeInstant::Real(time)
    }
}

/// A time span from `begin` (older) to `end` (younger).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimePeriod {
    pub begin: GeoTimeInstant,
    pub end: GeoTimeInstant,
}

impl TimePeriod {
    pub fn new(begin: impl Into<GeoTimeInstant>, end: impl Into<GeoTimeInstant>) -> Self {
        Self {
            begin: begin.into(),
            end: end.into(),
        }
    }

    /// The period covering all of time.
    pub fn always() -> Self {
        Self::new(GeoTimeInstant::DistantPast, GeoTimeInstant::DistantFuture)
    }

    /// True if `begin >= time >= end`, both bounds inclusive.
    pub fn contains(&self, time: f64) -> bool {
        self.begin.as_ma() >= time && time >= self.end.as_ma()
    }
}

/// The value of a feature property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyValue {
    String(String),
    Enumeration {
        enum_type: QualifiedName,
        value: String,
    },
    TimeInstant(GeoTimeInstant),
    TimePeriod(TimePeriod),
    Geometry(GeometryOnSphere),
    QualifiedName(QualifiedName),
    PlateId(PlateId),
    Integer(i64),
    Double(f64),
    Boolean(bool),
}

impl PropertyValue {
    /// Short name of the value's type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::String(_) => "string",
            PropertyValue::Enumeration { .. } => "enumeration",
            PropertyValue::TimeInstant(_) => "time_instant",
            PropertyValue::TimePeriod(_) => "time_period",
            PropertyValue::Geometry(_) => "geometry",
            PropertyValue::QualifiedName(_) => "qualified_name",
            PropertyValue::PlateId(_) => "plate_id",
            PropertyValue::Integer(_) => "integer",
            PropertyValue::Double(_) => "double",
            PropertyValue::Boolean(_) => "boolean",
        }
    }

    /// Reads the value as a plate id. Non-negative integers are accepted.
    pub fn as_plate_id(&self) -> Option<PlateId> {
        match *self {
            PropertyValue::PlateId(id) => Some(id),
            PropertyValue::Integer(i) => u32::try_from(i).ok().map(PlateId),
            _ => None,
        }
    }

    pub fn as_time_period(&self) -> Option<&TimePeriod> {
        match self {
            PropertyValue::TimePeriod(period) => Some(period),
            _ => None,
        }
    }

    pub fn as_geometry(&self) -> Option<&GeometryOnSphere> {
        match self {
            PropertyValue::Geometry(geometry) => Some(geometry),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            PropertyValue::Enumeration { value, .. } => Some(value),
            _ => None,
        }
    }
}
