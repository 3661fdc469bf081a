//! Features and feature collections.

use serde::{Deserialize, Serialize};

use super::property::{PropertyValue, TimePeriod};
use crate::geometry::GeometryOnSphere;
use crate::ids::{FeatureId, PlateId, QualifiedName};

/// Local name of the reconstruction plate id property (`gpml` namespace).
pub const RECONSTRUCTION_PLATE_ID: &str = "reconstructionPlateId";
/// Local name of the valid-time property (`gml` namespace).
pub const VALID_TIME: &str = "validTime";

/// A named property of a feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopLevelProperty {
    pub name: QualifiedName,
    pub value: PropertyValue,
}

/// A geological feature: an id, a type and an ordered list of properties.
///
/// Properties keep insertion order when enumerated. A name may appear more
/// than once; lookups return the first match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    id: FeatureId,
    feature_type: QualifiedName,
    #[serde(default)]
    properties: Vec<TopLevelProperty>,
}

impl Feature {
    pub fn new(id: FeatureId, feature_type: QualifiedName) -> Self {
        Self {
            id,
            feature_type,
            properties: Vec::new(),
        }
    }

    pub fn id(&self) -> &FeatureId {
        &self.id
    }

    pub fn feature_type(&self) -> &QualifiedName {
        &self.feature_type
    }

    /// Appends a property.
    pub fn add_property(&mut self, name: QualifiedName, value: PropertyValue) {
        self.properties.push(TopLevelProperty { name, value });
    }

    /// Builder form of [`Feature::add_property`].
    pub fn with_property(mut self, name: QualifiedName, value: PropertyValue) -> Self {
        self.add_property(name, value);
        self
    }

    /// Sets `gpml:reconstructionPlateId`.
    pub fn with_plate_id(self, plate: PlateId) -> Self {
        self.with_property(QualifiedName::gpml(RECONSTRUCTION_PLATE_ID), PropertyValue::PlateId(plate))
    }

    /// Sets `gml:validTime`.
    pub fn with_valid_time(self, period: TimePeriod) -> Self {
        self.with_property(QualifiedName::gml(VALID_TIME), PropertyValue::TimePeriod(period))
    }

    /// Adds a geometry under `gpml:<local_name>`.
    pub fn with_geometry(self, local_name: &str, geometry: impl Into<GeometryOnSphere>) -> Self {
        self.with_property(QualifiedName::gpml(local_name), PropertyValue::Geometry(geometry.into()))
    }

    /// All properties in insertion order.
    pub fn properties(&self) -> &[TopLevelProperty] {
        &self.properties
    }

    /// The first property value named `name`.
    pub fn property(&self, name: &QualifiedName) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|p| &p.name == name)
            .map(|p| &p.value)
    }

    /// The reconstruction plate id, if present and readable as a plate id.
    pub fn reconstruction_plate_id(&self) -> Option<PlateId> {
        self.reconstruction_plate_id_value()
            .and_then(PropertyValue::as_plate_id)
    }

    /// The raw `gpml:reconstructionPlateId` value, readable or not.
    pub fn reconstruction_plate_id_value(&self) -> Option<&PropertyValue> {
        self.property(&QualifiedName::gpml(RECONSTRUCTION_PLATE_ID))
    }

    /// The valid-time window, if present.
    pub fn valid_time(&self) -> Option<TimePeriod> {
        self.property(&QualifiedName::gml(VALID_TIME))
            .and_then(PropertyValue::as_time_period)
            .copied()
    }

    /// Geometry-valued properties in insertion order.
    pub fn geometries(&self) -> impl Iterator<Item = (&QualifiedName, &GeometryOnSphere)> {
        self.properties
            .iter()
            .filter_map(|p| p.value.as_geometry().map(|g| (&p.name, g)))
    }
}

/// An ordered collection of features, as read from one source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.features.iter()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self {
            features: iter.into_iter().collect(),
        }
    }
}

impl Extend<Feature> for FeatureCollection {
    fn extend<I: IntoIterator<Item = Feature>>(&mut self, iter: I) {
        self.features.extend(iter);
    }
}

impl IntoIterator for FeatureCollection {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}

impl<'a> IntoIterator for &'a FeatureCollection {
    type Item = &'a Feature;
    type IntoIter = std::slice::Iter<'a, Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}
