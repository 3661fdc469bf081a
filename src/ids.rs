//! Identifier types shared by the rotation model and the feature model.
//!
//! Identifiers compare and hash on their canonical string form so they can be
//! used directly as map keys.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;

/// Identifier of a tectonic plate.
///
/// Plate ids carry no ordering semantics; only equality and hashing are
/// defined. Plate `0` is the conventional global reference plate and the
/// default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlateId(pub u32);

impl PlateId {
    /// The conventional global reference plate (`000`).
    pub const GLOBAL_REFERENCE: PlateId = PlateId(0);

    /// Returns the numeric plate id.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PlateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}", self.0)
    }
}

impl FromStr for PlateId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

impl From<u32> for PlateId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Errors produced when parsing identifiers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("Empty identifier")]
    Empty,
    #[error("Malformed qualified name '{0}': expected 'prefix:localName'")]
    MalformedQualifiedName(String),
}

/// Identifier of a feature, e.g. `GPlates-4b8f...`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FeatureId(String);

impl FeatureId {
    /// Creates a feature id from its string form.
    pub fn new(id: impl Into<String>) -> Result<Self, IdError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(IdError::Empty);
        }
        Ok(Self(id))
    }

    /// Returns the canonical string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for FeatureId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for FeatureId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FeatureId> for String {
    fn from(id: FeatureId) -> Self {
        id.0
    }
}

/// A namespace-qualified name such as `gpml:reconstructionPlateId`.
///
/// Equality and hashing use the canonical `prefix:localName` string.
/// The canonical string is computed once at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QualifiedName {
    canonical: String,
    split: usize,
}

impl QualifiedName {
    /// Creates a qualified name from a prefix and a local name.
    pub fn new(prefix: &str, local_name: &str) -> Result<Self, IdError> {
        if prefix.is_empty() || local_name.is_empty() || prefix.contains(':') || local_name.contains(':') {
            return Err(IdError::MalformedQualifiedName(format!("{}:{}", prefix, local_name)));
        }
        Ok(Self {
            canonical: format!("{}:{}", prefix, local_name),
            split: prefix.len(),
        })
    }

    /// Creates a qualified name in the `gpml` namespace.
    ///
    /// # Panics
    /// Panics if `local_name` is empty or contains `:`; intended for literals.
    pub fn gpml(local_name: &str) -> Self {
        Self::new("gpml", local_name).unwrap_or_else(|e| panic!("{}", e))
    }

    /// Creates a qualified name in the `gml` namespace.
    ///
    /// # Panics
    /// Panics if `local_name` is empty or contains `:`; intended for literals.
    pub fn gml(local_name: &str) -> Self {
        Self::new("gml", local_name).unwrap_or_else(|e| panic!("{}", e))
    }

    /// Returns the namespace prefix.
    pub fn prefix(&self) -> &str {
        &self.canonical[..self.split]
    }

    /// Returns the local name.
    pub fn local_name(&self) -> &str {
        &self.canonical[self.split + 1..]
    }

    /// Returns the canonical `prefix:localName` form.
    pub fn as_str(&self) -> &str {
        &self.canonical
    }
}

impl PartialEq for QualifiedName {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for QualifiedName {}

impl Hash for QualifiedName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

impl FromStr for QualifiedName {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.split_once(':') {
            Some((prefix, local)) => Self::new(prefix, local)
                .map_err(|_| IdError::MalformedQualifiedName(s.to_string())),
            None => Err(IdError::MalformedQualifiedName(s.to_string())),
        }
    }
}

impl TryFrom<String> for QualifiedName {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<QualifiedName> for String {
    fn from(name: QualifiedName) -> Self {
        name.canonical
    }
}
