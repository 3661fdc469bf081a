//! Loading feature collections from reconstructable files.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use super::collection::FeatureCollection;

/// Errors that can occur while loading features.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error reading '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse features from '{}': {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },
}

/// Source of feature collections, one per reconstructable file.
///
/// Implementations must be shareable across threads so a loader can be held
/// by a long-lived context.
pub trait FeatureLoader: Send + Sync {
    /// Loads all features stored at `path`, in file order.
    fn load(&self, path: &Path) -> Result<FeatureCollection, LoadError>;
}

/// Loads `FeatureCollection`s stored as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFeatureLoader;

impl FeatureLoader for JsonFeatureLoader {
    fn load(&self, path: &Path) -> Result<FeatureCollection, LoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let collection: FeatureCollection = serde_json::from_str(&text).map_err(|e| LoadError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        debug!("Loaded {} features from {}", collection.len(), path.display());
        Ok(collection)
    }
}

/// Serves collections registered in memory, keyed by path.
#[derive(Debug, Clone, Default)]
pub struct MemoryFeatureLoader {
    collections: HashMap<PathBuf, FeatureCollection>,
}

impl MemoryFeatureLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `collection` under `path`, replacing any previous entry.
    pub fn insert(&mut self, path: impl Into<PathBuf>, collection: FeatureCollection) -> &mut Self {
        self.collections.insert(path.into(), collection);
        self
    }
}

impl FeatureLoader for MemoryFeatureLoader {
    fn load(&self, path: &Path) -> Result<FeatureCollection, LoadError> {
        self.collections.get(path).cloned().ok_or_else(|| LoadError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no collection registered"),
        })
    }
}
