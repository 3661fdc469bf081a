//! The utility trait and the registry that holds utilities by key.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use super::cancel::CancellationToken;
use super::sweep::TimeSweep;
use crate::export::{ExportError, ExportFormat};
use crate::ids::PlateId;
use crate::reconstruct::{ReconstructError, ReconstructionContext};

/// Errors that can occur while running a utility.
#[derive(Error, Debug)]
pub enum UtilityError {
    #[error("Unknown utility '{0}'")]
    UnknownUtility(String),
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },
    #[error(transparent)]
    Reconstruct(#[from] ReconstructError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Parameters passed to a utility run.
#[derive(Debug, Clone, Default)]
pub struct UtilityParams {
    /// Anchor plate for any reconstruction the utility performs.
    pub anchor: PlateId,
    /// Directory for output files; `None` writes nothing.
    pub output_dir: Option<PathBuf>,
    pub format: ExportFormat,
    /// Additional utility-specific numeric parameters.
    pub params: HashMap<String, f64>,
}

impl UtilityParams {
    /// Sets a numeric parameter.
    pub fn set_param(&mut self, key: &str, value: f64) -> &mut Self {
        self.params.insert(key.to_string(), value);
        self
    }

    /// Gets a numeric parameter, returning a default if not set.
    pub fn get_param(&self, key: &str, default: f64) -> f64 {
        self.params.get(key).copied().unwrap_or(default)
    }
}

/// What a utility run accomplished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UtilityOutcome {
    /// Units of work completed, e.g. frames for a sweep.
    pub steps: usize,
    /// True if the run stopped because its token was cancelled.
    pub cancelled: bool,
}

/// A named operation over a loaded reconstruction context.
pub trait Utility: Send + Sync {
    /// Stable registry key.
    fn name(&self) -> &str;

    /// One-line human-readable description.
    fn description(&self) -> &str;

    /// Runs the utility until it finishes or `cancel` is set.
    fn run(
        &self,
        context: &ReconstructionContext,
        params: &UtilityParams,
        cancel: &CancellationToken,
    ) -> Result<UtilityOutcome, UtilityError>;
}

/// A mapping from stable string keys to boxed values, ordered by key.
pub struct Registry<T: ?Sized> {
    entries: BTreeMap<String, Box<T>>,
}

impl<T: ?Sized> Default for Registry<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T: ?Sized> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `value` under `key`, returning the value it replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: Box<T>) -> Option<Box<T>> {
        self.entries.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.entries.get(key).map(|b| &**b)
    }

    /// Registered keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: ?Sized> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

impl Registry<dyn Utility> {
    /// A registry holding the built-in utilities.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(TimeSweep);
        registry
    }

    /// Registers a utility under its own name.
    pub fn register<U: Utility + 'static>(&mut self, utility: U) -> Option<Box<dyn Utility>> {
        let key = utility.name().to_string();
        self.insert(key, Box::new(utility))
    }

    /// Runs the utility registered under `key`.
    pub fn run(
        &self,
        key: &str,
        context: &ReconstructionContext,
        params: &UtilityParams,
        cancel: &CancellationToken,
    ) -> Result<UtilityOutcome, UtilityError> {
        let utility = self
            .get(key)
            .ok_or_else(|| UtilityError::UnknownUtility(key.to_string()))?;
        utility.run(context, params, cancel)
    }
}
