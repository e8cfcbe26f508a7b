//! JSON dataset persistence
//!
//! A dataset lives at `<data_dir>/<name>.json`. Saves go through a temp
//! file in the same directory and are renamed into place.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{FeatureVector, Label};
use crate::{Error, Result};

/// Current on-disk format version
pub const DATASET_VERSION: u32 = 1;

/// Persisted form of a classifier's stored examples
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub version: u32,

    /// Shared feature dimension, `None` for an empty dataset
    #[serde(default)]
    pub dimension: Option<usize>,

    #[serde(default)]
    pub examples: BTreeMap<Label, Vec<FeatureVector>>,
}

impl Dataset {
    /// Check version and that every vector matches the declared dimension
    ///
    /// # Errors
    ///
    /// Returns [`Error::Persistence`] describing the first inconsistency
    pub fn validate(&self) -> Result<()> {
        if self.version != DATASET_VERSION {
            return Err(Error::Persistence(format!(
                "unsupported dataset version {} (expected {DATASET_VERSION})",
                self.version
            )));
        }

        let total: usize = self.examples.values().map(Vec::len).sum();
        match self.dimension {
            None if total > 0 => Err(Error::Persistence(
                "dataset has examples but no dimension".to_string(),
            )),
            None => Ok(()),
            Some(0) => Err(Error::Persistence(
                "dataset declares zero-length feature vectors".to_string(),
            )),
            Some(dim) if total == 0 => Err(Error::Persistence(format!(
                "empty dataset declares dimension {dim}"
            ))),
            Some(dim) => {
                for (label, vectors) in &self.examples {
                    if let Some(bad) = vectors.iter().find(|v| v.dimension() != dim) {
                        return Err(Error::Persistence(format!(
                            "{label} example has dimension {} (expected {dim})",
                            bad.dimension()
                        )));
                    }
                }
                Ok(())
            }
        }
    }
}

/// Reads and writes named datasets in one directory
#[derive(Debug, Clone)]
pub struct DatasetStore {
    dir: PathBuf,
}

impl DatasetStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the datasets
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path for a dataset name
    ///
    /// # Errors
    ///
    /// Returns [`Error::Persistence`] for empty names or names that would
    /// escape the directory
    pub fn path(&self, name: &str) -> Result<PathBuf> {
        let name = name.trim();
        let name = name.strip_suffix(".json").unwrap_or(name);
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(Error::Persistence(format!("invalid dataset name: {name:?}")));
        }
        Ok(self.dir.join(format!("{name}.json")))
    }

    /// Write a dataset, replacing any previous file of the same name
    ///
    /// # Errors
    ///
    /// Returns [`Error::Persistence`] if the directory or file cannot be written
    pub fn save(&self, name: &str, dataset: &Dataset) -> Result<PathBuf> {
        let path = self.path(name)?;

        std::fs::create_dir_all(&self.dir).map_err(|e| {
            Error::Persistence(format!("failed to create {}: {e}", self.dir.display()))
        })?;

        let json = serde_json::to_vec_pretty(dataset)
            .map_err(|e| Error::Persistence(format!("failed to encode dataset: {e}")))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)
            .map_err(|e| Error::Persistence(format!("failed to create temp file: {e}")))?;
        tmp.write_all(&json)
            .map_err(|e| Error::Persistence(format!("failed to write dataset: {e}")))?;
        tmp.persist(&path).map_err(|e| {
            Error::Persistence(format!("failed to write {}: {}", path.display(), e.error))
        })?;

        tracing::debug!(path = %path.display(), bytes = json.len(), "dataset saved");
        Ok(path)
    }

    /// Read and validate a dataset
    ///
    /// # Errors
    ///
    /// Returns [`Error::Persistence`] if the file is missing, unreadable,
    /// malformed, or inconsistent
    pub fn load(&self, name: &str) -> Result<Dataset> {
        let path = self.path(name)?;

        let content = std::fs::read_to_string(&path).map_err(|e| {
            Error::Persistence(format!("failed to read {}: {e}", path.display()))
        })?;

        let dataset: Dataset = serde_json::from_str(&content).map_err(|e| {
            Error::Persistence(format!("failed to parse {}: {e}", path.display()))
        })?;
        dataset.validate()?;

        tracing::debug!(path = %path.display(), "dataset loaded");
        Ok(dataset)
    }
}
