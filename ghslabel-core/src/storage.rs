//! Persisted State - JSON files in a state directory
//!
//! Each store is an opaque JSON document under a fixed key. A missing or
//! malformed document loads as the empty default; corruption is logged,
//! never propagated.

use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const FAVORITES_KEY: &str = "ghs_favorites";
pub const HISTORY_KEY: &str = "ghs_search_history";
pub const OVERRIDES_KEY: &str = "ghs_custom_classifications";
pub const LABEL_TEMPLATES_KEY: &str = "ghs_label_templates";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error for '{0}': {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Directory holding every persisted store.
#[derive(Debug, Clone)]
pub struct StateDir {
    root: PathBuf,
}

impl StateDir {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StoreError::Io(root.clone(), e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn file<T>(&self, key: &str) -> JsonFile<T> {
        JsonFile::new(self.root.join(format!("{key}.json")))
    }
}

/// A single JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFile<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T> JsonFile<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T> JsonFile<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    /// Load the document, resetting to `T::default()` when absent or corrupt.
    pub fn load(&self) -> T {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return T::default(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to read state, using empty default");
                return T::default();
            }
        };

        if content.trim().is_empty() {
            return T::default();
        }

        match serde_json::from_str(&content) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "corrupt state, resetting to empty default");
                T::default()
            }
        }
    }

    /// Write through a temporary sibling so readers never see a torn file.
    pub fn save(&self, value: &T) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(value)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| StoreError::Io(tmp.clone(), e))?;
        fs::rename(&tmp, &self.path).map_err(|e| StoreError::Io(self.path.clone(), e))?;
        Ok(())
    }
}
