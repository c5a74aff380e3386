//! JSON file storage implementation.
//!
//! Stores the progress document as a single JSON file named after its
//! namespaced key inside a data directory. Writes go to a sibling temp file
//! first and are renamed into place, so a crash mid-write leaves the previous
//! document intact.

use std::fs;
use std::path::{Path, PathBuf};
use pathtrack_core::ProgressDocument;
use tracing::debug;
use super::{ProgressStore, Result, DEFAULT_STORAGE_KEY};

/// File-based JSON store.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
    key: String,
}

impl JsonFileStore {
    /// Create a store under `root` using the default key. Creates the
    /// directory if needed.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        Self::with_key(root, DEFAULT_STORAGE_KEY)
    }

    /// Create a store under `root` with an explicit key.
    pub fn with_key(root: impl AsRef<Path>, key: impl Into<String>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root, key: key.into() })
    }

    /// Path of the document file.
    pub fn path(&self) -> PathBuf {
        self.root.join(format!("{}.json", self.key))
    }

    fn temp_path(&self) -> PathBuf {
        self.root.join(format!("{}.json.tmp", self.key))
    }
}

impl ProgressStore for JsonFileStore {
    fn load(&self) -> Result<Option<ProgressDocument>> {
        read_json(&self.path())
    }

    fn save(&self, doc: &ProgressDocument) -> Result<()> {
        let json = serde_json::to_string_pretty(doc)?;
        let tmp = self.temp_path();
        fs::write(&tmp, json.as_bytes())?;
        fs::rename(&tmp, self.path())?;
        debug!("Persisted progress to {}", self.path().display());
        Ok(())
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path) {
        Ok(json) => {
            let value = serde_json::from_str(&json)?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
