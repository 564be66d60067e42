//! State directory and document load/save primitives

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Document names, one file per concern
pub const SETTINGS_FILE: &str = "config.json";
pub const FAVORITES_FILE: &str = "favorites.json";
pub const DOWNLOAD_HISTORY_FILE: &str = "history.json";
pub const BENCHMARKS_FILE: &str = "benchmarks.json";
pub const UPDATE_MANIFEST_FILE: &str = "update_manifest.json";
pub const PACKS_FILE: &str = "packs.json";

/// Persistence errors (save side only; loads degrade instead of failing)
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("could not write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not serialize {path}: {source}")]
    Serialize {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Root directory for all persisted documents
#[derive(Debug, Clone)]
pub struct StateDir {
    root: PathBuf,
}

impl StateDir {
    /// Per-user default location
    pub fn default_location() -> Self {
        let root = dirs::data_dir()
            .map(|d| d.join("modelcompass"))
            .unwrap_or_else(|| PathBuf::from(".modelcompass"));
        Self { root }
    }

    pub fn at(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Loads one document, degrading to the default on any problem
    ///
    /// A missing file is normal (first run). A file that exists but cannot
    /// be parsed is persisted-state corruption: it is logged and that one
    /// concern starts from its default; other documents are unaffected.
    pub fn load_or_default<T: DeserializeOwned + Default>(&self, name: &str) -> T {
        let path = self.path_for(name);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("{} not present, starting from defaults", path.display());
                return T::default();
            }
            Err(e) => {
                warn!(
                    "persisted state corrupt: could not read {}: {}, using defaults",
                    path.display(),
                    e
                );
                return T::default();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(value) => value,
            Err(e) => {
                warn!(
                    "persisted state corrupt: could not parse {}: {}, using defaults",
                    path.display(),
                    e
                );
                T::default()
            }
        }
    }

    /// Rewrites one document in full
    pub fn save<T: Serialize>(&self, name: &str, value: &T) -> Result<(), PersistError> {
        let path = self.path_for(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PersistError::Io {
                path: path.display().to_string(),
                source: e,
            })?;
        }
        let json = serde_json::to_string_pretty(value).map_err(|e| PersistError::Serialize {
            path: path.display().to_string(),
            source: e,
        })?;
        std::fs::write(&path, json).map_err(|e| PersistError::Io {
            path: path.display().to_string(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Doc {
        value: u32,
    }

    #[test]
    fn test_missing_file_yields_default() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateDir::at(dir.path().to_path_buf());
        let doc: Doc = state.load_or_default("missing.json");
        assert_eq!(doc, Doc::default());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateDir::at(dir.path().to_path_buf());
        state.save("doc.json", &Doc { value: 42 }).unwrap();
        let doc: Doc = state.load_or_default("doc.json");
        assert_eq!(doc.value, 42);
    }

    #[test]
    fn test_corrupt_file_degrades_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateDir::at(dir.path().to_path_buf());
        std::fs::write(state.path_for("doc.json"), "{not json at all").unwrap();
        let doc: Doc = state.load_or_default("doc.json");
        assert_eq!(doc, Doc::default());
    }

    #[test]
    fn test_one_corrupt_document_does_not_affect_others() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateDir::at(dir.path().to_path_buf());
        state.save("good.json", &Doc { value: 7 }).unwrap();
        std::fs::write(state.path_for("bad.json"), "][").unwrap();

        let bad: Doc = state.load_or_default("bad.json");
        let good: Doc = state.load_or_default("good.json");
        assert_eq!(bad, Doc::default());
        assert_eq!(good.value, 7);
    }
}
