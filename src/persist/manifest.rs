//! Update manifest: which models are installed where
//!
//! Registration records land here so later sessions can tell what is already
//! on disk and check the source repository for newer releases.

use super::store::{StateDir, UPDATE_MANIFEST_FILE};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::warn;

/// One tracked install
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub source_repo: String,
    pub local_path: PathBuf,
    pub registered_at: DateTime<Utc>,
}

/// Persisted update manifest, keyed by model id
pub struct UpdateManifestStore {
    state_dir: StateDir,
    entries: Mutex<BTreeMap<String, ManifestEntry>>,
}

impl UpdateManifestStore {
    pub fn load(state_dir: StateDir) -> Self {
        let entries: BTreeMap<String, ManifestEntry> =
            state_dir.load_or_default(UPDATE_MANIFEST_FILE);
        Self {
            state_dir,
            entries: Mutex::new(entries),
        }
    }

    /// Records (or re-records) an install; idempotent for identical inputs
    pub fn record(&self, model_id: &str, source_repo: &str, local_path: PathBuf) {
        {
            let mut entries = self.lock();
            match entries.get_mut(model_id) {
                // Same repo and path: keep the original registration time so
                // repeat registrations leave the manifest unchanged
                Some(entry) if entry.source_repo == source_repo && entry.local_path == local_path => {}
                _ => {
                    entries.insert(
                        model_id.to_string(),
                        ManifestEntry {
                            source_repo: source_repo.to_string(),
                            local_path,
                            registered_at: Utc::now(),
                        },
                    );
                }
            }
        }
        let snapshot = self.lock().clone();
        if let Err(e) = self.state_dir.save(UPDATE_MANIFEST_FILE, &snapshot) {
            warn!("could not persist update manifest: {}", e);
        }
    }

    pub fn get(&self, model_id: &str) -> Option<ManifestEntry> {
        self.lock().get(model_id).cloned()
    }

    pub fn list(&self) -> Vec<(String, ManifestEntry)> {
        self.lock()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, ManifestEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}
