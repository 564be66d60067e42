//! User favorites and notes

use super::store::{StateDir, FAVORITES_FILE};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Mutex;
use tracing::warn;

/// One starred model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteEntry {
    pub model_id: String,
    pub note: Option<String>,
    pub starred_at: DateTime<Utc>,
}

/// Persisted favorites, keyed by model id
pub struct FavoritesStore {
    state_dir: StateDir,
    entries: Mutex<BTreeMap<String, FavoriteEntry>>,
}

impl FavoritesStore {
    pub fn load(state_dir: StateDir) -> Self {
        let entries: BTreeMap<String, FavoriteEntry> = state_dir.load_or_default(FAVORITES_FILE);
        Self {
            state_dir,
            entries: Mutex::new(entries),
        }
    }

    pub fn is_favorite(&self, model_id: &str) -> bool {
        self.lock().contains_key(model_id)
    }

    /// Stars or unstars a model; returns whether it is starred afterwards
    pub fn toggle(&self, model_id: &str) -> bool {
        let starred = {
            let mut entries = self.lock();
            if entries.remove(model_id).is_some() {
                false
            } else {
                entries.insert(
                    model_id.to_string(),
                    FavoriteEntry {
                        model_id: model_id.to_string(),
                        note: None,
                        starred_at: Utc::now(),
                    },
                );
                true
            }
        };
        self.persist();
        starred
    }

    /// Attaches a note to a starred model; returns false when not starred
    pub fn set_note(&self, model_id: &str, note: Option<String>) -> bool {
        let updated = {
            let mut entries = self.lock();
            match entries.get_mut(model_id) {
                Some(entry) => {
                    entry.note = note;
                    true
                }
                None => false,
            }
        };
        if updated {
            self.persist();
        }
        updated
    }

    pub fn list(&self) -> Vec<FavoriteEntry> {
        self.lock().values().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, FavoriteEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn persist(&self) {
        let snapshot = self.lock().clone();
        if let Err(e) = self.state_dir.save(FAVORITES_FILE, &snapshot) {
            warn!("could not persist favorites: {}", e);
        }
    }
}
