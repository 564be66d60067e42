//! Append-only catalog store
//!
//! Holds curated entries plus anything merged in from imported packs or
//! remote search. Existing entries are never mutated or removed during a
//! session, so readers may iterate a snapshot concurrently with appends.
//! Insertion order is stable and doubles as the ranker's tie-break.

use super::curated::curated_models;
use super::types::{ModelRecord, RawModelRecord};
use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct CatalogInner {
    records: Vec<Arc<ModelRecord>>,
    ids: HashSet<String>,
}

/// The session catalog
#[derive(Debug, Default)]
pub struct Catalog {
    inner: RwLock<CatalogInner>,
}

impl Catalog {
    /// An empty catalog (tests, custom setups)
    pub fn empty() -> Self {
        Self::default()
    }

    /// A catalog seeded with the curated list
    pub fn with_curated() -> Self {
        let catalog = Self::empty();
        catalog.merge_validated(curated_models());
        catalog
    }

    /// Number of records currently known
    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Looks up a record by id
    pub fn get(&self, id: &str) -> Option<Arc<ModelRecord>> {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .records
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    /// Snapshot of all records in insertion order
    pub fn snapshot(&self) -> Vec<Arc<ModelRecord>> {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .records
            .clone()
    }

    /// Merges already-validated records, skipping ids that are present
    ///
    /// Returns the number of records actually added.
    pub fn merge_validated(&self, records: Vec<ModelRecord>) -> usize {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let mut added = 0;
        for record in records {
            if inner.ids.contains(&record.id) {
                debug!("catalog already has '{}', keeping existing entry", record.id);
                continue;
            }
            inner.ids.insert(record.id.clone());
            inner.records.push(Arc::new(record));
            added += 1;
        }
        added
    }

    /// Validates and merges raw records (imported packs, search results)
    ///
    /// Malformed entries are logged and skipped; the rest merge normally.
    /// Returns `(added, skipped)`.
    pub fn merge_raw(&self, raw: Vec<RawModelRecord>) -> (usize, usize) {
        let mut valid = Vec::new();
        let mut skipped = 0;
        for entry in raw {
            match entry.validate() {
                Ok(record) => valid.push(record),
                Err(err) => {
                    warn!("skipping catalog entry: {}", err);
                    skipped += 1;
                }
            }
        }
        (self.merge_validated(valid), skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::types::ModelCategory;

    fn raw(id: &str, size_gb: f64) -> RawModelRecord {
        RawModelRecord {
            id: Some(id.into()),
            name: Some(id.into()),
            size_gb,
            score: 50,
            category: Some(ModelCategory::GeneralPurpose),
            ..Default::default()
        }
    }

    #[test]
    fn test_curated_seed() {
        let catalog = Catalog::with_curated();
        assert!(!catalog.is_empty());
        assert!(catalog.get("qwen3-8b").is_some());
    }

    #[test]
    fn test_merge_skips_existing_ids() {
        let catalog = Catalog::empty();
        assert_eq!(catalog.merge_raw(vec![raw("a", 1.0)]).0, 1);
        // Same id again: the original entry wins, nothing is replaced
        let before = catalog.get("a").unwrap();
        assert_eq!(catalog.merge_raw(vec![raw("a", 9.0)]).0, 0);
        assert_eq!(catalog.get("a").unwrap().size_gb, before.size_gb);
    }

    #[test]
    fn test_merge_raw_skips_malformed_and_keeps_rest() {
        let catalog = Catalog::empty();
        let (added, skipped) =
            catalog.merge_raw(vec![raw("good", 4.0), raw("bad", 0.0), raw("also-good", 2.0)]);
        assert_eq!(added, 2);
        assert_eq!(skipped, 1);
        assert!(catalog.get("bad").is_none());
    }

    #[test]
    fn test_snapshot_preserves_insertion_order() {
        let catalog = Catalog::empty();
        catalog.merge_raw(vec![raw("first", 1.0), raw("second", 2.0)]);
        catalog.merge_raw(vec![raw("third", 3.0)]);
        let ids: Vec<_> = catalog.snapshot().iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }
}
