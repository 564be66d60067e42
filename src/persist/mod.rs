//! Per-concern JSON persistence
//!
//! One document per concern (settings, favorites, download history,
//! benchmark history, update manifest, catalog packs), each independently
//! loadable: a missing or corrupt file degrades that concern to its default
//! instead of failing startup.

pub mod favorites;
pub mod history;
pub mod manifest;
pub mod store;

pub use favorites::{FavoriteEntry, FavoritesStore};
pub use history::{BenchHistoryStore, BoundedLog, DownloadHistoryStore, BENCH_HISTORY_LIMIT};
pub use manifest::{ManifestEntry, UpdateManifestStore};
pub use store::{PersistError, StateDir};
