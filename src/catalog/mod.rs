//! Model catalog: curated records, imported packs and remote search
//!
//! Catalog records are validated into a fixed shape at load time; malformed
//! entries are skipped (never propagated loosely-typed). The catalog itself
//! is append-only per session: search results and packs merge in, curated
//! entries are never mutated in place.

pub mod curated;
pub mod search;
pub mod store;
pub mod types;

pub use search::{CatalogSearch, GgufFile, HuggingFaceSearch, SearchError, SearchHit};
pub use store::Catalog;
pub use types::{CatalogError, ModelCategory, ModelRecord, RawModelRecord, UseCase};
