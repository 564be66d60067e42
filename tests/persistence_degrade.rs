//! Startup resilience: one corrupt state document must not take down the rest

use async_trait::async_trait;
use modelcompass::catalog::{CatalogSearch, GgufFile, SearchError, SearchHit};
use modelcompass::config::EngineConfig;
use modelcompass::download::{ArtifactTransfer, CancelFlag, TransferError};
use modelcompass::engine::Engine;
use modelcompass::hardware::{HardwareProbe, HardwareSnapshot};
use modelcompass::persist::StateDir;
use std::path::Path;
use std::sync::Arc;

struct CpuProbe;

#[async_trait]
impl HardwareProbe for CpuProbe {
    async fn probe(&self) -> HardwareSnapshot {
        HardwareSnapshot::cpu_only(16 * 1024 * 1024 * 1024, "cpu".into(), 8)
    }
}

struct NoTransfer;

#[async_trait]
impl ArtifactTransfer for NoTransfer {
    async fn fetch(
        &self,
        _url: &str,
        _dest: &Path,
        _progress: &(dyn Fn(u64, Option<u64>) + Send + Sync),
        _cancel: &CancelFlag,
    ) -> Result<u64, TransferError> {
        Err(TransferError::Network("offline".into()))
    }
}

struct NoSearch;

#[async_trait]
impl CatalogSearch for NoSearch {
    async fn search(&self, _q: &str, _l: usize) -> Result<Vec<SearchHit>, SearchError> {
        Ok(vec![])
    }

    async fn list_files(&self, _r: &str) -> Result<Vec<GgufFile>, SearchError> {
        Ok(vec![])
    }
}

async fn engine_at(root: &Path) -> Engine {
    let config = EngineConfig {
        state_dir: StateDir::at(root.to_path_buf()),
        download_dir: root.join("models"),
        ollama_endpoint: "http://localhost:59992".into(),
        request_timeout_secs: 5,
        log_level: "info".into(),
    };
    Engine::init_with(
        config,
        Arc::new(NoTransfer),
        Arc::new(CpuProbe),
        Arc::new(NoSearch),
        vec![],
    )
    .await
}

#[tokio::test]
async fn corrupt_favorites_degrade_but_history_loads() {
    let root = tempfile::tempdir().unwrap();

    // Seed valid favorites and settings through a first engine
    {
        let engine = engine_at(root.path()).await;
        engine.toggle_favorite("qwen3-8b").unwrap();
        engine.update_settings(|s| s.onboarding_done = true).unwrap();
    }

    // Corrupt only the favorites document
    std::fs::write(root.path().join("favorites.json"), "{{{ not json").unwrap();

    let engine = engine_at(root.path()).await;
    // Favorites degraded to empty
    assert!(engine.favorites().is_empty());
    // Settings were untouched and still load
    assert!(engine.settings().onboarding_done);
    // The catalog and the rest of the engine are fully functional
    assert!(engine.catalog().len() > 0);
    assert!(engine.assess_model("qwen3-8b").is_ok());
}

#[tokio::test]
async fn every_document_corrupt_still_boots() {
    let root = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(root.path()).unwrap();
    for name in [
        "config.json",
        "favorites.json",
        "history.json",
        "benchmarks.json",
        "update_manifest.json",
        "packs.json",
    ] {
        std::fs::write(root.path().join(name), "corrupt![").unwrap();
    }

    let engine = engine_at(root.path()).await;
    assert!(engine.favorites().is_empty());
    assert!(engine.download_history().is_empty());
    assert!(engine.bench_history().is_empty());
    assert!(engine.update_manifest().is_empty());
    assert!(!engine.settings().onboarding_done);
    // Curated catalog is code, not state: always present
    assert!(engine.catalog().get("qwen3-8b").is_some());
}

#[tokio::test]
async fn cpu_only_snapshot_recommends_small_models_first() {
    let root = tempfile::tempdir().unwrap();
    let engine = engine_at(root.path()).await;

    let ranked = engine.recommend(&[], None);
    assert!(!ranked.is_empty());

    // 16 GB RAM -> 8.8 GB usable: everything that fits precedes everything
    // that does not
    let first_nonfit = ranked
        .iter()
        .position(|r| !r.assessment.fits)
        .unwrap_or(ranked.len());
    assert!(ranked[..first_nonfit].iter().all(|r| r.assessment.fits));
    assert!(ranked[first_nonfit..].iter().all(|r| !r.assessment.fits));
}
