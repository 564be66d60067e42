//! Engine facade
//!
//! One explicit handle owning every component: hardware snapshot cell,
//! catalog, download orchestrator, registration targets and the persisted
//! stores. Nothing here is a module-level singleton; the CLI (or any other
//! presentation layer) constructs an [`Engine`] and calls it.

use crate::assess::{assess, rank, AssessError, FitAssessment, RankedModel};
use crate::bench::{BenchError, BenchmarkResult, BenchmarkRunner, runner::DEFAULT_PROMPT};
use crate::catalog::{
    Catalog, CatalogSearch, GgufFile, HuggingFaceSearch, RawModelRecord, SearchError, SearchHit,
    UseCase,
};
use crate::config::{EngineConfig, Settings};
use crate::download::{
    ArtifactTransfer, DownloadJob, HttpTransfer, JobId, ModelRef, Orchestrator,
    OrchestratorError, RetryPolicy,
};
use crate::hardware::{HardwareProbe, HardwareSnapshot, SnapshotCell, SystemProbe};
use crate::integrate::{
    register, LmStudioTool, OllamaTool, RegistrationOutcome, RegistrarError, RuntimeTool,
};
use crate::persist::store::PACKS_FILE;
use crate::persist::{
    BenchHistoryStore, DownloadHistoryStore, FavoriteEntry, FavoritesStore, PersistError,
    StateDir, UpdateManifestStore,
};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Engine call errors
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown model '{0}'")]
    UnknownModel(String),

    #[error("model '{0}' has no direct download source; pull it through a runtime instead")]
    NotDownloadable(String),

    #[error("unknown runtime tool '{0}'")]
    UnknownTool(String),

    #[error(transparent)]
    Assess(#[from] AssessError),

    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),

    #[error(transparent)]
    Registrar(#[from] RegistrarError),

    #[error(transparent)]
    Bench(#[from] BenchError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// The assembled engine
pub struct Engine {
    config: EngineConfig,
    settings: Mutex<Settings>,
    probe: Arc<dyn HardwareProbe>,
    snapshot: SnapshotCell,
    catalog: Catalog,
    orchestrator: Orchestrator,
    download_history: Arc<DownloadHistoryStore>,
    favorites: FavoritesStore,
    bench_history: BenchHistoryStore,
    manifest: UpdateManifestStore,
    bench_runner: BenchmarkRunner,
    search: Arc<dyn CatalogSearch>,
    tools: Vec<Arc<dyn RuntimeTool>>,
}

impl Engine {
    /// Builds the engine with the default collaborators
    pub async fn init(config: EngineConfig) -> Self {
        let tools: Vec<Arc<dyn RuntimeTool>> = {
            let mut tools: Vec<Arc<dyn RuntimeTool>> = vec![Arc::new(OllamaTool::new())];
            if let Some(lmstudio) = LmStudioTool::new() {
                tools.push(Arc::new(lmstudio));
            }
            tools
        };
        Self::init_with(
            config,
            Arc::new(HttpTransfer::new()),
            Arc::new(SystemProbe::new()),
            Arc::new(HuggingFaceSearch::new()),
            tools,
        )
        .await
    }

    /// Builds the engine with explicit collaborators (tests, embedding)
    pub async fn init_with(
        config: EngineConfig,
        transfer: Arc<dyn ArtifactTransfer>,
        probe: Arc<dyn HardwareProbe>,
        search: Arc<dyn CatalogSearch>,
        tools: Vec<Arc<dyn RuntimeTool>>,
    ) -> Self {
        let state_dir = config.state_dir.clone();
        let settings = Settings::load(&state_dir);
        let snapshot = SnapshotCell::new(probe.probe().await);

        let catalog = Catalog::with_curated();
        Self::merge_packs(&catalog, &state_dir);

        let download_history = Arc::new(DownloadHistoryStore::load(state_dir.clone()));
        let orchestrator = Orchestrator::start(
            transfer,
            config.download_dir.clone(),
            RetryPolicy::default(),
            Some(download_history.clone()),
        );
        orchestrator.preload_history(download_history.list());

        let bench_runner = BenchmarkRunner::with_endpoint(
            config.ollama_endpoint.clone(),
            Duration::from_secs(120),
        );

        Self {
            settings: Mutex::new(settings),
            probe,
            snapshot,
            catalog,
            orchestrator,
            download_history,
            favorites: FavoritesStore::load(state_dir.clone()),
            bench_history: BenchHistoryStore::load(state_dir.clone()),
            manifest: UpdateManifestStore::load(state_dir),
            bench_runner,
            search,
            tools,
            config,
        }
    }

    fn merge_packs(catalog: &Catalog, state_dir: &StateDir) {
        let packs: BTreeMap<String, Vec<RawModelRecord>> = state_dir.load_or_default(PACKS_FILE);
        for (name, records) in packs {
            let (added, skipped) = catalog.merge_raw(records);
            info!("pack '{}': merged {} records ({} skipped)", name, added, skipped);
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ----- hardware -----

    /// Current hardware snapshot
    pub fn hardware(&self) -> Arc<HardwareSnapshot> {
        self.snapshot.load()
    }

    /// Re-probes the hardware and atomically swaps the snapshot
    pub async fn refresh_hardware(&self) -> Arc<HardwareSnapshot> {
        let fresh = self.probe.probe().await;
        self.snapshot.replace(fresh);
        self.snapshot.load()
    }

    // ----- catalog & assessment -----

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Fit assessment for one catalog model against current hardware
    pub fn assess_model(&self, model_id: &str) -> Result<FitAssessment, EngineError> {
        let record = self
            .catalog
            .get(model_id)
            .ok_or_else(|| EngineError::UnknownModel(model_id.to_string()))?;
        Ok(assess(&self.hardware(), &record)?)
    }

    /// Ranked recommendations for the given use cases
    pub fn recommend(&self, use_cases: &[UseCase], limit: Option<usize>) -> Vec<RankedModel> {
        rank(&self.hardware(), &self.catalog, use_cases, limit)
    }

    // ----- downloads -----

    /// Queues a catalog model for download
    pub fn enqueue_download(&self, model_id: &str) -> Result<JobId, EngineError> {
        let record = self
            .catalog
            .get(model_id)
            .ok_or_else(|| EngineError::UnknownModel(model_id.to_string()))?;
        let model_ref = ModelRef::from_record(&record)
            .ok_or_else(|| EngineError::NotDownloadable(model_id.to_string()))?;

        match self.assess_model(model_id) {
            Ok(a) if !a.fits => warn!(
                "'{}' ({:.1} GB) exceeds usable capacity; download proceeds but expect offloading",
                record.name, record.size_gb
            ),
            _ => {}
        }

        Ok(self.orchestrator.enqueue(model_ref)?)
    }

    pub fn cancel_download(&self, job_id: JobId) -> Result<(), EngineError> {
        Ok(self.orchestrator.cancel(job_id)?)
    }

    pub fn job(&self, job_id: JobId) -> Option<DownloadJob> {
        self.orchestrator.job(job_id)
    }

    pub fn jobs(&self) -> Vec<DownloadJob> {
        self.orchestrator.jobs()
    }

    pub fn download_history(&self) -> Vec<DownloadJob> {
        self.orchestrator.history()
    }

    // ----- registration -----

    pub fn tools(&self) -> &[Arc<dyn RuntimeTool>] {
        &self.tools
    }

    /// Registers a completed download with the named tools (all when empty)
    ///
    /// Partial failure stays per-target; successful registrations are
    /// recorded in the update manifest.
    pub async fn register_download(
        &self,
        job_id: JobId,
        tool_names: &[String],
    ) -> Result<Vec<RegistrationOutcome>, EngineError> {
        let job = self
            .orchestrator
            .job(job_id)
            .ok_or(OrchestratorError::UnknownJob(job_id))?;

        let targets: Vec<Arc<dyn RuntimeTool>> = if tool_names.is_empty() {
            self.tools.clone()
        } else {
            let mut selected = Vec::with_capacity(tool_names.len());
            for name in tool_names {
                let tool = self
                    .tools
                    .iter()
                    .find(|t| t.name() == name)
                    .ok_or_else(|| EngineError::UnknownTool(name.clone()))?;
                selected.push(tool.clone());
            }
            selected
        };

        let outcomes = register(&job, &targets).await?;

        if outcomes.iter().any(|o| o.result.is_ok()) {
            self.manifest.record(
                &job.model_ref.model_id,
                &job.model_ref.source_repo,
                job.target_path.clone(),
            );
        }
        Ok(outcomes)
    }

    pub fn update_manifest(&self) -> Vec<(String, crate::persist::ManifestEntry)> {
        self.manifest.list()
    }

    // ----- benchmarks -----

    /// Runs a benchmark and records the result
    pub async fn benchmark(
        &self,
        model: &str,
        prompt: Option<&str>,
    ) -> Result<BenchmarkResult, EngineError> {
        let result = self
            .bench_runner
            .run(model, prompt.unwrap_or(DEFAULT_PROMPT))
            .await?;
        self.bench_history.record(result.clone());
        Ok(result)
    }

    pub async fn runtime_models(&self) -> Result<Vec<String>, EngineError> {
        Ok(self.bench_runner.health_check().await?)
    }

    pub fn bench_history(&self) -> Vec<BenchmarkResult> {
        self.bench_history.list()
    }

    // ----- favorites -----

    pub fn toggle_favorite(&self, model_id: &str) -> Result<bool, EngineError> {
        if self.catalog.get(model_id).is_none() {
            return Err(EngineError::UnknownModel(model_id.to_string()));
        }
        Ok(self.favorites.toggle(model_id))
    }

    pub fn set_favorite_note(&self, model_id: &str, note: Option<String>) -> bool {
        self.favorites.set_note(model_id, note)
    }

    pub fn favorites(&self) -> Vec<FavoriteEntry> {
        self.favorites.list()
    }

    // ----- search & packs -----

    pub async fn search_models(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchHit>, EngineError> {
        Ok(self.search.search(query, limit).await?)
    }

    pub async fn search_files(&self, repo_id: &str) -> Result<Vec<GgufFile>, EngineError> {
        Ok(self.search.list_files(repo_id).await?)
    }

    /// Imports one search result into the catalog and the persisted packs
    pub async fn import_search_result(
        &self,
        repo_id: &str,
        file_name: &str,
    ) -> Result<String, EngineError> {
        let files = self.search.list_files(repo_id).await?;
        let file = files
            .into_iter()
            .find(|f| f.name == file_name)
            .ok_or_else(|| SearchError::Parse(format!("no file '{}' in {}", file_name, repo_id)))?;

        let raw = crate::catalog::search::record_from_search(repo_id, &file);
        let id = raw.id.clone().unwrap_or_default();
        self.import_pack("search-imports", vec![raw])?;
        Ok(id)
    }

    /// Merges a named pack into the catalog and persists it
    pub fn import_pack(
        &self,
        name: &str,
        records: Vec<RawModelRecord>,
    ) -> Result<(usize, usize), EngineError> {
        let mut packs: BTreeMap<String, Vec<RawModelRecord>> =
            self.config.state_dir.load_or_default(PACKS_FILE);
        packs
            .entry(name.to_string())
            .or_default()
            .extend(records.clone());
        self.config.state_dir.save(PACKS_FILE, &packs)?;

        Ok(self.catalog.merge_raw(records))
    }

    // ----- settings -----

    pub fn settings(&self) -> Settings {
        self.settings.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn update_settings<F: FnOnce(&mut Settings)>(&self, apply: F) -> Result<(), EngineError> {
        let snapshot = {
            let mut settings = self.settings.lock().unwrap_or_else(|e| e.into_inner());
            apply(&mut settings);
            settings.clone()
        };
        snapshot.save(&self.config.state_dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_engine(dir: &tempfile::TempDir) -> Engine {
        let config = EngineConfig {
            state_dir: StateDir::at(dir.path().join("state")),
            download_dir: dir.path().join("models"),
            ollama_endpoint: "http://localhost:59995".into(),
            request_timeout_secs: 5,
            log_level: "info".into(),
        };
        Engine::init(config).await
    }

    #[tokio::test]
    async fn test_enqueue_unknown_model() {
        let dir = tempfile::tempdir().unwrap();
        let engine = test_engine(&dir).await;
        let err = engine.enqueue_download("no-such-model").unwrap_err();
        assert!(matches!(err, EngineError::UnknownModel(_)));
    }

    #[tokio::test]
    async fn test_enqueue_sharded_model_is_not_downloadable() {
        let dir = tempfile::tempdir().unwrap();
        let engine = test_engine(&dir).await;
        let err = engine.enqueue_download("qwen3-235b-a22b").unwrap_err();
        assert!(matches!(err, EngineError::NotDownloadable(_)));
    }

    #[tokio::test]
    async fn test_assess_and_recommend_work_on_curated_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let engine = test_engine(&dir).await;

        let assessment = engine.assess_model("qwen3-8b").unwrap();
        assert_eq!(assessment.model_id, "qwen3-8b");

        let ranked = engine.recommend(&[UseCase::Coding], Some(5));
        assert!(!ranked.is_empty());
        assert!(ranked.len() <= 5);
    }

    #[tokio::test]
    async fn test_favorites_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let engine = test_engine(&dir).await;

        assert!(engine.toggle_favorite("qwen3-8b").unwrap());
        assert_eq!(engine.favorites().len(), 1);
        assert!(engine.toggle_favorite("nope").is_err());
        assert!(!engine.toggle_favorite("qwen3-8b").unwrap());
        assert!(engine.favorites().is_empty());
    }

    #[tokio::test]
    async fn test_import_pack_merges_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let engine = test_engine(&dir).await;
        let before = engine.catalog().len();

        let record = RawModelRecord {
            id: Some("pack-model".into()),
            name: Some("Pack Model".into()),
            size_gb: 3.0,
            score: 60,
            category: Some(crate::catalog::ModelCategory::Coding),
            ..Default::default()
        };
        let (added, skipped) = engine.import_pack("my-pack", vec![record]).unwrap();
        assert_eq!((added, skipped), (1, 0));
        assert_eq!(engine.catalog().len(), before + 1);

        // A fresh engine on the same state dir sees the pack again
        let engine2 = test_engine(&dir).await;
        assert!(engine2.catalog().get("pack-model").is_some());
    }

    #[tokio::test]
    async fn test_settings_persist() {
        let dir = tempfile::tempdir().unwrap();
        let engine = test_engine(&dir).await;
        engine
            .update_settings(|s| {
                s.onboarding_done = true;
                s.theme = "OLED Black".into();
            })
            .unwrap();

        let engine2 = test_engine(&dir).await;
        assert!(engine2.settings().onboarding_done);
        assert_eq!(engine2.settings().theme, "OLED Black");
    }
}
