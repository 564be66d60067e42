//! Bounded, FIFO-evicted history logs

use super::store::StateDir;
use crate::bench::BenchmarkResult;
use crate::download::{DownloadJob, HistorySink};
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::warn;

/// Benchmark records kept (downloads keep 50, owned by the orchestrator)
pub const BENCH_HISTORY_LIMIT: usize = 30;

/// Append-only log that evicts its oldest entry beyond a fixed capacity
///
/// Entries are never re-accessed by recency, so eviction is strictly FIFO.
#[derive(Debug, Clone)]
pub struct BoundedLog<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedLog<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn from_items(items: Vec<T>, capacity: usize) -> Self {
        let mut log = Self::new(capacity);
        for item in items {
            log.push(item);
        }
        log
    }

    pub fn push(&mut self, item: T) {
        self.items.push_back(item);
        while self.items.len() > self.capacity {
            self.items.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

impl<T: Clone> BoundedLog<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}

/// Persisted download history; doubles as the orchestrator's sink
pub struct DownloadHistoryStore {
    state_dir: StateDir,
    log: Mutex<BoundedLog<DownloadJob>>,
}

impl DownloadHistoryStore {
    pub fn load(state_dir: StateDir) -> Self {
        let items: Vec<DownloadJob> =
            state_dir.load_or_default(super::store::DOWNLOAD_HISTORY_FILE);
        Self {
            log: Mutex::new(BoundedLog::from_items(
                items,
                crate::download::orchestrator::HISTORY_LIMIT,
            )),
            state_dir,
        }
    }

    pub fn list(&self) -> Vec<DownloadJob> {
        self.log.lock().unwrap_or_else(|e| e.into_inner()).to_vec()
    }

    fn persist(&self, snapshot: &[DownloadJob]) {
        if let Err(e) = self
            .state_dir
            .save(super::store::DOWNLOAD_HISTORY_FILE, &snapshot)
        {
            warn!("could not persist download history: {}", e);
        }
    }
}

impl HistorySink for DownloadHistoryStore {
    fn record(&self, job: &DownloadJob) {
        let snapshot = {
            let mut log = self.log.lock().unwrap_or_else(|e| e.into_inner());
            log.push(job.clone());
            log.to_vec()
        };
        self.persist(&snapshot);
    }
}

/// Persisted benchmark history
pub struct BenchHistoryStore {
    state_dir: StateDir,
    log: Mutex<BoundedLog<BenchmarkResult>>,
}

impl BenchHistoryStore {
    pub fn load(state_dir: StateDir) -> Self {
        let items: Vec<BenchmarkResult> = state_dir.load_or_default(super::store::BENCHMARKS_FILE);
        Self {
            log: Mutex::new(BoundedLog::from_items(items, BENCH_HISTORY_LIMIT)),
            state_dir,
        }
    }

    pub fn record(&self, result: BenchmarkResult) {
        let snapshot = {
            let mut log = self.log.lock().unwrap_or_else(|e| e.into_inner());
            log.push(result);
            log.to_vec()
        };
        if let Err(e) = self.state_dir.save(super::store::BENCHMARKS_FILE, &snapshot) {
            warn!("could not persist benchmark history: {}", e);
        }
    }

    pub fn list(&self) -> Vec<BenchmarkResult> {
        self.log.lock().unwrap_or_else(|e| e.into_inner()).to_vec()
    }
}
