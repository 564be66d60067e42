//! Sequential download orchestrator
//!
//! Owns every [`DownloadJob`]. A single worker task drains the queue in
//! enqueue order, so the "at most one job Downloading" invariant is
//! structural rather than policed. Queue edits (enqueue, cancel of queued
//! jobs) only take a short-lived lock and never wait on the in-flight
//! transfer; observers read cloned job snapshots the same way.
//!
//! Every terminal transition appends an immutable record to a bounded
//! history and forwards it to an optional [`HistorySink`] for persistence.

use super::job::{DownloadJob, ErrorKind, JobId, JobState, ModelRef};
use super::transfer::{fetch_with_retry, ArtifactTransfer, CancelFlag, RetryPolicy, TransferError};
use super::verify::verify_artifact;
use chrono::Utc;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

/// Terminal records kept in memory (and mirrored to the sink)
pub const HISTORY_LIMIT: usize = 50;

/// Orchestrator call errors
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The model already has a job that has not reached a terminal state
    #[error("model '{0}' already has an active download job")]
    DuplicateActiveJob(String),

    #[error("unknown job {0}")]
    UnknownJob(JobId),

    /// The job is not in a state the requested operation applies to
    #[error("job {job_id} is {state}, cannot {operation}")]
    InvalidState {
        job_id: JobId,
        state: JobState,
        operation: &'static str,
    },
}

/// Receives every terminal job record, e.g. for JSON persistence
pub trait HistorySink: Send + Sync {
    fn record(&self, job: &DownloadJob);
}

struct Entry {
    job: DownloadJob,
    cancel: CancelFlag,
}

#[derive(Default)]
struct State {
    queue: VecDeque<JobId>,
    jobs: HashMap<JobId, Entry>,
    history: VecDeque<DownloadJob>,
}

struct Inner {
    state: Mutex<State>,
    notify: Notify,
    transfer: Arc<dyn ArtifactTransfer>,
    retry: RetryPolicy,
    download_dir: PathBuf,
    sink: Option<Arc<dyn HistorySink>>,
}

/// Handle to the download queue; cheap to clone
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl Orchestrator {
    /// Creates the orchestrator and starts its worker task
    pub fn start(
        transfer: Arc<dyn ArtifactTransfer>,
        download_dir: PathBuf,
        retry: RetryPolicy,
        sink: Option<Arc<dyn HistorySink>>,
    ) -> Self {
        let inner = Arc::new(Inner {
            state: Mutex::new(State::default()),
            notify: Notify::new(),
            transfer,
            retry,
            download_dir,
            sink,
        });

        tokio::spawn(Inner::worker_loop(inner.clone()));
        Self { inner }
    }

    /// Seeds the history with previously persisted terminal records
    pub fn preload_history(&self, records: Vec<DownloadJob>) {
        let mut state = self.lock();
        for job in records {
            state.history.push_back(job);
        }
        while state.history.len() > HISTORY_LIMIT {
            state.history.pop_front();
        }
    }

    /// Adds a job to the back of the queue
    ///
    /// # Errors
    ///
    /// [`OrchestratorError::DuplicateActiveJob`] when the same model already
    /// has a job that is not yet terminal. No state changes in that case.
    pub fn enqueue(&self, model_ref: ModelRef) -> Result<JobId, OrchestratorError> {
        let target_path = self.inner.download_dir.join(&model_ref.source_file);
        let mut state = self.lock();

        let duplicate = state
            .jobs
            .values()
            .any(|e| e.job.model_ref.model_id == model_ref.model_id && !e.job.state.is_terminal());
        if duplicate {
            return Err(OrchestratorError::DuplicateActiveJob(model_ref.model_id));
        }

        let job = DownloadJob::new(model_ref, target_path);
        let job_id = job.job_id;
        info!("enqueued download {} ({})", job.model_ref.display_name, job_id);

        state.queue.push_back(job_id);
        state.jobs.insert(
            job_id,
            Entry {
                job,
                cancel: CancelFlag::new(),
            },
        );
        drop(state);

        self.inner.notify.notify_one();
        Ok(job_id)
    }

    /// Cancels a job
    ///
    /// A queued job is cancelled immediately. A downloading job has its
    /// transfer stopped cooperatively; the terminal transition is observed
    /// shortly after, once the transfer loop notices the flag. Verifying and
    /// terminal jobs cannot be cancelled.
    pub fn cancel(&self, job_id: JobId) -> Result<(), OrchestratorError> {
        let mut state = self.lock();
        let (job_state, cancel) = {
            let entry = state
                .jobs
                .get(&job_id)
                .ok_or(OrchestratorError::UnknownJob(job_id))?;
            (entry.job.state, entry.cancel.clone())
        };

        match job_state {
            JobState::Queued => {
                state.queue.retain(|id| *id != job_id);
                let record = Self::finish_locked(&mut state, job_id, JobState::Cancelled, None);
                drop(state);
                self.emit(record);
                Ok(())
            }
            JobState::Downloading => {
                cancel.cancel();
                debug!("cancel requested for in-flight job {}", job_id);
                Ok(())
            }
            state_now => Err(OrchestratorError::InvalidState {
                job_id,
                state: state_now,
                operation: "cancel",
            }),
        }
    }

    /// Snapshot of one job
    pub fn job(&self, job_id: JobId) -> Option<DownloadJob> {
        self.lock().jobs.get(&job_id).map(|e| e.job.clone())
    }

    /// Snapshots of all known jobs, oldest first
    pub fn jobs(&self) -> Vec<DownloadJob> {
        let mut jobs: Vec<_> = self.lock().jobs.values().map(|e| e.job.clone()).collect();
        jobs.sort_by_key(|j| j.created_at);
        jobs
    }

    /// Terminal records, oldest first
    pub fn history(&self) -> Vec<DownloadJob> {
        self.lock().history.iter().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, record: Option<DownloadJob>) {
        if let (Some(record), Some(sink)) = (record, &self.inner.sink) {
            sink.record(&record);
        }
    }

    /// Applies a terminal transition and appends to the bounded history.
    /// Returns the record for sink forwarding, or None if the transition
    /// was not legal (already terminal).
    fn finish_locked(
        state: &mut State,
        job_id: JobId,
        terminal: JobState,
        error: Option<ErrorKind>,
    ) -> Option<DownloadJob> {
        let entry = state.jobs.get_mut(&job_id)?;
        if !entry.job.state.can_transition_to(terminal) {
            warn!(
                "ignoring illegal transition {} -> {} for job {}",
                entry.job.state, terminal, job_id
            );
            return None;
        }
        entry.job.state = terminal;
        entry.job.error = error;
        entry.job.completed_at = Some(Utc::now());

        let record = entry.job.clone();
        state.history.push_back(record.clone());
        while state.history.len() > HISTORY_LIMIT {
            state.history.pop_front();
        }
        Some(record)
    }
}

impl Inner {
    async fn worker_loop(inner: Arc<Inner>) {
        loop {
            // Arm the notification before checking the queue so an enqueue
            // racing with the check cannot be missed.
            let notified = inner.notify.notified();
            match Self::take_next(&inner) {
                Some(job_id) => Self::run_job(&inner, job_id).await,
                None => notified.await,
            }
        }
    }

    /// Pops the next queued job and moves it to Downloading
    fn take_next(inner: &Arc<Inner>) -> Option<JobId> {
        let mut state = inner.state.lock().unwrap_or_else(|e| e.into_inner());
        while let Some(job_id) = state.queue.pop_front() {
            if let Some(entry) = state.jobs.get_mut(&job_id) {
                if entry.job.state == JobState::Queued {
                    entry.job.state = JobState::Downloading;
                    return Some(job_id);
                }
            }
        }
        None
    }

    async fn run_job(inner: &Arc<Inner>, job_id: JobId) {
        let (model_ref, target_path, cancel) = {
            let state = inner.state.lock().unwrap_or_else(|e| e.into_inner());
            let entry = match state.jobs.get(&job_id) {
                Some(entry) => entry,
                None => return,
            };
            (
                entry.job.model_ref.clone(),
                entry.job.target_path.clone(),
                entry.cancel.clone(),
            )
        };

        info!(
            "starting download of {} -> {}",
            model_ref.display_name,
            target_path.display()
        );

        // The transfer runs in its own task so an unexpected panic is
        // contained at the job boundary instead of taking the worker down.
        let task_inner = inner.clone();
        let task_cancel = cancel.clone();
        let task_target = target_path.clone();
        let task_ref = model_ref.clone();
        let handle = tokio::spawn(async move {
            let url = task_ref.download_url();
            let progress = |done: u64, total: Option<u64>| {
                Self::update_progress(&task_inner, job_id, done, total);
            };
            fetch_with_retry(
                task_inner.transfer.as_ref(),
                &url,
                &task_target,
                task_inner.retry,
                &progress,
                &task_cancel,
            )
            .await
        });

        let outcome = match handle.await {
            Ok(result) => result,
            Err(join_err) => {
                error!("transfer task for job {} aborted: {}", job_id, join_err);
                Self::finish(inner, job_id, JobState::Failed, Some(ErrorKind::InternalError));
                return;
            }
        };

        match outcome {
            Ok(transferred) => {
                {
                    let mut state = inner.state.lock().unwrap_or_else(|e| e.into_inner());
                    if let Some(entry) = state.jobs.get_mut(&job_id) {
                        entry.job.state = JobState::Verifying;
                    }
                }
                match verify_artifact(
                    &target_path,
                    transferred,
                    model_ref.size_gb,
                    model_ref.sha256.as_deref(),
                )
                .await
                {
                    Ok(()) => {
                        info!("download of {} completed and verified", model_ref.display_name);
                        Self::finish(inner, job_id, JobState::Completed, None);
                    }
                    Err(err) => {
                        warn!(
                            "verification failed for {}: {}, removing artifact",
                            model_ref.display_name, err
                        );
                        let _ = tokio::fs::remove_file(&target_path).await;
                        Self::finish(
                            inner,
                            job_id,
                            JobState::Failed,
                            Some(ErrorKind::IntegrityMismatch),
                        );
                    }
                }
            }
            Err(TransferError::Cancelled) => {
                info!("download of {} cancelled", model_ref.display_name);
                Self::finish(inner, job_id, JobState::Cancelled, None);
            }
            Err(TransferError::Network(msg)) => {
                warn!("download of {} failed: {}", model_ref.display_name, msg);
                Self::finish(
                    inner,
                    job_id,
                    JobState::Failed,
                    Some(ErrorKind::NetworkExhausted),
                );
            }
            Err(TransferError::Storage(msg)) => {
                error!("download of {} failed: {}", model_ref.display_name, msg);
                Self::finish(inner, job_id, JobState::Failed, Some(ErrorKind::Storage));
            }
        }
    }

    fn update_progress(inner: &Arc<Inner>, job_id: JobId, done: u64, total: Option<u64>) {
        let mut state = inner.state.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = state.jobs.get_mut(&job_id) {
            // bytes_done only ever moves forward, even across retries
            entry.job.bytes_done = entry.job.bytes_done.max(done);
            if let Some(total) = total {
                entry.job.bytes_total = total;
            }
        }
    }

    fn finish(inner: &Arc<Inner>, job_id: JobId, terminal: JobState, error: Option<ErrorKind>) {
        let record = {
            let mut state = inner.state.lock().unwrap_or_else(|e| e.into_inner());
            Orchestrator::finish_locked(&mut state, job_id, terminal, error)
        };
        if let (Some(record), Some(sink)) = (record, &inner.sink) {
            sink.record(&record);
        }
    }
}
