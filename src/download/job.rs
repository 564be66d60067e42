//! Download job entity and its state machine

use crate::catalog::ModelRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Opaque job identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Lifecycle state of a download job
///
/// No state is re-enterable; a failed job is re-queued as a new job with a
/// fresh id, and the failed record stays in history for audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Downloading,
    Verifying,
    Completed,
    Failed,
    Cancelled,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Failed | JobState::Cancelled
        )
    }

    /// Legal forward transitions
    pub fn can_transition_to(&self, next: JobState) -> bool {
        use JobState::*;
        matches!(
            (self, next),
            (Queued, Downloading)
                | (Queued, Cancelled)
                | (Downloading, Verifying)
                | (Downloading, Failed)
                | (Downloading, Cancelled)
                | (Verifying, Completed)
                | (Verifying, Failed)
        )
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            JobState::Queued => "queued",
            JobState::Downloading => "downloading",
            JobState::Verifying => "verifying",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
            JobState::Cancelled => "cancelled",
        };
        write!(f, "{}", label)
    }
}

/// Why a job ended in `Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// All transfer retries exhausted
    NetworkExhausted,
    /// Downloaded artifact did not match the declared size/checksum
    IntegrityMismatch,
    /// Disk-space or permission problem, not retryable
    Storage,
    /// Unexpected fault inside the transfer task
    InternalError,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ErrorKind::NetworkExhausted => "network retries exhausted",
            ErrorKind::IntegrityMismatch => "artifact integrity mismatch",
            ErrorKind::Storage => "storage error",
            ErrorKind::InternalError => "internal error",
        };
        write!(f, "{}", label)
    }
}

/// What to download, resolved from a catalog record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRef {
    pub model_id: String,
    pub display_name: String,
    pub source_repo: String,
    pub source_file: String,
    /// Catalog-declared size, used for verification
    pub size_gb: f64,
    /// Expected sha256, when the catalog carries one
    pub sha256: Option<String>,
}

impl ModelRef {
    /// Builds a reference from a catalog record
    ///
    /// Returns `None` for records without a direct source (sharded releases
    /// that must go through a runtime's own puller).
    pub fn from_record(record: &ModelRecord) -> Option<Self> {
        let repo = record.source_repo.clone()?;
        let file = record.source_file.clone()?;
        Some(Self {
            model_id: record.id.clone(),
            display_name: record.name.clone(),
            source_repo: repo,
            source_file: file,
            size_gb: record.size_gb,
            sha256: record.sha256.clone(),
        })
    }

    /// Direct download URL on the model hub
    pub fn download_url(&self) -> String {
        format!(
            "https://huggingface.co/{}/resolve/main/{}",
            self.source_repo, self.source_file
        )
    }
}

/// A download job owned by the orchestrator
///
/// Observers receive clones; only the orchestrator mutates the original.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadJob {
    pub job_id: JobId,
    pub model_ref: ModelRef,
    pub state: JobState,
    pub bytes_total: u64,
    pub bytes_done: u64,
    pub target_path: PathBuf,
    pub error: Option<ErrorKind>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl DownloadJob {
    pub fn new(model_ref: ModelRef, target_path: PathBuf) -> Self {
        Self {
            job_id: JobId::new(),
            model_ref,
            state: JobState::Queued,
            bytes_total: 0,
            bytes_done: 0,
            target_path,
            error: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Progress in percent, when the total is known
    pub fn percent(&self) -> Option<f64> {
        if self.bytes_total == 0 {
            return None;
        }
        Some(self.bytes_done as f64 / self.bytes_total as f64 * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model_ref() -> ModelRef {
        ModelRef {
            model_id: "m".into(),
            display_name: "M".into(),
            source_repo: "org/repo".into(),
            source_file: "m.gguf".into(),
            size_gb: 5.0,
            sha256: None,
        }
    }

    #[test]
    fn test_happy_path_transitions() {
        use JobState::*;
        assert!(Queued.can_transition_to(Downloading));
        assert!(Downloading.can_transition_to(Verifying));
        assert!(Verifying.can_transition_to(Completed));
    }

    #[test]
    fn test_failure_and_cancel_transitions() {
        use JobState::*;
        assert!(Downloading.can_transition_to(Failed));
        assert!(Verifying.can_transition_to(Failed));
        assert!(Queued.can_transition_to(Cancelled));
        assert!(Downloading.can_transition_to(Cancelled));
        // Queued never fails directly, verification cannot be cancelled
        assert!(!Queued.can_transition_to(Failed));
        assert!(!Verifying.can_transition_to(Cancelled));
    }

    #[test]
    fn test_terminal_states_are_dead_ends() {
        use JobState::*;
        for terminal in [Completed, Failed, Cancelled] {
            assert!(terminal.is_terminal());
            for next in [Queued, Downloading, Verifying, Completed, Failed, Cancelled] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_no_state_is_re_enterable() {
        use JobState::*;
        for state in [Queued, Downloading, Verifying, Completed, Failed, Cancelled] {
            assert!(!state.can_transition_to(state));
        }
    }

    #[test]
    fn test_download_url() {
        assert_eq!(
            model_ref().download_url(),
            "https://huggingface.co/org/repo/resolve/main/m.gguf"
        );
    }

    #[test]
    fn test_percent() {
        let mut job = DownloadJob::new(model_ref(), PathBuf::from("/tmp/m.gguf"));
        assert_eq!(job.percent(), None);
        job.bytes_total = 200;
        job.bytes_done = 50;
        assert_eq!(job.percent(), Some(25.0));
    }

    #[test]
    fn test_fresh_job_ids_differ() {
        let a = DownloadJob::new(model_ref(), PathBuf::from("/tmp/a"));
        let b = DownloadJob::new(model_ref(), PathBuf::from("/tmp/a"));
        assert_ne!(a.job_id, b.job_id);
    }
}
