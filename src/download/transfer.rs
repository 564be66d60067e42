//! Artifact transfer: streaming HTTP fetch with cancellation and retry
//!
//! The orchestrator consumes transfer as a capability so tests can substitute
//! an in-memory implementation. The bundled [`HttpTransfer`] streams to a
//! `.part` file and renames into place only on success, so a crash or cancel
//! never leaves a plausible-looking artifact behind.

use async_trait::async_trait;
use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Bounded retry policy for transient network failures.
///
/// Chosen per the documented policy: 3 attempts total, exponential backoff
/// starting at 1 second (1s, 2s between attempts).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Progress callback: (bytes_done, bytes_total if known)
pub type ProgressFn<'a> = &'a (dyn Fn(u64, Option<u64>) + Send + Sync);

/// Cooperative cancellation flag shared between the orchestrator and an
/// in-flight transfer
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Transfer failures, classified for retry handling
#[derive(Debug, Error)]
pub enum TransferError {
    /// Transient network problem; eligible for retry
    #[error("network error: {0}")]
    Network(String),

    /// Disk-space or permission problem; never retried
    #[error("storage error: {0}")]
    Storage(String),

    /// The cancel flag was raised mid-transfer
    #[error("transfer cancelled")]
    Cancelled,
}

impl TransferError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransferError::Network(_))
    }
}

/// Moves bytes from a source URL to a destination path
#[async_trait]
pub trait ArtifactTransfer: Send + Sync {
    /// Streams the artifact to `dest`, reporting progress as it goes
    ///
    /// Returns the number of bytes written. Implementations must check the
    /// cancel flag regularly and return [`TransferError::Cancelled`] with no
    /// partial file left at `dest`.
    async fn fetch(
        &self,
        url: &str,
        dest: &Path,
        progress: ProgressFn<'_>,
        cancel: &CancelFlag,
    ) -> Result<u64, TransferError>;
}

/// Retry schedule for transient failures
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Backoff before the given retry (1-based): doubles each time
    pub fn backoff_for(&self, retry: u32) -> Duration {
        self.initial_backoff * 2u32.saturating_pow(retry.saturating_sub(1))
    }
}

/// Runs a transfer with bounded retries on transient failures
///
/// Storage errors and cancellation abort immediately; network errors retry
/// up to `policy.max_attempts` total attempts with exponential backoff. When
/// the attempts are exhausted the last network error is returned and the
/// caller records `NetworkExhausted`.
pub async fn fetch_with_retry(
    transfer: &dyn ArtifactTransfer,
    url: &str,
    dest: &Path,
    policy: RetryPolicy,
    progress: ProgressFn<'_>,
    cancel: &CancelFlag,
) -> Result<u64, TransferError> {
    let mut attempt = 1;
    loop {
        match transfer.fetch(url, dest, progress, cancel).await {
            Ok(bytes) => return Ok(bytes),
            Err(err) if err.is_retryable() && attempt < policy.max_attempts => {
                let backoff = policy.backoff_for(attempt);
                warn!(
                    "transfer attempt {}/{} failed ({}), retrying in {:?}",
                    attempt, policy.max_attempts, err, backoff
                );
                tokio::time::sleep(backoff).await;
                if cancel.is_cancelled() {
                    return Err(TransferError::Cancelled);
                }
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Streaming HTTP implementation
pub struct HttpTransfer {
    http_client: reqwest::Client,
}

impl HttpTransfer {
    pub fn new() -> Self {
        Self {
            http_client: reqwest::Client::new(),
        }
    }

    fn part_path(dest: &Path) -> PathBuf {
        let mut name = dest.as_os_str().to_os_string();
        name.push(".part");
        PathBuf::from(name)
    }

    async fn remove_quietly(path: &Path) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                debug!("could not remove {}: {}", path.display(), e);
            }
        }
    }
}

impl Default for HttpTransfer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArtifactTransfer for HttpTransfer {
    async fn fetch(
        &self,
        url: &str,
        dest: &Path,
        progress: ProgressFn<'_>,
        cancel: &CancelFlag,
    ) -> Result<u64, TransferError> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| TransferError::Storage(e.to_string()))?;
        }

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| TransferError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(TransferError::Network(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        let total = response.content_length();
        let part = Self::part_path(dest);
        let mut file = tokio::fs::File::create(&part)
            .await
            .map_err(|e| TransferError::Storage(e.to_string()))?;

        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            if cancel.is_cancelled() {
                drop(file);
                Self::remove_quietly(&part).await;
                return Err(TransferError::Cancelled);
            }
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    drop(file);
                    Self::remove_quietly(&part).await;
                    return Err(TransferError::Network(e.to_string()));
                }
            };
            if let Err(e) = file.write_all(&chunk).await {
                drop(file);
                Self::remove_quietly(&part).await;
                return Err(TransferError::Storage(e.to_string()));
            }
            downloaded += chunk.len() as u64;
            progress(downloaded, total);
        }

        file.flush()
            .await
            .map_err(|e| TransferError::Storage(e.to_string()))?;
        drop(file);

        tokio::fs::rename(&part, dest)
            .await
            .map_err(|e| TransferError::Storage(e.to_string()))?;

        debug!("fetched {} bytes to {}", downloaded, dest.display());
        Ok(downloaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Transfer double that fails a configurable number of times before
    /// succeeding
    struct FlakyTransfer {
        failures_left: Mutex<u32>,
        payload: Vec<u8>,
    }

    #[async_trait]
    impl ArtifactTransfer for FlakyTransfer {
        async fn fetch(
            &self,
            _url: &str,
            dest: &Path,
            progress: ProgressFn<'_>,
            _cancel: &CancelFlag,
        ) -> Result<u64, TransferError> {
            {
                let mut left = self.failures_left.lock().unwrap();
                if *left > 0 {
                    *left -= 1;
                    return Err(TransferError::Network("simulated blip".into()));
                }
            }
            tokio::fs::write(dest, &self.payload)
                .await
                .map_err(|e| TransferError::Storage(e.to_string()))?;
            progress(self.payload.len() as u64, Some(self.payload.len() as u64));
            Ok(self.payload.len() as u64)
        }
    }

    fn policy_fast() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(5),
        }
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_for(1), Duration::from_secs(1));
        assert_eq!(policy.backoff_for(2), Duration::from_secs(2));
        assert_eq!(policy.backoff_for(3), Duration::from_secs(4));
    }

    #[test]
    fn test_error_classification() {
        assert!(TransferError::Network("x".into()).is_retryable());
        assert!(!TransferError::Storage("x".into()).is_retryable());
        assert!(!TransferError::Cancelled.is_retryable());
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_failures() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("model.gguf");
        let transfer = FlakyTransfer {
            failures_left: Mutex::new(2),
            payload: vec![7u8; 64],
        };

        let bytes = fetch_with_retry(
            &transfer,
            "http://example/m",
            &dest,
            policy_fast(),
            &|_, _| {},
            &CancelFlag::new(),
        )
        .await
        .unwrap();
        assert_eq!(bytes, 64);
        assert!(dest.exists());
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_cap() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("model.gguf");
        let transfer = FlakyTransfer {
            failures_left: Mutex::new(10),
            payload: vec![],
        };

        let err = fetch_with_retry(
            &transfer,
            "http://example/m",
            &dest,
            policy_fast(),
            &|_, _| {},
            &CancelFlag::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, TransferError::Network(_)));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_storage_error_is_not_retried() {
        struct AlwaysStorage {
            calls: Mutex<u32>,
        }

        #[async_trait]
        impl ArtifactTransfer for AlwaysStorage {
            async fn fetch(
                &self,
                _url: &str,
                _dest: &Path,
                _progress: ProgressFn<'_>,
                _cancel: &CancelFlag,
            ) -> Result<u64, TransferError> {
                *self.calls.lock().unwrap() += 1;
                Err(TransferError::Storage("disk full".into()))
            }
        }

        let transfer = AlwaysStorage {
            calls: Mutex::new(0),
        };
        let err = fetch_with_retry(
            &transfer,
            "http://example/m",
            Path::new("/tmp/x"),
            policy_fast(),
            &|_, _| {},
            &CancelFlag::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, TransferError::Storage(_)));
        assert_eq!(*transfer.calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_http_transfer_part_path() {
        let dest = Path::new("/models/m.gguf");
        assert_eq!(
            HttpTransfer::part_path(dest),
            PathBuf::from("/models/m.gguf.part")
        );
    }

    #[tokio::test]
    async fn test_http_transfer_unreachable_is_network_error() {
        let dir = tempfile::tempdir().unwrap();
        let transfer = HttpTransfer::new();
        let err = transfer
            .fetch(
                "http://localhost:59997/m.gguf",
                &dir.path().join("m.gguf"),
                &|_, _| {},
                &CancelFlag::new(),
            )
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }
}
