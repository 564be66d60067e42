//! Model acquisition pipeline
//!
//! A sequential download queue: jobs are enqueued FIFO, exactly one transfer
//! runs at a time, every job walks the
//! `Queued → Downloading → Verifying → Completed` state machine (or exits to
//! `Failed`/`Cancelled`), and every terminal transition is recorded in a
//! bounded history.

pub mod job;
pub mod orchestrator;
pub mod transfer;
pub mod verify;

pub use job::{DownloadJob, ErrorKind, JobId, JobState, ModelRef};
pub use orchestrator::{HistorySink, Orchestrator, OrchestratorError};
pub use transfer::{ArtifactTransfer, CancelFlag, HttpTransfer, RetryPolicy, TransferError};
pub use verify::verify_artifact;
