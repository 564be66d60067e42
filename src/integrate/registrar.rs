//! Runtime tool registration seam

use crate::download::{DownloadJob, JobState};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// What a runtime tool does when a model is registered with it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Writes a manifest/modelfile entry pointing at the artifact
    CreatesManifestEntry,
    /// Copies the artifact into the tool's own model directory
    CopiesArtifact,
}

/// Registration errors
#[derive(Debug, Error)]
pub enum RegistrarError {
    /// Only completed downloads can be registered
    #[error("job is {0}, only completed downloads can be registered")]
    JobNotCompleted(JobState),

    #[error("artifact missing at {0}")]
    ArtifactMissing(String),

    #[error("{tool}: {message}")]
    ToolFailed { tool: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// How a single registration concluded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationStatus {
    Registered,
    /// The target already had this model; nothing was changed
    AlreadyRegistered,
}

/// Successful per-target registration
#[derive(Debug, Clone)]
pub struct Registration {
    pub status: RegistrationStatus,
    /// Human-readable detail, e.g. the destination path or run command
    pub detail: String,
}

/// Per-target result of a register call
#[derive(Debug)]
pub struct RegistrationOutcome {
    pub tool: String,
    pub result: Result<Registration, RegistrarError>,
}

/// A local runtime the engine can hand completed downloads to
#[async_trait]
pub trait RuntimeTool: Send + Sync {
    fn name(&self) -> &str;

    fn capabilities(&self) -> &[Capability];

    /// Registers the artifact under the given model name
    ///
    /// Must be idempotent: registering the same artifact twice leaves the
    /// same on-disk/manifest state as registering it once, reported as
    /// [`RegistrationStatus::AlreadyRegistered`].
    async fn register(
        &self,
        artifact: &Path,
        model_name: &str,
    ) -> Result<Registration, RegistrarError>;
}

/// Registers a completed download with each target
///
/// Targets are attempted independently: one failing never blocks or rolls
/// back the others. The per-target outcomes come back in target order.
///
/// # Errors
///
/// Fails up front (before touching any target) when the job is not
/// `Completed` or its artifact is gone.
pub async fn register(
    job: &DownloadJob,
    targets: &[Arc<dyn RuntimeTool>],
) -> Result<Vec<RegistrationOutcome>, RegistrarError> {
    if job.state != JobState::Completed {
        return Err(RegistrarError::JobNotCompleted(job.state));
    }
    if !job.target_path.exists() {
        return Err(RegistrarError::ArtifactMissing(
            job.target_path.display().to_string(),
        ));
    }

    let model_name = sanitize_model_name(&job.model_ref.display_name);
    let mut outcomes = Vec::with_capacity(targets.len());

    for target in targets {
        let result = target.register(&job.target_path, &model_name).await;
        match &result {
            Ok(reg) => info!("{}: {:?} ({})", target.name(), reg.status, reg.detail),
            Err(err) => warn!("{}: registration failed: {}", target.name(), err),
        }
        outcomes.push(RegistrationOutcome {
            tool: target.name().to_string(),
            result,
        });
    }

    Ok(outcomes)
}

/// Turns a display name into a name runtimes accept
///
/// Lowercase, with spaces and dots collapsed to dashes.
pub fn sanitize_model_name(display_name: &str) -> String {
    display_name
        .to_lowercase()
        .replace([' ', '.'], "-")
}
