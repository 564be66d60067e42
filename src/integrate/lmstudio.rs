//! LM Studio registration target
//!
//! LM Studio discovers models by scanning its models directory, so
//! registration is a copy. An existing destination file of the same size
//! short-circuits, which is what makes re-registration idempotent.

use super::registrar::{
    Capability, Registration, RegistrationStatus, RegistrarError, RuntimeTool,
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const CAPABILITIES: &[Capability] = &[Capability::CopiesArtifact];

/// Subdirectory our imports land in, so users can tell them apart from
/// models LM Studio downloaded itself
const IMPORT_SUBDIR: &str = "modelcompass";

/// Registers models with a local LM Studio install
pub struct LmStudioTool {
    models_dir: PathBuf,
}

impl LmStudioTool {
    /// Uses the conventional per-user LM Studio models directory
    pub fn new() -> Option<Self> {
        let home = dirs::home_dir()?;
        Some(Self::with_models_dir(
            home.join(".cache").join("lm-studio").join("models"),
        ))
    }

    pub fn with_models_dir(models_dir: PathBuf) -> Self {
        Self { models_dir }
    }

    fn destination(&self, artifact: &Path) -> PathBuf {
        let file_name = artifact
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "model.gguf".into());
        self.models_dir.join(IMPORT_SUBDIR).join(file_name)
    }
}

#[async_trait]
impl RuntimeTool for LmStudioTool {
    fn name(&self) -> &str {
        "lmstudio"
    }

    fn capabilities(&self) -> &[Capability] {
        CAPABILITIES
    }

    async fn register(
        &self,
        artifact: &Path,
        _model_name: &str,
    ) -> Result<Registration, RegistrarError> {
        let dest = self.destination(artifact);

        if let (Ok(src_meta), Ok(dst_meta)) = (
            tokio::fs::metadata(artifact).await,
            tokio::fs::metadata(&dest).await,
        ) {
            if src_meta.len() == dst_meta.len() {
                debug!("'{}' already present in LM Studio", dest.display());
                return Ok(Registration {
                    status: RegistrationStatus::AlreadyRegistered,
                    detail: format!("already at {}", dest.display()),
                });
            }
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(artifact, &dest).await?;

        info!("copied artifact into LM Studio at {}", dest.display());
        Ok(Registration {
            status: RegistrationStatus::Registered,
            detail: format!("copied to {}", dest.display()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_copies_artifact() {
        let src_dir = tempfile::tempdir().unwrap();
        let lm_dir = tempfile::tempdir().unwrap();
        let artifact = src_dir.path().join("m.gguf");
        tokio::fs::write(&artifact, b"gguf-bytes").await.unwrap();

        let tool = LmStudioTool::with_models_dir(lm_dir.path().to_path_buf());
        let reg = tool.register(&artifact, "m").await.unwrap();
        assert_eq!(reg.status, RegistrationStatus::Registered);

        let dest = lm_dir.path().join(IMPORT_SUBDIR).join("m.gguf");
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), b"gguf-bytes");
    }

    #[tokio::test]
    async fn test_register_twice_is_idempotent() {
        let src_dir = tempfile::tempdir().unwrap();
        let lm_dir = tempfile::tempdir().unwrap();
        let artifact = src_dir.path().join("m.gguf");
        tokio::fs::write(&artifact, b"gguf-bytes").await.unwrap();

        let tool = LmStudioTool::with_models_dir(lm_dir.path().to_path_buf());
        tool.register(&artifact, "m").await.unwrap();
        let dest = lm_dir.path().join(IMPORT_SUBDIR).join("m.gguf");
        let first_mtime = tokio::fs::metadata(&dest).await.unwrap().modified().unwrap();

        let reg = tool.register(&artifact, "m").await.unwrap();
        assert_eq!(reg.status, RegistrationStatus::AlreadyRegistered);

        // State after two calls equals state after one
        let second_mtime = tokio::fs::metadata(&dest).await.unwrap().modified().unwrap();
        assert_eq!(first_mtime, second_mtime);
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), b"gguf-bytes");
    }

    #[tokio::test]
    async fn test_changed_artifact_is_recopied() {
        let src_dir = tempfile::tempdir().unwrap();
        let lm_dir = tempfile::tempdir().unwrap();
        let artifact = src_dir.path().join("m.gguf");
        tokio::fs::write(&artifact, b"v1").await.unwrap();

        let tool = LmStudioTool::with_models_dir(lm_dir.path().to_path_buf());
        tool.register(&artifact, "m").await.unwrap();

        tokio::fs::write(&artifact, b"v2-longer").await.unwrap();
        let reg = tool.register(&artifact, "m").await.unwrap();
        assert_eq!(reg.status, RegistrationStatus::Registered);

        let dest = lm_dir.path().join(IMPORT_SUBDIR).join("m.gguf");
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), b"v2-longer");
    }
}
