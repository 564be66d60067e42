//! Ollama registration target
//!
//! Writes a Modelfile next to the artifact and runs `ollama create`, after
//! which the model is available as `ollama run <name>`. Re-registering the
//! same artifact is detected through the Modelfile contents and the model
//! list, and short-circuits without touching anything.

use super::registrar::{
    Capability, Registration, RegistrationStatus, RegistrarError, RuntimeTool,
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

const CAPABILITIES: &[Capability] = &[Capability::CreatesManifestEntry];

/// Registers models with a local Ollama install
pub struct OllamaTool {
    /// Binary to invoke; overridable for tests and unusual installs
    binary: String,
}

impl OllamaTool {
    pub fn new() -> Self {
        Self {
            binary: "ollama".to_string(),
        }
    }

    pub fn with_binary(binary: String) -> Self {
        Self { binary }
    }

    fn modelfile_path(artifact: &Path, model_name: &str) -> PathBuf {
        let dir = artifact.parent().unwrap_or_else(|| Path::new("."));
        dir.join(format!("{}.Modelfile", model_name))
    }

    fn modelfile_contents(artifact: &Path) -> String {
        format!("FROM \"{}\"\n", artifact.display())
    }

    /// Whether `ollama list` already knows this model name
    async fn is_listed(&self, model_name: &str) -> Result<bool, RegistrarError> {
        let output = Command::new(&self.binary)
            .arg("list")
            .output()
            .await
            .map_err(|e| RegistrarError::ToolFailed {
                tool: "ollama".into(),
                message: format!("could not run '{} list': {}", self.binary, e),
            })?;
        if !output.status.success() {
            return Ok(false);
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout
            .lines()
            .any(|line| line.split_whitespace().next().is_some_and(|tag| {
                tag == model_name || tag.starts_with(&format!("{}:", model_name))
            })))
    }
}

impl Default for OllamaTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RuntimeTool for OllamaTool {
    fn name(&self) -> &str {
        "ollama"
    }

    fn capabilities(&self) -> &[Capability] {
        CAPABILITIES
    }

    async fn register(
        &self,
        artifact: &Path,
        model_name: &str,
    ) -> Result<Registration, RegistrarError> {
        let modelfile = Self::modelfile_path(artifact, model_name);
        let contents = Self::modelfile_contents(artifact);

        let unchanged = tokio::fs::read_to_string(&modelfile)
            .await
            .map(|existing| existing == contents)
            .unwrap_or(false);

        if unchanged && self.is_listed(model_name).await? {
            debug!("'{}' already registered with ollama", model_name);
            return Ok(Registration {
                status: RegistrationStatus::AlreadyRegistered,
                detail: format!("run with: ollama run {}", model_name),
            });
        }

        tokio::fs::write(&modelfile, &contents).await?;

        let output = Command::new(&self.binary)
            .args(["create", model_name, "-f"])
            .arg(&modelfile)
            .output()
            .await
            .map_err(|e| RegistrarError::ToolFailed {
                tool: "ollama".into(),
                message: format!("could not run '{} create': {}", self.binary, e),
            })?;

        if !output.status.success() {
            return Err(RegistrarError::ToolFailed {
                tool: "ollama".into(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        info!("registered '{}' with ollama", model_name);
        Ok(Registration {
            status: RegistrationStatus::Registered,
            detail: format!("run with: ollama run {}", model_name),
        })
    }
}
