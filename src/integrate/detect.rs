//! Local tool discovery and installer invocation
//!
//! Discovery is best-effort: a tool that answers `--version` is reported
//! with its version, one found only on disk is reported without. Installing
//! is a consumed capability: the engine shells out to a package manager by
//! identifier and reports success or failure, nothing more.

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

/// A runtime tool the probe looked for
#[derive(Debug, Clone)]
pub struct DetectedTool {
    pub id: &'static str,
    pub name: &'static str,
    pub installed: bool,
    pub version: Option<String>,
    /// Package-manager identifier for one-click install, when known
    pub install_id: Option<&'static str>,
}

struct ToolSpec {
    id: &'static str,
    name: &'static str,
    /// Command answering `--version`, when the tool has a CLI
    version_cmd: Option<&'static str>,
    /// Directory whose presence indicates an install
    marker_dir: Option<fn() -> Option<PathBuf>>,
    install_id: Option<&'static str>,
}

fn lmstudio_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".cache").join("lm-studio"))
}

fn jan_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("Jan"))
}

const TOOLS: &[ToolSpec] = &[
    ToolSpec {
        id: "ollama",
        name: "Ollama",
        version_cmd: Some("ollama"),
        marker_dir: None,
        install_id: Some("Ollama.Ollama"),
    },
    ToolSpec {
        id: "lmstudio",
        name: "LM Studio",
        version_cmd: None,
        marker_dir: Some(lmstudio_dir),
        install_id: Some("ElementLabs.LMStudio"),
    },
    ToolSpec {
        id: "jan",
        name: "Jan",
        version_cmd: None,
        marker_dir: Some(jan_dir),
        install_id: Some("Jan.Jan"),
    },
];

/// Extracts the first dotted version number from command output
fn parse_version(output: &str) -> Option<String> {
    for token in output.split_whitespace() {
        let candidate = token.trim_start_matches('v');
        let mut parts = candidate.split('.');
        if let (Some(a), Some(b)) = (parts.next(), parts.next()) {
            if a.chars().all(|c| c.is_ascii_digit())
                && !a.is_empty()
                && b.chars().next().is_some_and(|c| c.is_ascii_digit())
            {
                return Some(candidate.to_string());
            }
        }
    }
    None
}

/// Probes for known local runtime tools
pub async fn detect_tools() -> Vec<DetectedTool> {
    let mut found = Vec::with_capacity(TOOLS.len());
    for tool in TOOLS {
        let mut installed = false;
        let mut version = None;

        if let Some(cmd) = tool.version_cmd {
            if let Ok(output) = Command::new(cmd).arg("--version").output().await {
                if output.status.success() {
                    installed = true;
                    version = parse_version(&String::from_utf8_lossy(&output.stdout));
                }
            }
        }
        if !installed {
            if let Some(marker) = tool.marker_dir {
                installed = marker().map(|p| p.exists()).unwrap_or(false);
            }
        }

        debug!("tool {}: installed={}", tool.id, installed);
        found.push(DetectedTool {
            id: tool.id,
            name: tool.name,
            installed,
            version,
            install_id: tool.install_id,
        });
    }
    found
}

/// Installer errors
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("installer unavailable: {0}")]
    Unavailable(String),

    #[error("install of '{0}' failed: {1}")]
    Failed(String, String),
}

/// Install-by-identifier capability
#[async_trait]
pub trait ToolInstaller: Send + Sync {
    async fn install(&self, install_id: &str) -> Result<(), InstallError>;
}

/// Shells out to a package manager, e.g. `winget install --id <id>`
pub struct CommandInstaller {
    program: String,
    args_before_id: Vec<String>,
}

impl CommandInstaller {
    pub fn winget() -> Self {
        Self {
            program: "winget".into(),
            args_before_id: vec![
                "install".into(),
                "--accept-package-agreements".into(),
                "--accept-source-agreements".into(),
                "--silent".into(),
                "--id".into(),
            ],
        }
    }

    pub fn new(program: String, args_before_id: Vec<String>) -> Self {
        Self {
            program,
            args_before_id,
        }
    }
}

#[async_trait]
impl ToolInstaller for CommandInstaller {
    async fn install(&self, install_id: &str) -> Result<(), InstallError> {
        let output = Command::new(&self.program)
            .args(&self.args_before_id)
            .arg(install_id)
            .output()
            .await
            .map_err(|e| InstallError::Unavailable(format!("{}: {}", self.program, e)))?;

        if output.status.success() {
            info!("installed '{}' via {}", install_id, self.program);
            Ok(())
        } else {
            Err(InstallError::Failed(
                install_id.to_string(),
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version() {
        assert_eq!(
            parse_version("ollama version is 0.5.7"),
            Some("0.5.7".to_string())
        );
        assert_eq!(parse_version("v1.2"), Some("1.2".to_string()));
        assert_eq!(parse_version("no digits here"), None);
    }

    #[tokio::test]
    async fn test_detect_reports_every_known_tool() {
        let tools = detect_tools().await;
        assert_eq!(tools.len(), TOOLS.len());
        assert!(tools.iter().any(|t| t.id == "ollama"));
    }

    #[tokio::test]
    async fn test_installer_unavailable_program() {
        let installer = CommandInstaller::new("definitely-not-a-real-binary".into(), vec![]);
        let err = installer.install("Some.Tool").await.unwrap_err();
        assert!(matches!(err, InstallError::Unavailable(_)));
    }
}
