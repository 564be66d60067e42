//! Configuration for modelcompass
//!
//! Two layers with distinct lifetimes:
//!
//! - [`EngineConfig`] is read from environment variables at startup with
//!   sensible defaults, never persisted.
//! - [`Settings`] is the persisted user-preferences document (theme,
//!   onboarding flag, use-case picks) stored alongside the other state
//!   files.
//!
//! # Environment Variables
//!
//! - `MODELCOMPASS_STATE_DIR`: state directory - default: platform data dir
//! - `MODELCOMPASS_DOWNLOAD_DIR`: where artifacts land - default: `~/AI-Models`
//! - `MODELCOMPASS_OLLAMA_ENDPOINT`: local runtime - default: "http://localhost:11434"
//! - `MODELCOMPASS_REQUEST_TIMEOUT`: HTTP timeout seconds - default: "30"
//! - `MODELCOMPASS_LOG_LEVEL`: logging level - default: "info"

use crate::catalog::UseCase;
use crate::persist::store::SETTINGS_FILE;
use crate::persist::StateDir;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_OLLAMA_ENDPOINT: &str = "http://localhost:11434";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_THEME: &str = "Obsidian";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Runtime configuration loaded from the environment
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Where persisted state documents live
    pub state_dir: StateDir,

    /// Destination directory for downloaded artifacts
    pub download_dir: PathBuf,

    /// Local runtime endpoint used for benchmarks
    pub ollama_endpoint: String,

    /// HTTP request timeout in seconds
    pub request_timeout_secs: u64,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for EngineConfig {
    /// Loads from environment variables with defaults for anything unset
    fn default() -> Self {
        let state_dir = env::var("MODELCOMPASS_STATE_DIR")
            .ok()
            .map(|p| StateDir::at(PathBuf::from(p)))
            .unwrap_or_else(StateDir::default_location);

        let download_dir = env::var("MODELCOMPASS_DOWNLOAD_DIR")
            .ok()
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .map(|h| h.join("AI-Models"))
                    .unwrap_or_else(|| PathBuf::from("AI-Models"))
            });

        let ollama_endpoint = env::var("MODELCOMPASS_OLLAMA_ENDPOINT")
            .unwrap_or_else(|_| DEFAULT_OLLAMA_ENDPOINT.to_string());

        let request_timeout_secs = env::var("MODELCOMPASS_REQUEST_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        let log_level = env::var("MODELCOMPASS_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        Self {
            state_dir,
            download_dir,
            ollama_endpoint,
            request_timeout_secs,
            log_level,
        }
    }
}

impl EngineConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a numeric value is out of range or the log
    /// level is unknown.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout must be at least 1 second".to_string(),
            ));
        }
        if self.request_timeout_secs > 600 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout cannot exceed 10 minutes".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }
}

impl fmt::Display for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Modelcompass Configuration:")?;
        writeln!(f, "  State Dir: {}", self.state_dir.root().display())?;
        writeln!(f, "  Download Dir: {}", self.download_dir.display())?;
        writeln!(f, "  Ollama Endpoint: {}", self.ollama_endpoint)?;
        writeln!(f, "  Request Timeout: {}s", self.request_timeout_secs)?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}

/// Persisted user preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub theme: String,
    /// Whether the first-run flow has completed
    pub onboarding_done: bool,
    /// Use cases picked during onboarding, reused as recommendation defaults
    pub use_case_picks: Vec<UseCase>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: DEFAULT_THEME.to_string(),
            onboarding_done: false,
            use_case_picks: Vec::new(),
        }
    }
}

impl Settings {
    pub fn load(state_dir: &StateDir) -> Self {
        state_dir.load_or_default(SETTINGS_FILE)
    }

    pub fn save(&self, state_dir: &StateDir) -> Result<(), crate::persist::PersistError> {
        state_dir.save(SETTINGS_FILE, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    /// Helper to temporarily set environment variables for testing
    struct EnvGuard {
        key: String,
        old_value: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &str, value: &str) -> Self {
            let old_value = env::var(key).ok();
            env::set_var(key, value);
            Self {
                key: key.to_string(),
                old_value,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.old_value {
                Some(v) => env::set_var(&self.key, v),
                None => env::remove_var(&self.key),
            }
        }
    }

    #[test]
    #[serial]
    fn test_environment_variable_parsing() {
        let _guards = vec![
            EnvGuard::set("MODELCOMPASS_STATE_DIR", "/tmp/mc-state"),
            EnvGuard::set("MODELCOMPASS_DOWNLOAD_DIR", "/tmp/mc-models"),
            EnvGuard::set("MODELCOMPASS_OLLAMA_ENDPOINT", "http://localhost:9999"),
            EnvGuard::set("MODELCOMPASS_REQUEST_TIMEOUT", "60"),
            EnvGuard::set("MODELCOMPASS_LOG_LEVEL", "DEBUG"),
        ];

        let config = EngineConfig::default();
        assert_eq!(config.state_dir.root(), std::path::Path::new("/tmp/mc-state"));
        assert_eq!(config.download_dir, PathBuf::from("/tmp/mc-models"));
        assert_eq!(config.ollama_endpoint, "http://localhost:9999");
        assert_eq!(config.request_timeout_secs, 60);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    #[serial]
    fn test_defaults_validate() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_zero_timeout() {
        let mut config = EngineConfig::default();
        config.request_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_unknown_log_level() {
        let mut config = EngineConfig::default();
        config.log_level = "loud".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_settings_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateDir::at(dir.path().to_path_buf());

        let mut settings = Settings::load(&state);
        assert!(!settings.onboarding_done);

        settings.onboarding_done = true;
        settings.use_case_picks = vec![UseCase::Coding];
        settings.save(&state).unwrap();

        let reloaded = Settings::load(&state);
        assert_eq!(reloaded, settings);
    }
}
