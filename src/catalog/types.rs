//! Typed catalog records and their load-time validation

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Catalog errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A record failed validation and was skipped
    #[error("invalid model data for '{id}': {reason}")]
    InvalidModelData { id: String, reason: String },
}

/// Broad capability bucket a model belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelCategory {
    GeneralPurpose,
    Coding,
    Roleplay,
    Uncensored,
    LongContext,
    SmallEfficient,
    Agents,
    Vision,
}

impl std::fmt::Display for ModelCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ModelCategory::GeneralPurpose => "General Purpose",
            ModelCategory::Coding => "Coding",
            ModelCategory::Roleplay => "Roleplay",
            ModelCategory::Uncensored => "Uncensored",
            ModelCategory::LongContext => "Long Context",
            ModelCategory::SmallEfficient => "Small / Efficient",
            ModelCategory::Agents => "Agents",
            ModelCategory::Vision => "Vision",
        };
        write!(f, "{}", label)
    }
}

/// What the user wants to do with a model
///
/// Each use case maps onto one or more catalog categories; the ranker filters
/// on the union of the selected use cases' categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UseCase {
    ChatWriting,
    Coding,
    Roleplay,
    Uncensored,
    Research,
    Agents,
    Vision,
}

impl UseCase {
    /// Categories that satisfy this use case
    pub fn categories(&self) -> &'static [ModelCategory] {
        match self {
            UseCase::ChatWriting => &[ModelCategory::GeneralPurpose, ModelCategory::SmallEfficient],
            UseCase::Coding => &[ModelCategory::Coding],
            UseCase::Roleplay => &[ModelCategory::Roleplay, ModelCategory::Uncensored],
            UseCase::Uncensored => &[ModelCategory::Uncensored],
            UseCase::Research => &[ModelCategory::GeneralPurpose, ModelCategory::LongContext],
            UseCase::Agents => &[ModelCategory::Agents, ModelCategory::Coding],
            UseCase::Vision => &[ModelCategory::Vision],
        }
    }

    pub const ALL: &'static [UseCase] = &[
        UseCase::ChatWriting,
        UseCase::Coding,
        UseCase::Roleplay,
        UseCase::Uncensored,
        UseCase::Research,
        UseCase::Agents,
        UseCase::Vision,
    ];
}

impl std::str::FromStr for UseCase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "chat" | "chat_writing" | "writing" => Ok(UseCase::ChatWriting),
            "coding" | "code" => Ok(UseCase::Coding),
            "roleplay" | "rp" => Ok(UseCase::Roleplay),
            "uncensored" => Ok(UseCase::Uncensored),
            "research" => Ok(UseCase::Research),
            "agents" | "agent" => Ok(UseCase::Agents),
            "vision" => Ok(UseCase::Vision),
            other => Err(format!(
                "unknown use case '{}' (expected chat, coding, roleplay, uncensored, research, agents or vision)",
                other
            )),
        }
    }
}

/// A validated catalog entry
///
/// Immutable once loaded. `source_repo`/`source_file` are absent for models
/// that can only be obtained through a runtime's own puller (e.g. sharded
/// multi-file releases).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    /// Stable identifier, unique within the catalog
    pub id: String,
    pub name: String,
    /// Parameter-count label shown to the user, e.g. "30B (3B active)"
    pub params_label: String,
    /// Quantization scheme label, e.g. "Q4_K_M"
    pub quantization: String,
    /// Artifact size in gigabytes
    pub size_gb: f64,
    /// Context window in tokens
    pub context_tokens: u32,
    /// Community quality score, 0..=100
    pub score: u8,
    pub category: ModelCategory,
    pub license: String,
    pub description: String,
    pub tags: BTreeSet<String>,
    /// One-line "why pick this one"
    pub best_for: String,
    /// Source repository on the model hub, when directly downloadable
    pub source_repo: Option<String>,
    /// File name within the source repository
    pub source_file: Option<String>,
    /// Expected sha256 of the artifact, when published
    #[serde(default)]
    pub sha256: Option<String>,
}

impl ModelRecord {
    /// Whether the engine can download this model itself
    pub fn is_downloadable(&self) -> bool {
        self.source_repo.is_some() && self.source_file.is_some()
    }
}

/// A catalog entry as it appears on disk or on the wire, before validation
///
/// Every field the validator needs is optional or loosely typed here so a
/// single malformed entry can be reported and skipped instead of failing the
/// whole document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawModelRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub params_label: String,
    #[serde(default)]
    pub quantization: String,
    #[serde(default)]
    pub size_gb: f64,
    #[serde(default)]
    pub context_tokens: u32,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub category: Option<ModelCategory>,
    #[serde(default)]
    pub license: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub best_for: String,
    #[serde(default)]
    pub source_repo: Option<String>,
    #[serde(default)]
    pub source_file: Option<String>,
    #[serde(default)]
    pub sha256: Option<String>,
}

impl RawModelRecord {
    /// Validates into a fixed-shape [`ModelRecord`]
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidModelData`] when the id or name is
    /// missing, the size is not a positive finite number, or the score is out
    /// of range. Callers are expected to log and skip, not abort.
    pub fn validate(self) -> Result<ModelRecord, CatalogError> {
        let id = match self.id.as_deref() {
            Some(id) if !id.trim().is_empty() => id.trim().to_string(),
            _ => {
                return Err(CatalogError::InvalidModelData {
                    id: self.name.unwrap_or_else(|| "<unnamed>".into()),
                    reason: "missing id".into(),
                })
            }
        };

        let name = match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => {
                return Err(CatalogError::InvalidModelData {
                    id,
                    reason: "missing name".into(),
                })
            }
        };

        if !self.size_gb.is_finite() || self.size_gb <= 0.0 {
            return Err(CatalogError::InvalidModelData {
                id,
                reason: format!("size_gb must be a positive number, got {}", self.size_gb),
            });
        }

        if !(0..=100).contains(&self.score) {
            return Err(CatalogError::InvalidModelData {
                id,
                reason: format!("score must be within 0..=100, got {}", self.score),
            });
        }

        let category = self.category.ok_or_else(|| CatalogError::InvalidModelData {
            id: id.clone(),
            reason: "missing category".into(),
        })?;

        Ok(ModelRecord {
            id,
            name,
            params_label: self.params_label,
            quantization: self.quantization,
            size_gb: self.size_gb,
            context_tokens: self.context_tokens,
            score: self.score as u8,
            category,
            license: self.license,
            description: self.description,
            tags: self.tags,
            best_for: self.best_for,
            source_repo: self.source_repo,
            source_file: self.source_file,
            sha256: self.sha256,
        })
    }
}
