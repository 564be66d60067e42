//! Remote catalog search against the HuggingFace hub API
//!
//! The engine consumes search as a capability: any [`CatalogSearch`]
//! implementation may back it. The bundled adapter talks to the public
//! HuggingFace REST API, restricted to GGUF repositories and sorted by
//! downloads, mirroring what a user would find by hand.

use super::types::{ModelCategory, RawModelRecord};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default hub endpoint
const DEFAULT_ENDPOINT: &str = "https://huggingface.co";

/// Default request timeout for hub API calls
const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Quantization markers recognized in GGUF file names, most specific first
const QUANT_MARKERS: &[&str] = &[
    "q8_0", "q6_k", "q5_k_m", "q5_k_s", "q4_k_m", "q4_k_s", "q4_0", "q3_k_m", "q3_k_s", "q2_k",
    "iq4_xs", "iq4_nl", "iq3_m", "iq3_s", "iq2_m", "iq1_s", "f16", "bf16",
];

/// Search errors
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Request(String),

    #[error("search returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not parse search response: {0}")]
    Parse(String),
}

/// One repository hit from a text search
#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    /// Repository id, e.g. "bartowski/Qwen3-8B-GGUF"
    pub id: String,
    #[serde(default)]
    pub downloads: u64,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A GGUF artifact within a repository
#[derive(Debug, Clone)]
pub struct GgufFile {
    pub name: String,
    /// Quantization marker parsed from the file name, upper-cased
    pub quant: String,
    pub size_bytes: u64,
}

impl GgufFile {
    pub fn size_gb(&self) -> f64 {
        self.size_bytes as f64 / (1024.0 * 1024.0 * 1024.0)
    }
}

/// Remote model search capability
#[async_trait]
pub trait CatalogSearch: Send + Sync {
    /// Text search over GGUF repositories, best-downloaded first
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, SearchError>;

    /// Lists the GGUF artifacts of one repository with their sizes
    async fn list_files(&self, repo_id: &str) -> Result<Vec<GgufFile>, SearchError>;
}

/// HuggingFace hub API adapter
pub struct HuggingFaceSearch {
    endpoint: String,
    http_client: Client,
}

impl HuggingFaceSearch {
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT.to_string())
    }

    /// Points the adapter at a different endpoint (tests, mirrors)
    pub fn with_endpoint(endpoint: String) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            endpoint,
            http_client,
        }
    }

    fn map_send_error(e: reqwest::Error) -> SearchError {
        SearchError::Request(e.to_string())
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SearchError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }
        Ok(response)
    }
}

impl Default for HuggingFaceSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogSearch for HuggingFaceSearch {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, SearchError> {
        let url = format!("{}/api/models", self.endpoint);
        debug!("searching hub for '{}' (limit {})", query, limit);

        let limit = limit.to_string();
        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("search", query),
                ("filter", "gguf"),
                ("sort", "downloads"),
                ("direction", "-1"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let response = Self::check_status(response).await?;
        let hits: Vec<SearchHit> = response
            .json()
            .await
            .map_err(|e| SearchError::Parse(e.to_string()))?;

        info!("hub search '{}' returned {} repositories", query, hits.len());
        Ok(hits)
    }

    async fn list_files(&self, repo_id: &str) -> Result<Vec<GgufFile>, SearchError> {
        #[derive(Deserialize)]
        struct Sibling {
            rfilename: String,
            #[serde(default)]
            size: Option<u64>,
        }
        #[derive(Deserialize)]
        struct RepoInfo {
            #[serde(default)]
            siblings: Vec<Sibling>,
        }

        let url = format!("{}/api/models/{}?blobs=true", self.endpoint, repo_id);
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let response = Self::check_status(response).await?;
        let info: RepoInfo = response
            .json()
            .await
            .map_err(|e| SearchError::Parse(e.to_string()))?;

        let files: Vec<GgufFile> = info
            .siblings
            .into_iter()
            .filter(|s| s.rfilename.ends_with(".gguf"))
            .map(|s| GgufFile {
                quant: parse_quant(&s.rfilename),
                size_bytes: s.size.unwrap_or(0),
                name: s.rfilename,
            })
            .collect();

        if files.is_empty() {
            warn!("repository '{}' has no GGUF files", repo_id);
        }
        Ok(files)
    }
}

/// Extracts the quantization marker from a GGUF file name
pub fn parse_quant(filename: &str) -> String {
    let lower = filename.to_lowercase();
    for marker in QUANT_MARKERS {
        if lower.contains(marker) {
            return marker.to_uppercase();
        }
    }
    "unknown".to_string()
}

/// Builds a raw catalog record from a selected search result file
///
/// The result still goes through normal validation before it can merge into
/// the catalog; search-sourced entries get a neutral score since the hub
/// carries no quality signal comparable to the curated list.
pub fn record_from_search(repo_id: &str, file: &GgufFile) -> RawModelRecord {
    let name = repo_id.rsplit('/').next().unwrap_or(repo_id).to_string();
    RawModelRecord {
        id: Some(format!("hub:{}/{}", repo_id, file.name)),
        name: Some(name),
        quantization: file.quant.clone(),
        size_gb: file.size_gb(),
        score: 50,
        category: Some(ModelCategory::GeneralPurpose),
        description: format!("Imported from huggingface.co/{}", repo_id),
        source_repo: Some(repo_id.to_string()),
        source_file: Some(file.name.clone()),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quant_markers() {
        assert_eq!(parse_quant("Qwen3-8B-Q4_K_M.gguf"), "Q4_K_M");
        assert_eq!(parse_quant("model.IQ4_XS.gguf"), "IQ4_XS");
        assert_eq!(parse_quant("model-f16.gguf"), "F16");
        assert_eq!(parse_quant("model.gguf"), "unknown");
    }

    #[test]
    fn test_search_hit_deserialization() {
        let json = r#"[{"id":"bartowski/Qwen3-8B-GGUF","downloads":12345,"likes":67,"tags":["gguf","text-generation"]}]"#;
        let hits: Vec<SearchHit> = serde_json::from_str(json).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "bartowski/Qwen3-8B-GGUF");
        assert_eq!(hits[0].downloads, 12345);
    }

    #[test]
    fn test_search_hit_minimal_fields() {
        let hits: Vec<SearchHit> = serde_json::from_str(r#"[{"id":"a/b"}]"#).unwrap();
        assert_eq!(hits[0].downloads, 0);
        assert!(hits[0].tags.is_empty());
    }

    #[test]
    fn test_record_from_search_validates() {
        let file = GgufFile {
            name: "Test-Q4_K_M.gguf".into(),
            quant: "Q4_K_M".into(),
            size_bytes: 5 * 1024 * 1024 * 1024,
        };
        let record = record_from_search("org/Test-GGUF", &file).validate().unwrap();
        assert_eq!(record.name, "Test-GGUF");
        assert!(record.is_downloadable());
        assert!((record.size_gb - 5.0).abs() < 0.01);
    }

    #[test]
    fn test_record_from_search_zero_size_rejected() {
        // A hub entry with no size metadata must not slip into the catalog
        let file = GgufFile {
            name: "x.gguf".into(),
            quant: "unknown".into(),
            size_bytes: 0,
        };
        assert!(record_from_search("org/x", &file).validate().is_err());
    }

    #[tokio::test]
    async fn test_search_unreachable_endpoint() {
        let search = HuggingFaceSearch::with_endpoint("http://localhost:59998".into());
        let result = search.search("qwen", 5).await;
        assert!(matches!(result, Err(SearchError::Request(_))));
    }
}
