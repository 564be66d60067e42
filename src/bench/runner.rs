//! Benchmark runner for locally served models
//!
//! Drives one non-streaming generation through the local Ollama API and
//! derives steady-state tokens/second and time-to-first-token from the
//! timing counters Ollama reports. The runner shares no mutable state with
//! the download or registration subsystems, so a timed-out benchmark can be
//! abandoned without corrupting anything.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default local Ollama endpoint
const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Bounded window for one benchmark generation
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Standard prompt, sized to elicit a few hundred output tokens
pub const DEFAULT_PROMPT: &str = "Write a detailed comparison of Python and JavaScript \
covering syntax, performance, and use cases.";

/// Benchmark errors; reported to the caller, never retried
#[derive(Debug, Error)]
pub enum BenchError {
    /// The local runtime could not be reached (or answered with an error)
    #[error("local runtime unavailable: {0}")]
    RuntimeUnavailable(String),

    /// No response within the bounded window
    #[error("benchmark timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("could not interpret runtime response: {0}")]
    InvalidResponse(String),
}

/// One recorded benchmark run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub model_id: String,
    /// Steady-state generation throughput
    pub tok_s: f64,
    /// Time to first token in milliseconds
    pub ttft_ms: f64,
    /// Tokens generated during the run
    pub tokens: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    done: bool,
    /// Number of tokens generated
    #[serde(default)]
    eval_count: Option<u64>,
    /// Generation wall time in nanoseconds
    #[serde(default)]
    eval_duration: Option<u64>,
    /// Prompt processing wall time in nanoseconds
    #[serde(default)]
    prompt_eval_duration: Option<u64>,
}

/// Benchmarks models served by a local Ollama instance
pub struct BenchmarkRunner {
    endpoint: String,
    http_client: Client,
    timeout: Duration,
}

impl BenchmarkRunner {
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT.to_string(), Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_endpoint(endpoint: String, timeout: Duration) -> Self {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client");
        Self {
            endpoint,
            http_client,
            timeout,
        }
    }

    /// Checks the runtime is up; returns the model tags it serves
    pub async fn health_check(&self) -> Result<Vec<String>, BenchError> {
        #[derive(Deserialize)]
        struct Tag {
            name: String,
        }
        #[derive(Deserialize)]
        struct Tags {
            #[serde(default)]
            models: Vec<Tag>,
        }

        let url = format!("{}/api/tags", self.endpoint);
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| BenchError::RuntimeUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BenchError::RuntimeUnavailable(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        let tags: Tags = response
            .json()
            .await
            .map_err(|e| BenchError::InvalidResponse(e.to_string()))?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// Runs one benchmark generation
    ///
    /// `model` must already be loadable by the runtime (registered or
    /// pulled). Fails with [`BenchError::RuntimeUnavailable`] when the
    /// runtime cannot be reached and [`BenchError::Timeout`] when the
    /// bounded window elapses.
    pub async fn run(&self, model: &str, prompt: &str) -> Result<BenchmarkResult, BenchError> {
        let url = format!("{}/api/generate", self.endpoint);
        let request = GenerateRequest {
            model,
            prompt,
            stream: false,
        };

        debug!("benchmarking '{}' against {}", model, self.endpoint);
        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BenchError::Timeout {
                        seconds: self.timeout.as_secs(),
                    }
                } else {
                    BenchError::RuntimeUnavailable(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BenchError::RuntimeUnavailable(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let generate: GenerateResponse = response
            .json()
            .await
            .map_err(|e| BenchError::InvalidResponse(e.to_string()))?;

        if !generate.done {
            warn!("runtime reported an incomplete generation");
        }

        let result = result_from_counters(model, &generate)?;
        info!(
            "benchmark '{}': {:.1} tok/s, ttft {:.0} ms",
            model, result.tok_s, result.ttft_ms
        );
        Ok(result)
    }
}

impl Default for BenchmarkRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Derives the result metrics from Ollama's nanosecond counters
fn result_from_counters(
    model: &str,
    response: &GenerateResponse,
) -> Result<BenchmarkResult, BenchError> {
    let tokens = response.eval_count.unwrap_or(0);
    let eval_ns = response.eval_duration.unwrap_or(0);
    if tokens == 0 || eval_ns == 0 {
        return Err(BenchError::InvalidResponse(
            "runtime reported no generated tokens".into(),
        ));
    }

    let tok_s = tokens as f64 / (eval_ns as f64 / 1e9);
    let ttft_ms = response.prompt_eval_duration.unwrap_or(0) as f64 / 1e6;

    Ok(BenchmarkResult {
        model_id: model.to_string(),
        tok_s,
        ttft_ms,
        tokens,
        timestamp: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_from_counters() {
        let response = GenerateResponse {
            done: true,
            eval_count: Some(300),
            eval_duration: Some(10_000_000_000), // 10s
            prompt_eval_duration: Some(500_000_000), // 0.5s
        };
        let result = result_from_counters("qwen3:8b", &response).unwrap();
        assert!((result.tok_s - 30.0).abs() < 1e-9);
        assert!((result.ttft_ms - 500.0).abs() < 1e-9);
        assert_eq!(result.tokens, 300);
    }

    #[test]
    fn test_empty_generation_is_invalid() {
        let response = GenerateResponse {
            done: true,
            eval_count: Some(0),
            eval_duration: Some(1),
            prompt_eval_duration: None,
        };
        assert!(matches!(
            result_from_counters("m", &response),
            Err(BenchError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_generate_response_deserialization() {
        let json = r#"{
            "model": "qwen3:8b",
            "created_at": "2025-01-01T00:00:00Z",
            "response": "text",
            "done": true,
            "eval_count": 250,
            "eval_duration": 9000000000,
            "prompt_eval_duration": 400000000
        }"#;
        let response: GenerateResponse = serde_json::from_str(json).unwrap();
        assert!(response.done);
        assert_eq!(response.eval_count, Some(250));
    }

    #[tokio::test]
    async fn test_unreachable_runtime() {
        let runner = BenchmarkRunner::with_endpoint(
            "http://localhost:59996".into(),
            Duration::from_millis(200),
        );
        let err = runner.run("m", DEFAULT_PROMPT).await.unwrap_err();
        assert!(matches!(err, BenchError::RuntimeUnavailable(_)));

        let err = runner.health_check().await.unwrap_err();
        assert!(matches!(err, BenchError::RuntimeUnavailable(_)));
    }
}
