//! Text embedding via an Ollama server.
//!
//! The same [`Embedder`] instance embeds chunks at index time and queries at
//! retrieval time, so stored and query vectors share one space. Transient
//! failures (HTTP 429, 5xx, connection errors) are retried with exponential
//! backoff; any other failure surfaces as
//! [`AutodocError::RetrievalBackendUnavailable`].

use crate::config::EmbeddingConfig;
use crate::error::{AutodocError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Turns text into dense vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Name of the embedding model, recorded alongside stored vectors.
    fn model_name(&self) -> &str;

    /// Embed a batch of texts. Output order matches input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single query string.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed(&[text.to_string()]).await?;
        vectors.pop().ok_or_else(|| {
            AutodocError::RetrievalBackendUnavailable("embedding backend returned no vector".to_string())
        })
    }
}

/// Embedder backed by Ollama's `/api/embed` endpoint.
#[derive(Clone)]
pub struct OllamaEmbedder {
    client: Client,
    config: EmbeddingConfig,
}

impl OllamaEmbedder {
    pub fn new(config: EmbeddingConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/embed", self.config.url.trim_end_matches('/'))
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = serde_json::json!({
            "model": self.config.model,
            "input": texts,
        });

        let mut last_err = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                debug!(attempt, ?delay, "retrying embedding request");
                tokio::time::sleep(delay).await;
            }

            let response = match self.client.post(self.endpoint()).json(&body).send().await {
                Ok(response) => response,
                Err(e) => {
                    warn!("embedding request failed: {}", e);
                    last_err = Some(format!(
                        "connection error (is Ollama running at {}?): {}",
                        self.config.url, e
                    ));
                    continue;
                }
            };

            let status = response.status();
            if status.is_success() {
                let json: serde_json::Value = response.json().await.map_err(|e| {
                    AutodocError::RetrievalBackendUnavailable(format!("invalid embedding response: {}", e))
                })?;
                let vectors = parse_ollama_response(&json)?;
                if vectors.len() != texts.len() {
                    return Err(AutodocError::RetrievalBackendUnavailable(format!(
                        "expected {} embeddings, got {}",
                        texts.len(),
                        vectors.len()
                    )));
                }
                return Ok(vectors);
            }

            let body_text = response.text().await.unwrap_or_default();
            let message = format!("Ollama API error {}: {}", status, body_text);
            if status.as_u16() == 429 || status.is_server_error() {
                warn!("{}", message);
                last_err = Some(message);
                continue;
            }
            return Err(AutodocError::RetrievalBackendUnavailable(message));
        }

        Err(AutodocError::RetrievalBackendUnavailable(
            last_err.unwrap_or_else(|| "embedding failed after retries".to_string()),
        ))
    }
}

fn parse_ollama_response(json: &serde_json::Value) -> Result<Vec<Vec<f32>>> {
    let embeddings = json
        .get("embeddings")
        .and_then(|e| e.as_array())
        .ok_or_else(|| {
            AutodocError::RetrievalBackendUnavailable(
                "invalid Ollama response: missing embeddings array".to_string(),
            )
        })?;

    embeddings
        .iter()
        .map(|embedding| {
            embedding
                .as_array()
                .map(|values| {
                    values
                        .iter()
                        .map(|v| v.as_f64().unwrap_or(0.0) as f32)
                        .collect()
                })
                .ok_or_else(|| {
                    AutodocError::RetrievalBackendUnavailable(
                        "invalid Ollama response: embedding is not an array".to_string(),
                    )
                })
        })
        .collect()
}

/// Compute cosine similarity between two vectors.
///
/// Mismatched lengths and zero vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
