//! Configuration for the documentation evaluation harness.
//!
//! Supports both environment variables and YAML config file.
//! Environment variables take precedence over config file values.

use crate::error::{AutodocError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// LLM configuration (OpenAI-compatible chat completions).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL for the LLM API (e.g., "http://localhost:11434")
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// API key for authentication. Empty for local servers.
    #[serde(default)]
    pub api_key: String,

    /// Model name (e.g., "llama3.1:8b")
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Maximum tokens for response (optional)
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Temperature for generation (optional)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_api_base() -> String {
    "http://localhost:11434".to_string()
}

fn default_llm_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.1
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_key: String::new(),
            model: default_llm_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

/// Embedding backend configuration.
///
/// The same section drives index-time and query-time embedding, which is
/// what keeps stored vectors and query vectors in one embedding space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Base URL of the Ollama server.
    #[serde(default = "default_api_base")]
    pub url: String,

    /// Embedding model name.
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Texts per embedding request.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries for transient failures (429 / 5xx / connection errors).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_batch_size() -> usize {
    32
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    2
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            url: default_api_base(),
            model: default_embedding_model(),
            batch_size: default_batch_size(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

/// Vector store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding one file per collection.
    #[serde(default = "default_db_dir")]
    pub db_dir: PathBuf,

    /// Collection used by ingestion and retrieval.
    #[serde(default = "default_collection")]
    pub collection_name: String,

    /// Replace previously indexed chunks of a source instead of appending.
    #[serde(default)]
    pub dedup_by_source: bool,

    /// On-disk format of collection files ("json" or "bin").
    #[serde(default = "default_store_format")]
    pub format: String,
}

fn default_db_dir() -> PathBuf {
    PathBuf::from("data/vector_db")
}

fn default_collection() -> String {
    "autodoc_rag".to_string()
}

fn default_store_format() -> String {
    "bin".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_dir: default_db_dir(),
            collection_name: default_collection(),
            dedup_by_source: false,
            format: default_store_format(),
        }
    }
}

/// Chunking parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkConfig {
    /// Maximum characters per chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Maximum characters shared with the preceding chunk.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

/// Retrieval parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of chunks to retrieve per query.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// How much of a source file goes into its retrieval query.
    #[serde(default = "default_query_chars")]
    pub query_chars: usize,
}

fn default_top_k() -> usize {
    5
}

fn default_query_chars() -> usize {
    2000
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            query_chars: default_query_chars(),
        }
    }
}

/// Output locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Base directory for generated docs and result files.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

/// Full application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub chunking: ChunkConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from environment variables and optional config file.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (LLM_API_BASE, LLM_MODEL, EMBEDDING_MODEL, ...)
    /// 2. Config file (~/.config/autodoc-rag/config.yaml)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                config = Self::load_from_file(&config_path)?;
            }
        }

        config.apply_env();
        Ok(config)
    }

    /// Load configuration from a specific file path.
    ///
    /// Sections and fields missing from the file keep their defaults.
    pub fn load_from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AutodocError::io(path, e))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Config::default());
        }
        serde_yaml::from_str(content)
            .map_err(|e| AutodocError::Config(format!("Failed to parse config file: {}", e)))
    }

    fn apply_env(&mut self) {
        if let Ok(api_base) = env::var("LLM_API_BASE") {
            self.llm.api_base = api_base;
        }

        if let Ok(api_key) = env::var("LLM_API_KEY") {
            self.llm.api_key = api_key;
        }

        if let Ok(model) = env::var("LLM_MODEL") {
            self.llm.model = model;
        }

        if let Ok(max_tokens) = env::var("LLM_MAX_TOKENS") {
            if let Ok(tokens) = max_tokens.parse() {
                self.llm.max_tokens = tokens;
            }
        }

        if let Ok(temperature) = env::var("LLM_TEMPERATURE") {
            if let Ok(temp) = temperature.parse() {
                self.llm.temperature = temp;
            }
        }

        if let Ok(url) = env::var("EMBEDDING_URL") {
            self.embedding.url = url;
        }

        if let Ok(model) = env::var("EMBEDDING_MODEL") {
            self.embedding.model = model;
        }

        if let Ok(dir) = env::var("VECTOR_DB_DIR") {
            self.store.db_dir = PathBuf::from(dir);
        }

        if let Ok(name) = env::var("COLLECTION_NAME") {
            self.store.collection_name = name;
        }

        if let Ok(dir) = env::var("OUTPUT_DIR") {
            self.output.output_dir = PathBuf::from(dir);
        }
    }

    /// Get the default config file path.
    pub fn config_file_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "autodoc-rag")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Validate that required configuration is present and consistent.
    pub fn validate(&self) -> Result<()> {
        if self.llm.api_base.is_empty() {
            return Err(AutodocError::Config(
                "LLM API base URL is required. Set LLM_API_BASE environment variable or add to config file.".to_string()
            ));
        }

        if self.llm.model.is_empty() {
            return Err(AutodocError::Config(
                "LLM model is required. Set LLM_MODEL environment variable or add to config file."
                    .to_string(),
            ));
        }

        if self.embedding.url.is_empty() || self.embedding.model.is_empty() {
            return Err(AutodocError::Config(
                "Embedding URL and model are required. Set EMBEDDING_URL / EMBEDDING_MODEL or add to config file."
                    .to_string(),
            ));
        }

        if self.store.collection_name.is_empty() {
            return Err(AutodocError::InvalidConfig(
                "collection name must not be empty".to_string(),
            ));
        }

        if self.chunking.chunk_size == 0 {
            return Err(AutodocError::InvalidConfig(
                "chunk_size must be greater than zero".to_string(),
            ));
        }

        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(AutodocError::InvalidConfig(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }

        if self.retrieval.top_k == 0 {
            return Err(AutodocError::InvalidConfig(
                "top_k must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.llm.api_base, "http://localhost:11434");
        assert!(config.llm.api_key.is_empty());
        assert_eq!(config.llm.model, "llama3.1:8b");
        assert_eq!(config.llm.max_tokens, 4096);
        assert!((config.llm.temperature - 0.1).abs() < f32::EPSILON);
        assert_eq!(config.embedding.model, "nomic-embed-text");
        assert_eq!(config.store.collection_name, "autodoc_rag");
        assert_eq!(config.store.db_dir, PathBuf::from("data/vector_db"));
        assert!(!config.store.dedup_by_source);
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert_eq!(config.retrieval.top_k, 5);
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_overlap_not_smaller_than_size() {
        let mut config = Config::default();
        config.chunking = ChunkConfig {
            chunk_size: 100,
            chunk_overlap: 100,
        };
        assert!(matches!(
            config.validate(),
            Err(AutodocError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_validate_fails_without_model() {
        let mut config = Config::default();
        config.llm.model.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
llm:
  model: mistral
store:
  dedup_by_source: true
chunking:
  chunk_size: 500
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.llm.model, "mistral");
        assert_eq!(config.llm.api_base, "http://localhost:11434");
        assert!(config.store.dedup_by_source);
        assert_eq!(config.store.collection_name, "autodoc_rag");
        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.chunking.chunk_overlap, 200);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config = Config::from_yaml("").unwrap();
        assert_eq!(config.retrieval.top_k, 5);
    }
}
