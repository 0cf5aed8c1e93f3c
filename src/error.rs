//! Error types for the documentation evaluation pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our custom error.
pub type Result<T> = std::result::Result<T, AutodocError>;

/// Errors that can occur while ingesting, retrieving, generating or scoring.
#[derive(Error, Debug)]
pub enum AutodocError {
    /// Error reading or writing files.
    #[error("I/O error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error during serialization/deserialization.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A referenced input file or directory does not exist.
    #[error("Input not found at '{0}'")]
    InputMissing(PathBuf),

    /// A document could not be turned into text.
    #[error("Failed to extract text from '{path}': {reason}")]
    Extraction { path: PathBuf, reason: String },

    /// The embedding backend or vector store could not be reached.
    #[error("Retrieval backend unavailable: {0}")]
    RetrievalBackendUnavailable(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// LLM API error.
    #[error("LLM API error: {0}")]
    LlmApi(String),

    /// LLM response parsing error.
    #[error("Failed to parse LLM response: {0}")]
    LlmParse(String),

    /// HTTP request error.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Configuration file error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AutodocError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error came from an unreachable or failing collaborator
    /// rather than from bad input.
    pub fn is_collaborator_failure(&self) -> bool {
        matches!(
            self,
            AutodocError::RetrievalBackendUnavailable(_)
                | AutodocError::LlmApi(_)
                | AutodocError::Http(_)
        )
    }
}

impl From<reqwest::Error> for AutodocError {
    fn from(err: reqwest::Error) -> Self {
        AutodocError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for AutodocError {
    fn from(err: serde_json::Error) -> Self {
        AutodocError::LlmParse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collaborator_failure_classification() {
        assert!(AutodocError::LlmApi("down".into()).is_collaborator_failure());
        assert!(AutodocError::RetrievalBackendUnavailable("x".into()).is_collaborator_failure());
        assert!(!AutodocError::InputMissing(PathBuf::from("a.cpp")).is_collaborator_failure());
    }

    #[test]
    fn test_io_error_message_has_path() {
        let err = AutodocError::io(
            "docs/missing.md",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.to_string().contains("docs/missing.md"));
    }
}
