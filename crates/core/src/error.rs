//! Error types for the HIPAA Q&A workspace.
//!
//! One enum covers the whole application: the generic categories
//! (configuration, I/O, LLM, prompt, serialization) plus the ingestion and
//! retrieval failures the pipeline reports by name.

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type.
///
/// All fallible functions return `Result<T, AppError>`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// LLM provider errors (transport, HTTP status, malformed responses)
    #[error("LLM error: {0}")]
    Llm(String),

    /// Knowledge base errors that do not fit a named category below
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The corpus directory is missing or produced no documents.
    #[error("No documents found in {path:?}")]
    NoDocumentsFound { path: PathBuf },

    /// A recognized file could not be parsed. Loaders skip these.
    #[error("Unsupported file {path:?}: {reason}")]
    UnsupportedFile { path: PathBuf, reason: String },

    /// The persistent index backend cannot be used in this environment.
    #[error("Index backend unavailable: {0}")]
    IndexBackendUnavailable(String),

    /// Neither index location holds a usable index.
    #[error("No index found (looked in {persistent:?} and {snapshot:?})")]
    NoIndexFound {
        persistent: PathBuf,
        snapshot: PathBuf,
    },

    /// The embedder failed or returned vectors of the wrong shape.
    #[error("Embedding failed (model '{model}'): {reason}")]
    EmbeddingFailed { model: String, reason: String },

    /// An index was built with a different embedder than the one configured.
    #[error("Embedding model mismatch: index built with {found}, configured {expected}")]
    EmbeddingMismatch { expected: String, found: String },

    /// An opened index failed to answer a search.
    #[error("Retrieval failed ({backend} index): {reason}")]
    RetrievalFailed { backend: String, reason: String },

    /// The generative model call failed for one question.
    #[error("Generation failed (model '{model}'): {reason}")]
    GenerationFailed { model: String, reason: String },

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether this failure only affects the question being answered.
    ///
    /// Session loops keep running after these; everything else means the
    /// loaded index or configuration can no longer be trusted.
    pub fn is_query_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::GenerationFailed { .. }
                | AppError::EmbeddingFailed { .. }
                | AppError::RetrievalFailed { .. }
                | AppError::Llm(_)
                | AppError::Prompt(_)
        )
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_recoverable_errors() {
        let generation = AppError::GenerationFailed {
            model: "llama-3.1-8b-instant".to_string(),
            reason: "timeout".to_string(),
        };
        assert!(generation.is_query_recoverable());

        let retrieval = AppError::RetrievalFailed {
            backend: "lancedb".to_string(),
            reason: "io error".to_string(),
        };
        assert!(retrieval.is_query_recoverable());

        let missing = AppError::NoIndexFound {
            persistent: PathBuf::from("lance_db"),
            snapshot: PathBuf::from("vector_db"),
        };
        assert!(!missing.is_query_recoverable());
    }

    #[test]
    fn test_error_messages_carry_context() {
        let err = AppError::NoDocumentsFound {
            path: PathBuf::from("data"),
        };
        assert!(err.to_string().contains("data"));

        let err = AppError::EmbeddingFailed {
            model: "all-minilm".to_string(),
            reason: "connection refused".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("all-minilm"));
        assert!(message.contains("connection refused"));
    }
}
