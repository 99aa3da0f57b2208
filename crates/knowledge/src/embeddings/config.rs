//! Embedding identity recorded with every index.

use hipaa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Provider, model and dimensionality of an embedding space.
///
/// Vectors from two different fingerprints are not comparable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmbeddingFingerprint {
    pub provider: String,
    pub model: String,
    pub dimensions: usize,
}

impl EmbeddingFingerprint {
    /// Check that an index built as `self` can be queried with `configured`.
    pub fn validate_consistency(&self, configured: &Self) -> AppResult<()> {
        if self != configured {
            return Err(AppError::EmbeddingMismatch {
                expected: configured.to_string(),
                found: self.to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for EmbeddingFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({} dims)", self.provider, self.model, self.dimensions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fingerprint(model: &str, dimensions: usize) -> EmbeddingFingerprint {
        EmbeddingFingerprint {
            provider: "ollama".to_string(),
            model: model.to_string(),
            dimensions,
        }
    }

    #[test]
    fn test_validate_consistency_success() {
        let built = fingerprint("all-minilm", 384);
        assert!(built.validate_consistency(&built.clone()).is_ok());
    }

    #[test]
    fn test_validate_consistency_model_mismatch() {
        let built = fingerprint("all-minilm", 384);
        let configured = fingerprint("nomic-embed-text", 768);

        match built.validate_consistency(&configured) {
            Err(AppError::EmbeddingMismatch { expected, found }) => {
                assert!(expected.contains("nomic-embed-text"));
                assert!(found.contains("all-minilm"));
            }
            other => panic!("Expected EmbeddingMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_consistency_dimension_mismatch() {
        let built = fingerprint("all-minilm", 384);
        assert!(built
            .validate_consistency(&fingerprint("all-minilm", 256))
            .is_err());
    }
}
