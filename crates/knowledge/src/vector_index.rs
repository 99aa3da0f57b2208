//! Vector index abstraction.
//!
//! Both backends implement the same read-only search contract; building is
//! backend-specific and happens in [`crate::builder`].

use crate::types::{BackendKind, ScoredChunk};
use async_trait::async_trait;
use hipaa_core::{AppError, AppResult};

/// An opened, fully built index.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Backend holding this index.
    fn kind(&self) -> BackendKind;

    /// Length of every stored embedding.
    fn dimensions(&self) -> usize;

    /// Number of indexed chunks.
    async fn count(&self) -> AppResult<usize>;

    /// Search for the `top_k` chunks most similar to the query embedding.
    ///
    /// Returns at most `top_k` chunks ordered by descending cosine similarity.
    async fn search(&self, query_embedding: &[f32], top_k: usize) -> AppResult<Vec<ScoredChunk>>;
}

/// Reject query vectors from a different embedding space.
pub(crate) fn check_query_dimensions(expected: usize, query: &[f32]) -> AppResult<()> {
    if query.len() != expected {
        return Err(AppError::EmbeddingMismatch {
            expected: format!("{} dimensions", expected),
            found: format!("{} dimensions", query.len()),
        });
    }
    Ok(())
}

/// Order best first. Equal scores keep their incoming order.
pub(crate) fn sort_by_score(results: &mut [ScoredChunk]) {
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Calculate cosine similarity between two vectors.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
