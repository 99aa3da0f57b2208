//! Query-time retrieval.

use crate::embeddings::EmbeddingEngine;
use crate::types::{BackendKind, RetrievalResult};
use crate::vector_index::VectorIndex;
use hipaa_core::AppResult;
use std::sync::Arc;

/// Default number of chunks retrieved per question.
pub const DEFAULT_TOP_K: usize = 4;

/// Embeds questions with the build-time embedder and searches an opened index.
#[derive(Clone)]
pub struct Retriever {
    index: Arc<dyn VectorIndex>,
    engine: EmbeddingEngine,
    top_k: usize,
}

impl Retriever {
    pub fn new(index: Arc<dyn VectorIndex>, engine: EmbeddingEngine, top_k: usize) -> Self {
        Self {
            index,
            engine,
            top_k,
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn backend(&self) -> BackendKind {
        self.index.kind()
    }

    pub async fn retrieve(&self, query: &str) -> AppResult<RetrievalResult> {
        self.retrieve_k(query, self.top_k).await
    }

    /// Top `k` chunks for `query`, best first. Chunks from the same source
    /// are not deduplicated.
    pub async fn retrieve_k(&self, query: &str, k: usize) -> AppResult<RetrievalResult> {
        let query_embedding = self.engine.embed_query(query).await?;
        let results = self.index.search(&query_embedding, k).await?;

        tracing::debug!(
            "Retrieved {} chunks for query (k={}, top score {:.3})",
            results.len(),
            k,
            results.first().map(|r| r.score).unwrap_or(0.0)
        );

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::hashed::HashedProvider;
    use crate::snapshot_index::SnapshotIndex;
    use crate::types::Chunk;
    use std::path::PathBuf;
    use tempfile::TempDir;

    async fn retriever(texts: &[&str], top_k: usize) -> (TempDir, Retriever) {
        let temp = TempDir::new().unwrap();
        let engine = EmbeddingEngine::new(Arc::new(HashedProvider::new(128)));
        let chunks: Vec<Chunk> = texts
            .iter()
            .enumerate()
            .map(|(i, text)| Chunk {
                id: format!("c{}", i),
                text: text.to_string(),
                source_path: PathBuf::from("rules.txt"),
                page: None,
                sequence_index: i as u32,
            })
            .collect();
        let owned: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
        let embeddings = engine.embed_texts(&owned).await.unwrap();
        let index = SnapshotIndex::write(temp.path(), 128, &chunks, &embeddings).unwrap();
        (temp, Retriever::new(Arc::new(index), engine, top_k))
    }

    #[tokio::test]
    async fn test_retrieve_uses_default_k() {
        let (_temp, retriever) = retriever(
            &[
                "privacy rule",
                "security rule",
                "breach notification",
                "enforcement penalties",
                "transactions and code sets",
            ],
            DEFAULT_TOP_K,
        )
        .await;

        let results = retriever.retrieve("penalties for enforcement").await.unwrap();
        assert_eq!(results.len(), 4);
        assert_eq!(results[0].chunk.text, "enforcement penalties");
        assert_eq!(retriever.backend(), BackendKind::Snapshot);
    }

    #[tokio::test]
    async fn test_duplicates_are_kept() {
        let (_temp, retriever) =
            retriever(&["minimum necessary standard", "minimum necessary standard"], 2).await;

        let results = retriever.retrieve("minimum necessary").await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.text, results[1].chunk.text);
    }
}
