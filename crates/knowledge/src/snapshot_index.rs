//! In-memory snapshot index.
//!
//! `chunks.json` holds every chunk with its embedding. The whole file is
//! loaded before use and searched exhaustively.

use crate::types::{BackendKind, Chunk, ScoredChunk};
use crate::vector_index::{check_query_dimensions, cosine_similarity, sort_by_score, VectorIndex};
use async_trait::async_trait;
use hipaa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CHUNKS_FILE: &str = "chunks.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SnapshotRecord {
    chunk: Chunk,
    embedding: Vec<f32>,
}

/// Snapshot index held entirely in memory.
#[derive(Debug)]
pub struct SnapshotIndex {
    records: Vec<SnapshotRecord>,
    dimensions: usize,
}

impl SnapshotIndex {
    /// Serialize chunks and embeddings into `dir` and keep them in memory.
    pub fn write(
        dir: &Path,
        dimensions: usize,
        chunks: &[Chunk],
        embeddings: &[Vec<f32>],
    ) -> AppResult<Self> {
        if chunks.len() != embeddings.len() {
            return Err(AppError::Knowledge(format!(
                "Got {} embeddings for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let records = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| {
                check_query_dimensions(dimensions, embedding)?;
                Ok(SnapshotRecord {
                    chunk: chunk.clone(),
                    embedding: embedding.clone(),
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        fs::create_dir_all(dir)?;
        let json = serde_json::to_string(&records)
            .map_err(|e| AppError::Serialization(format!("Failed to serialize snapshot: {}", e)))?;
        fs::write(dir.join(CHUNKS_FILE), json)?;

        tracing::debug!("Wrote snapshot of {} chunks to {:?}", records.len(), dir);

        Ok(Self {
            records,
            dimensions,
        })
    }

    /// Load a snapshot fully into memory.
    pub fn load(dir: &Path, dimensions: usize) -> AppResult<Self> {
        let path = dir.join(CHUNKS_FILE);
        let contents = fs::read_to_string(&path).map_err(|e| {
            AppError::Knowledge(format!("Failed to read snapshot {:?}: {}", path, e))
        })?;

        let records: Vec<SnapshotRecord> = serde_json::from_str(&contents).map_err(|e| {
            AppError::Serialization(format!("Failed to parse snapshot {:?}: {}", path, e))
        })?;

        if let Some(bad) = records.iter().find(|r| r.embedding.len() != dimensions) {
            return Err(AppError::Knowledge(format!(
                "Snapshot {:?} is corrupt: chunk {} has {} dimensions, expected {}",
                path,
                bad.chunk.id,
                bad.embedding.len(),
                dimensions
            )));
        }

        tracing::debug!("Loaded snapshot of {} chunks from {:?}", records.len(), dir);

        Ok(Self {
            records,
            dimensions,
        })
    }
}

#[async_trait]
impl VectorIndex for SnapshotIndex {
    fn kind(&self) -> BackendKind {
        BackendKind::Snapshot
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn count(&self) -> AppResult<usize> {
        Ok(self.records.len())
    }

    async fn search(&self, query_embedding: &[f32], top_k: usize) -> AppResult<Vec<ScoredChunk>> {
        check_query_dimensions(self.dimensions, query_embedding)?;

        let mut results: Vec<ScoredChunk> = self
            .records
            .iter()
            .map(|record| ScoredChunk {
                chunk: record.chunk.clone(),
                score: cosine_similarity(query_embedding, &record.embedding),
            })
            .collect();

        sort_by_score(&mut results);
        results.truncate(top_k);
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn chunks() -> Vec<Chunk> {
        ["privacy", "security", "breach"]
            .iter()
            .enumerate()
            .map(|(i, text)| Chunk {
                id: format!("id-{}", i),
                text: text.to_string(),
                source_path: PathBuf::from("rules.txt"),
                page: None,
                sequence_index: i as u32,
            })
            .collect()
    }

    fn embeddings() -> Vec<Vec<f32>> {
        vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.6, 0.8]]
    }

    #[tokio::test]
    async fn test_write_then_load_preserves_search() {
        let temp = TempDir::new().unwrap();
        let written = SnapshotIndex::write(temp.path(), 2, &chunks(), &embeddings()).unwrap();
        let loaded = SnapshotIndex::load(temp.path(), 2).unwrap();

        assert_eq!(loaded.count().await.unwrap(), 3);
        let query = [0.0, 1.0];
        assert_eq!(
            written.search(&query, 3).await.unwrap(),
            loaded.search(&query, 3).await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_search_orders_by_similarity() {
        let temp = TempDir::new().unwrap();
        let index = SnapshotIndex::write(temp.path(), 2, &chunks(), &embeddings()).unwrap();

        let results = index.search(&[0.0, 1.0], 2).await.unwrap();
        let texts: Vec<&str> = results.iter().map(|r| r.chunk.text.as_str()).collect();
        assert_eq!(texts, vec!["security", "breach"]);
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn test_k_larger_than_index() {
        let temp = TempDir::new().unwrap();
        let index = SnapshotIndex::write(temp.path(), 2, &chunks(), &embeddings()).unwrap();
        assert_eq!(index.search(&[1.0, 0.0], 10).await.unwrap().len(), 3);
    }

    #[test]
    fn test_load_rejects_wrong_dimensions() {
        let temp = TempDir::new().unwrap();
        SnapshotIndex::write(temp.path(), 2, &chunks(), &embeddings()).unwrap();
        assert!(SnapshotIndex::load(temp.path(), 3).is_err());
    }
}
