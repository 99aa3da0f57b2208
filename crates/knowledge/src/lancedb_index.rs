//! LanceDB-backed persistent index.
//!
//! One table, `chunks`, holding provenance, text and a fixed-size embedding
//! per row. Search is LanceDB nearest-neighbour with cosine distance.

use crate::types::{BackendKind, Chunk, ScoredChunk};
use crate::vector_index::{check_query_dimensions, sort_by_score, VectorIndex};
use arrow_array::{
    Array, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray,
    UInt32Array,
};
use arrow_schema::{DataType, Field, Schema};
use async_trait::async_trait;
use futures::TryStreamExt;
use hipaa_core::{AppError, AppResult};
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, DistanceType, Table};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const TABLE_NAME: &str = "chunks";

const DISTANCE_COLUMN: &str = "_distance";

/// Persistent vector index for chunks.
pub struct LanceDbIndex {
    table: Table,
    dimensions: usize,
    path: PathBuf,
}

impl LanceDbIndex {
    /// Write a new table at `db_path` holding `chunks` and their embeddings.
    ///
    /// Failures are reported as [`AppError::IndexBackendUnavailable`] so the
    /// builder can fall back to the snapshot backend.
    pub async fn create(
        db_path: &Path,
        dimensions: usize,
        chunks: &[Chunk],
        embeddings: &[Vec<f32>],
    ) -> AppResult<Self> {
        let schema = Self::create_schema(dimensions);
        let batch = Self::chunks_to_batch(schema.clone(), dimensions, chunks, embeddings)?;

        let conn = connect(db_path).await?;
        let table = conn
            .create_table(
                TABLE_NAME,
                RecordBatchIterator::new(vec![Ok(batch)], schema),
            )
            .execute()
            .await
            .map_err(|e| unavailable(format!("failed to create table: {}", e)))?;

        tracing::debug!(
            "Created LanceDB table at {:?} with {} chunks",
            db_path,
            chunks.len()
        );

        Ok(Self {
            table,
            dimensions,
            path: db_path.to_path_buf(),
        })
    }

    /// Open an existing table. Dimensions are read from the table schema.
    pub async fn open(db_path: &Path) -> AppResult<Self> {
        let conn = connect(db_path).await?;

        let table_names = conn
            .table_names()
            .execute()
            .await
            .map_err(|e| unavailable(format!("failed to list tables: {}", e)))?;

        if !table_names.iter().any(|name| name == TABLE_NAME) {
            return Err(unavailable(format!(
                "no '{}' table in {:?}",
                TABLE_NAME, db_path
            )));
        }

        let table = conn
            .open_table(TABLE_NAME)
            .execute()
            .await
            .map_err(|e| unavailable(format!("failed to open table: {}", e)))?;

        let schema = table
            .schema()
            .await
            .map_err(|e| unavailable(format!("failed to read table schema: {}", e)))?;

        let dimensions = match schema.field_with_name("embedding").map(|f| f.data_type()) {
            Ok(DataType::FixedSizeList(_, size)) if *size > 0 => *size as usize,
            _ => {
                return Err(unavailable(format!(
                    "table in {:?} has no fixed-size embedding column",
                    db_path
                )))
            }
        };

        tracing::debug!("Opened LanceDB index at {:?} ({} dims)", db_path, dimensions);

        Ok(Self {
            table,
            dimensions,
            path: db_path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn create_schema(dimensions: usize) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("source_path", DataType::Utf8, false),
            Field::new("page", DataType::UInt32, true),
            Field::new("sequence_index", DataType::UInt32, false),
            Field::new("text", DataType::Utf8, false),
            Field::new(
                "embedding",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    dimensions as i32,
                ),
                false,
            ),
        ]))
    }

    fn chunks_to_batch(
        schema: Arc<Schema>,
        dimensions: usize,
        chunks: &[Chunk],
        embeddings: &[Vec<f32>],
    ) -> AppResult<RecordBatch> {
        if chunks.len() != embeddings.len() {
            return Err(AppError::Knowledge(format!(
                "Got {} embeddings for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let mut values = Vec::with_capacity(chunks.len() * dimensions);
        for embedding in embeddings {
            check_query_dimensions(dimensions, embedding)?;
            values.extend_from_slice(embedding);
        }

        let embedding_array = FixedSizeListArray::try_new(
            Arc::new(Field::new("item", DataType::Float32, true)),
            dimensions as i32,
            Arc::new(Float32Array::from(values)),
            None,
        )
        .map_err(|e| AppError::Knowledge(format!("Failed to create embedding array: {}", e)))?;

        let ids = StringArray::from(chunks.iter().map(|c| c.id.as_str()).collect::<Vec<_>>());
        let source_paths = StringArray::from(
            chunks
                .iter()
                .map(|c| c.source_path.to_string_lossy().to_string())
                .collect::<Vec<_>>(),
        );
        let pages = UInt32Array::from(chunks.iter().map(|c| c.page).collect::<Vec<_>>());
        let positions =
            UInt32Array::from(chunks.iter().map(|c| c.sequence_index).collect::<Vec<_>>());
        let texts = StringArray::from(chunks.iter().map(|c| c.text.as_str()).collect::<Vec<_>>());

        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(ids),
                Arc::new(source_paths),
                Arc::new(pages),
                Arc::new(positions),
                Arc::new(texts),
                Arc::new(embedding_array),
            ],
        )
        .map_err(|e| AppError::Knowledge(format!("Failed to create RecordBatch: {}", e)))
    }

    fn batch_to_chunk(batch: &RecordBatch, row_idx: usize) -> AppResult<Chunk> {
        let pages = column::<UInt32Array>(batch, "page")?;
        let page = if pages.is_null(row_idx) {
            None
        } else {
            Some(pages.value(row_idx))
        };

        Ok(Chunk {
            id: column::<StringArray>(batch, "id")?.value(row_idx).to_string(),
            text: column::<StringArray>(batch, "text")?
                .value(row_idx)
                .to_string(),
            source_path: PathBuf::from(
                column::<StringArray>(batch, "source_path")?.value(row_idx),
            ),
            page,
            sequence_index: column::<UInt32Array>(batch, "sequence_index")?.value(row_idx),
        })
    }
}

#[async_trait]
impl VectorIndex for LanceDbIndex {
    fn kind(&self) -> BackendKind {
        BackendKind::Persistent
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn count(&self) -> AppResult<usize> {
        self.table
            .count_rows(None)
            .await
            .map_err(|e| retrieval_failed(format!("failed to count rows: {}", e)))
    }

    async fn search(&self, query_embedding: &[f32], top_k: usize) -> AppResult<Vec<ScoredChunk>> {
        check_query_dimensions(self.dimensions, query_embedding)?;
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let batches = self
            .table
            .query()
            .nearest_to(query_embedding.to_vec())
            .map_err(|e| retrieval_failed(format!("failed to create query: {}", e)))?
            .distance_type(DistanceType::Cosine)
            .limit(top_k)
            .execute()
            .await
            .map_err(|e| retrieval_failed(format!("failed to execute search: {}", e)))?
            .try_collect::<Vec<RecordBatch>>()
            .await
            .map_err(|e| retrieval_failed(format!("failed to collect results: {}", e)))?;

        let mut results = Vec::new();
        for batch in &batches {
            let distances = column::<Float32Array>(batch, DISTANCE_COLUMN)?;
            for row_idx in 0..batch.num_rows() {
                results.push(ScoredChunk {
                    chunk: Self::batch_to_chunk(batch, row_idx)?,
                    // Cosine distance is 1 - similarity
                    score: 1.0 - distances.value(row_idx),
                });
            }
        }

        sort_by_score(&mut results);
        results.truncate(top_k);

        tracing::debug!(
            "Retrieved {} chunks from LanceDB (requested top-{})",
            results.len(),
            top_k
        );

        Ok(results)
    }
}

async fn connect(db_path: &Path) -> AppResult<Connection> {
    let uri = db_path.to_string_lossy().to_string();
    lancedb::connect(&uri)
        .execute()
        .await
        .map_err(|e| unavailable(format!("failed to connect to LanceDB at {}: {}", uri, e)))
}

fn unavailable(reason: String) -> AppError {
    AppError::IndexBackendUnavailable(reason)
}

fn retrieval_failed(reason: String) -> AppError {
    AppError::RetrievalFailed {
        backend: BackendKind::Persistent.to_string(),
        reason,
    }
}

fn column<'a, T: Array + 'static>(batch: &'a RecordBatch, name: &str) -> AppResult<&'a T> {
    batch
        .column_by_name(name)
        .and_then(|column| column.as_any().downcast_ref::<T>())
        .ok_or_else(|| retrieval_failed(format!("invalid {} column in search results", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn chunk(id: &str, text: &str, page: Option<u32>) -> Chunk {
        Chunk {
            id: id.to_string(),
            text: text.to_string(),
            source_path: PathBuf::from("/corpus/privacy.pdf"),
            page,
            sequence_index: 0,
        }
    }

    #[tokio::test]
    async fn test_create_open_and_search() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("lance_db");
        let chunks = vec![
            chunk("a", "privacy", Some(1)),
            chunk("b", "security", None),
            chunk("c", "breach", Some(3)),
        ];
        let embeddings = vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.7, 0.7, 0.0],
        ];

        let created = LanceDbIndex::create(&path, 3, &chunks, &embeddings)
            .await
            .unwrap();
        assert_eq!(created.count().await.unwrap(), 3);
        drop(created);

        let index = LanceDbIndex::open(&path).await.unwrap();
        assert_eq!(index.dimensions(), 3);
        assert_eq!(index.kind(), BackendKind::Persistent);

        let results = index.search(&[1.0, 0.0, 0.0], 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk, chunks[0]);
        assert!((results[0].score - 1.0).abs() < 1e-4);
        assert_eq!(results[1].chunk.id, "c");
        assert!(results[0].score >= results[1].score);
    }

    #[tokio::test]
    async fn test_open_missing_table_is_unavailable() {
        let temp = TempDir::new().unwrap();
        let result = LanceDbIndex::open(temp.path()).await;
        assert!(matches!(result, Err(AppError::IndexBackendUnavailable(_))));
    }

    #[tokio::test]
    async fn test_query_dimension_mismatch() {
        let temp = TempDir::new().unwrap();
        let index = LanceDbIndex::create(
            &temp.path().join("db"),
            2,
            &[chunk("a", "privacy", None)],
            &[vec![1.0, 0.0]],
        )
        .await
        .unwrap();

        let result = index.search(&[1.0, 0.0, 0.0], 1).await;
        assert!(matches!(result, Err(AppError::EmbeddingMismatch { .. })));
    }
}
