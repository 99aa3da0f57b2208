//! Index building.
//!
//! Load → split → embed once → write to the persistent backend when the probe
//! allows it, otherwise to the snapshot backend. Either way the index is
//! written into a hidden staging directory next to its final location and
//! renamed into place only once complete.

use crate::chunker::split_documents;
use crate::config::{ChunkSettings, IndexLocations};
use crate::embeddings::EmbeddingEngine;
use crate::lancedb_index::LanceDbIndex;
use crate::loader::load_documents;
use crate::manifest::{IndexManifest, FORMAT_VERSION};
use crate::probe::BackendProbe;
use crate::snapshot_index::SnapshotIndex;
use crate::types::{BackendKind, BuildReport, Chunk};
use crate::vector_index::VectorIndex;
use chrono::Utc;
use hipaa_core::{AppError, AppResult};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// A freshly built and published index.
pub struct BuiltIndex {
    pub index: Arc<dyn VectorIndex>,
    pub manifest: IndexManifest,
    pub report: BuildReport,
}

pub struct IndexBuilder {
    locations: IndexLocations,
    chunking: ChunkSettings,
    engine: EmbeddingEngine,
    probe: Arc<dyn BackendProbe>,
}

impl IndexBuilder {
    pub fn new(
        locations: IndexLocations,
        chunking: ChunkSettings,
        engine: EmbeddingEngine,
        probe: Arc<dyn BackendProbe>,
    ) -> Self {
        Self {
            locations,
            chunking,
            engine,
            probe,
        }
    }

    /// Build an index from every supported file in `corpus_dir`.
    ///
    /// Nothing is written unless the corpus yields at least one document.
    pub async fn build(&self, corpus_dir: &Path) -> AppResult<BuiltIndex> {
        tracing::info!("Building index from {:?}", corpus_dir);

        let documents = load_documents(corpus_dir)?;
        let chunks = split_documents(&documents, self.chunking)?;

        tracing::info!(
            "Split {} documents into {} chunks (size {}, overlap {})",
            documents.len(),
            chunks.len(),
            self.chunking.chunk_size,
            self.chunking.overlap
        );

        self.build_from_chunks(chunks).await
    }

    /// Embed `chunks` in one call and publish them to the best available backend.
    pub async fn build_from_chunks(&self, chunks: Vec<Chunk>) -> AppResult<BuiltIndex> {
        let start = Instant::now();

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.engine.embed_texts(&texts).await?;
        let dimensions = self.engine.dimensions();

        let (index, fallback_reason) = match self.probe.check().await {
            Ok(()) => match self.publish_persistent(dimensions, &chunks, &embeddings).await {
                Ok(index) => (index, None),
                Err(e) => {
                    tracing::warn!("Persistent index build failed, using snapshot backend: {}", e);
                    let index = self.publish_snapshot(dimensions, &chunks, &embeddings)?;
                    (index, Some(e.to_string()))
                }
            },
            Err(e) => {
                tracing::warn!("Persistent backend unavailable, using snapshot backend: {}", e);
                let index = self.publish_snapshot(dimensions, &chunks, &embeddings)?;
                (index, Some(e.to_string()))
            }
        };

        let backend = index.kind();

        // A stale index at the other location would shadow or outlive this one
        let other = match backend {
            BackendKind::Persistent => BackendKind::Snapshot,
            BackendKind::Snapshot => BackendKind::Persistent,
        };
        remove_dir_if_exists(self.locations.path_for(other))?;

        let manifest = self.manifest(backend, &chunks);
        let documents_count = chunks
            .iter()
            .map(|c| (&c.source_path, c.page))
            .collect::<HashSet<_>>()
            .len();

        let report = BuildReport {
            backend,
            fallback_reason,
            index_dir: self.locations.path_for(backend).to_path_buf(),
            documents_count,
            sources_count: manifest.source_count,
            chunks_count: chunks.len(),
            dimensions,
            duration_secs: start.elapsed().as_secs_f64(),
        };

        tracing::info!(
            "Built {} index with {} chunks from {} sources in {:.2}s",
            backend,
            report.chunks_count,
            report.sources_count,
            report.duration_secs
        );

        Ok(BuiltIndex {
            index,
            manifest,
            report,
        })
    }

    fn manifest(&self, backend: BackendKind, chunks: &[Chunk]) -> IndexManifest {
        IndexManifest {
            format_version: FORMAT_VERSION,
            backend,
            embedding: self.engine.fingerprint(),
            chunk_size: self.chunking.chunk_size,
            chunk_overlap: self.chunking.overlap,
            source_count: chunks
                .iter()
                .map(|c| &c.source_path)
                .collect::<HashSet<_>>()
                .len(),
            chunk_count: chunks.len(),
            built_at: Utc::now(),
        }
    }

    async fn publish_persistent(
        &self,
        dimensions: usize,
        chunks: &[Chunk],
        embeddings: &[Vec<f32>],
    ) -> AppResult<Arc<dyn VectorIndex>> {
        let target = &self.locations.persistent;
        let staging = staging_dir(target)?;

        let written = async {
            LanceDbIndex::create(&staging, dimensions, chunks, embeddings).await?;
            self.manifest(BackendKind::Persistent, chunks)
                .write(&staging)
        }
        .await;

        if let Err(e) = written.and_then(|_| publish(&staging, target)) {
            discard(&staging);
            return Err(e);
        }

        let index = LanceDbIndex::open(target).await?;
        Ok(Arc::new(index))
    }

    fn publish_snapshot(
        &self,
        dimensions: usize,
        chunks: &[Chunk],
        embeddings: &[Vec<f32>],
    ) -> AppResult<Arc<dyn VectorIndex>> {
        let target = &self.locations.snapshot;
        let staging = staging_dir(target)?;

        let written = SnapshotIndex::write(&staging, dimensions, chunks, embeddings).and_then(
            |index| {
                self.manifest(BackendKind::Snapshot, chunks)
                    .write(&staging)?;
                Ok(index)
            },
        );

        match written.and_then(|index| publish(&staging, target).map(|_| index)) {
            Ok(index) => Ok(Arc::new(index)),
            Err(e) => {
                discard(&staging);
                Err(e)
            }
        }
    }
}

/// Hidden sibling of `target` to build into.
fn staging_dir(target: &Path) -> AppResult<PathBuf> {
    let parent = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| AppError::Config(format!("Invalid index directory: {:?}", target)))?;

    Ok(parent.join(format!(".{}.staging-{}", name, Uuid::new_v4().simple())))
}

/// Move a complete staging directory to `target`, replacing any previous index.
///
/// The old index is renamed aside before the new one is renamed in, so
/// `target` is briefly absent between the two renames. A process opening the
/// index in that window sees no index and may start its own build; build as
/// a separate step before serving to avoid it. If the second rename fails
/// the old index is moved back.
fn publish(staging: &Path, target: &Path) -> AppResult<()> {
    let retired = if target.exists() {
        let retired = target.with_file_name(format!(
            ".{}.old-{}",
            target
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            Uuid::new_v4().simple()
        ));
        fs::rename(target, &retired)?;
        Some(retired)
    } else {
        None
    };

    if let Err(e) = fs::rename(staging, target) {
        if let Some(retired) = &retired {
            if let Err(restore) = fs::rename(retired, target) {
                tracing::error!("Failed to restore previous index {:?}: {}", target, restore);
            }
        }
        return Err(e.into());
    }

    if let Some(retired) = retired {
        discard(&retired);
    }

    tracing::debug!("Published index at {:?}", target);
    Ok(())
}

fn discard(path: &Path) {
    if let Err(e) = fs::remove_dir_all(path) {
        tracing::warn!("Failed to remove {:?}: {}", path, e);
    }
}

fn remove_dir_if_exists(path: &Path) -> AppResult<()> {
    if path.exists() {
        fs::remove_dir_all(path).map_err(|e| {
            AppError::Knowledge(format!("Failed to remove stale index {:?}: {}", path, e))
        })?;
        tracing::info!("Removed stale index at {:?}", path);
    }
    Ok(())
}
