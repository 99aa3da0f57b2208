//! Retrieval-augmented question answering over a document corpus.
//!
//! Build phase: [`loader`] → [`chunker`] → [`embeddings`] → [`builder`],
//! producing a LanceDB index or, when LanceDB is unusable, a JSON snapshot.
//! Query phase: [`selector`] → [`retriever`] → [`rag`], wrapped by the
//! build-once [`service::QaService`].

pub mod builder;
pub mod chunker;
pub mod config;
pub mod embeddings;
pub mod lancedb_index;
pub mod loader;
pub mod manifest;
pub mod probe;
pub mod rag;
pub mod retriever;
pub mod selector;
pub mod service;
pub mod snapshot_index;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use builder::{BuiltIndex, IndexBuilder};
pub use config::{ChunkSettings, IndexLocations};
pub use embeddings::{EmbeddingEngine, EmbeddingFingerprint, EmbeddingProvider};
pub use manifest::IndexManifest;
pub use probe::{BackendProbe, DisabledProbe, LanceDbProbe};
pub use rag::{QaOrchestrator, QaResult, SourceRef};
pub use retriever::Retriever;
pub use selector::{BackendSelector, OpenedIndex};
pub use service::QaService;
pub use types::{BackendKind, BuildReport, Chunk, RawDocument, RetrievalResult, ScoredChunk};
pub use vector_index::VectorIndex;

use embeddings::shared_provider;
use hipaa_core::{AppConfig, AppError, AppResult};
use serde::Serialize;
use std::path::PathBuf;

/// Result of [`build_index`].
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum BuildOutcome {
    Built(BuildReport),

    /// An index already exists and no rebuild was requested
    #[serde(rename_all = "camelCase")]
    Skipped {
        backend: BackendKind,
        index_dir: PathBuf,
    },
}

/// Build the index for the configured corpus.
///
/// Skips when either location already holds an index, unless `force`. A
/// forced rebuild only replaces the existing index once the new one is
/// complete.
pub async fn build_index(config: &AppConfig, force: bool) -> AppResult<BuildOutcome> {
    let locations = IndexLocations::from_config(config);

    if !force {
        for kind in [BackendKind::Persistent, BackendKind::Snapshot] {
            if locations.has_index(kind) {
                tracing::info!(
                    "Index already exists at {:?}, skipping build",
                    locations.path_for(kind)
                );
                return Ok(BuildOutcome::Skipped {
                    backend: kind,
                    index_dir: locations.path_for(kind).to_path_buf(),
                });
            }
        }
    }

    let engine = EmbeddingEngine::new(shared_provider(&config.embedding)?);
    let builder = IndexBuilder::new(
        locations,
        ChunkSettings::from(&config.index),
        engine,
        probe::probe_for(&config.index),
    );

    let built = builder.build(&config.corpus_dir()).await?;
    Ok(BuildOutcome::Built(built.report))
}

/// One index location on disk.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationStatus {
    pub path: PathBuf,
    pub populated: bool,
}

/// What is on disk and what would be opened for querying.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStatus {
    pub persistent: LocationStatus,
    pub snapshot: LocationStatus,

    /// Backend the selector opens, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<BackendKind>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<IndexManifest>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_count: Option<usize>,

    /// Why no index could be opened, when one exists but is unusable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Inspect both index locations and try to open one the way serving would.
pub async fn index_status(config: &AppConfig) -> AppResult<IndexStatus> {
    let locations = IndexLocations::from_config(config);
    let location = |kind: BackendKind| LocationStatus {
        path: locations.path_for(kind).to_path_buf(),
        populated: locations.has_index(kind),
    };

    let mut status = IndexStatus {
        persistent: location(BackendKind::Persistent),
        snapshot: location(BackendKind::Snapshot),
        active: None,
        manifest: None,
        chunk_count: None,
        error: None,
    };

    let fingerprint = shared_provider(&config.embedding)?.fingerprint();
    match BackendSelector::new(locations.clone(), fingerprint).open().await {
        Ok(opened) => {
            status.chunk_count = Some(opened.index.count().await?);
            status.active = Some(opened.backend);
            status.manifest = Some(opened.manifest);
        }
        Err(AppError::NoIndexFound { .. }) if !locations.any_built() => {}
        Err(e) => status.error = Some(e.to_string()),
    }

    Ok(status)
}
