//! Query-time backend selection.

use crate::config::IndexLocations;
use crate::embeddings::EmbeddingFingerprint;
use crate::lancedb_index::LanceDbIndex;
use crate::manifest::IndexManifest;
use crate::snapshot_index::SnapshotIndex;
use crate::types::BackendKind;
use crate::vector_index::VectorIndex;
use hipaa_core::{AppError, AppResult};
use std::sync::Arc;

/// An index opened for querying.
pub struct OpenedIndex {
    pub index: Arc<dyn VectorIndex>,
    pub backend: BackendKind,
    pub manifest: IndexManifest,
}

/// Opens whichever built index is usable, persistent first.
///
/// Any failure opening the persistent index falls through to the snapshot,
/// except an embedding mismatch: an index built with another model must
/// never be queried, so that is raised.
pub struct BackendSelector {
    locations: IndexLocations,
    expected: EmbeddingFingerprint,
}

impl BackendSelector {
    pub fn new(locations: IndexLocations, expected: EmbeddingFingerprint) -> Self {
        Self {
            locations,
            expected,
        }
    }

    pub async fn open(&self) -> AppResult<OpenedIndex> {
        if self.locations.has_index(BackendKind::Persistent) {
            match self.open_persistent().await {
                Ok(opened) => return Ok(opened),
                Err(e @ AppError::EmbeddingMismatch { .. }) => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        "Could not open persistent index at {:?}, trying snapshot: {}",
                        self.locations.persistent,
                        e
                    );
                }
            }
        }

        if self.locations.has_index(BackendKind::Snapshot) {
            return self.open_snapshot();
        }

        Err(AppError::NoIndexFound {
            persistent: self.locations.persistent.clone(),
            snapshot: self.locations.snapshot.clone(),
        })
    }

    async fn open_persistent(&self) -> AppResult<OpenedIndex> {
        let dir = &self.locations.persistent;
        let manifest = self.read_manifest(BackendKind::Persistent)?;

        let index = LanceDbIndex::open(dir).await?;
        if index.dimensions() != manifest.embedding.dimensions {
            return Err(AppError::Knowledge(format!(
                "Table in {:?} has {} dimensions but its manifest records {}",
                dir,
                index.dimensions(),
                manifest.embedding.dimensions
            )));
        }

        tracing::info!("Opened persistent index at {:?}", dir);
        Ok(OpenedIndex {
            index: Arc::new(index),
            backend: BackendKind::Persistent,
            manifest,
        })
    }

    fn open_snapshot(&self) -> AppResult<OpenedIndex> {
        let dir = &self.locations.snapshot;
        let manifest = self.read_manifest(BackendKind::Snapshot)?;
        let index = SnapshotIndex::load(dir, manifest.embedding.dimensions)?;

        tracing::info!("Loaded snapshot index from {:?}", dir);
        Ok(OpenedIndex {
            index: Arc::new(index),
            backend: BackendKind::Snapshot,
            manifest,
        })
    }

    fn read_manifest(&self, kind: BackendKind) -> AppResult<IndexManifest> {
        let dir = self.locations.path_for(kind);
        let manifest = IndexManifest::read(dir)?;

        if manifest.backend != kind {
            return Err(AppError::Knowledge(format!(
                "Index at {:?} was written by the {} backend",
                dir, manifest.backend
            )));
        }

        manifest.embedding.validate_consistency(&self.expected)?;
        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::FORMAT_VERSION;
    use crate::types::Chunk;
    use chrono::Utc;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn fingerprint(dimensions: usize) -> EmbeddingFingerprint {
        EmbeddingFingerprint {
            provider: "hashed".to_string(),
            model: "trigram-v1".to_string(),
            dimensions,
        }
    }

    fn locations(root: &Path) -> IndexLocations {
        IndexLocations::new(root.join("lance_db"), root.join("vector_db"))
    }

    fn write_snapshot(dir: &Path, dimensions: usize) {
        let chunk = Chunk {
            id: "c0".to_string(),
            text: "privacy".to_string(),
            source_path: PathBuf::from("a.txt"),
            page: None,
            sequence_index: 0,
        };
        SnapshotIndex::write(dir, dimensions, &[chunk], &[vec![1.0; dimensions]]).unwrap();
        IndexManifest {
            format_version: FORMAT_VERSION,
            backend: BackendKind::Snapshot,
            embedding: fingerprint(dimensions),
            chunk_size: 500,
            chunk_overlap: 100,
            source_count: 1,
            chunk_count: 1,
            built_at: Utc::now(),
        }
        .write(dir)
        .unwrap();
    }

    #[tokio::test]
    async fn test_no_index_found() {
        let temp = TempDir::new().unwrap();
        let selector = BackendSelector::new(locations(temp.path()), fingerprint(4));
        assert!(matches!(
            selector.open().await,
            Err(AppError::NoIndexFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_broken_persistent_falls_through_to_snapshot() {
        let temp = TempDir::new().unwrap();
        let locations = locations(temp.path());
        fs::create_dir_all(&locations.persistent).unwrap();
        fs::write(locations.persistent.join("garbage"), "not a table").unwrap();
        write_snapshot(&locations.snapshot, 4);

        let opened = BackendSelector::new(locations, fingerprint(4))
            .open()
            .await
            .unwrap();
        assert_eq!(opened.backend, BackendKind::Snapshot);
        assert_eq!(opened.index.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_embedding_mismatch_is_raised() {
        let temp = TempDir::new().unwrap();
        let locations = locations(temp.path());
        write_snapshot(&locations.snapshot, 4);

        let result = BackendSelector::new(locations, fingerprint(8)).open().await;
        assert!(matches!(result, Err(AppError::EmbeddingMismatch { .. })));
    }

    #[tokio::test]
    async fn test_empty_directories_are_not_indexes() {
        let temp = TempDir::new().unwrap();
        let locations = locations(temp.path());
        fs::create_dir_all(&locations.persistent).unwrap();
        fs::create_dir_all(&locations.snapshot).unwrap();

        let result = BackendSelector::new(locations, fingerprint(4)).open().await;
        assert!(matches!(result, Err(AppError::NoIndexFound { .. })));
    }
}
