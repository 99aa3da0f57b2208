//! Index locations and build settings derived from the application config.

use crate::types::BackendKind;
use hipaa_core::config::IndexSettings;
use hipaa_core::AppConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// The two well-known index directories.
///
/// A location holds a usable index when it exists and is non-empty. Builds
/// publish by renaming a fully written staging directory into place, so a
/// reader never sees a partial index at either path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexLocations {
    pub persistent: PathBuf,
    pub snapshot: PathBuf,
}

impl IndexLocations {
    pub fn new(persistent: impl Into<PathBuf>, snapshot: impl Into<PathBuf>) -> Self {
        Self {
            persistent: persistent.into(),
            snapshot: snapshot.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.persistent_index_dir(), config.snapshot_index_dir())
    }

    pub fn path_for(&self, kind: BackendKind) -> &Path {
        match kind {
            BackendKind::Persistent => &self.persistent,
            BackendKind::Snapshot => &self.snapshot,
        }
    }

    pub fn has_index(&self, kind: BackendKind) -> bool {
        is_populated(self.path_for(kind))
    }

    /// Whether either location holds an index.
    pub fn any_built(&self) -> bool {
        self.has_index(BackendKind::Persistent) || self.has_index(BackendKind::Snapshot)
    }
}

/// Chunking geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSettings {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for ChunkSettings {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            overlap: 100,
        }
    }
}

impl From<&IndexSettings> for ChunkSettings {
    fn from(settings: &IndexSettings) -> Self {
        Self {
            chunk_size: settings.chunk_size,
            overlap: settings.chunk_overlap,
        }
    }
}

/// Whether `path` is a directory with at least one entry.
pub fn is_populated(path: &Path) -> bool {
    fs::read_dir(path)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_directory_is_not_an_index() {
        let temp = TempDir::new().unwrap();
        let locations = IndexLocations::new(temp.path().join("lance_db"), temp.path().join("vector_db"));
        assert!(!locations.any_built());

        fs::create_dir_all(&locations.snapshot).unwrap();
        assert!(!locations.has_index(BackendKind::Snapshot));

        fs::write(locations.snapshot.join("manifest.json"), "{}").unwrap();
        assert!(locations.has_index(BackendKind::Snapshot));
        assert!(locations.any_built());
    }

    #[test]
    fn test_chunk_settings_from_index_settings() {
        let settings = ChunkSettings::from(&IndexSettings::default());
        assert_eq!(settings, ChunkSettings::default());
    }
}
