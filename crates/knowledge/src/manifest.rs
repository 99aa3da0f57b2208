//! Build manifest stored in every index directory.

use crate::embeddings::EmbeddingFingerprint;
use crate::types::BackendKind;
use chrono::{DateTime, Utc};
use hipaa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const MANIFEST_FILE: &str = "manifest.json";

/// Bumped when the on-disk layout of either backend changes.
pub const FORMAT_VERSION: u32 = 1;

/// What an index was built from and with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IndexManifest {
    pub format_version: u32,
    pub backend: BackendKind,
    pub embedding: EmbeddingFingerprint,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub source_count: usize,
    pub chunk_count: usize,
    pub built_at: DateTime<Utc>,
}

impl IndexManifest {
    pub fn write(&self, dir: &Path) -> AppResult<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::Serialization(format!("Failed to serialize manifest: {}", e)))?;
        fs::write(dir.join(MANIFEST_FILE), json)?;
        Ok(())
    }

    pub fn read(dir: &Path) -> AppResult<Self> {
        let path = dir.join(MANIFEST_FILE);
        let contents = fs::read_to_string(&path).map_err(|e| {
            AppError::Knowledge(format!("Failed to read index manifest {:?}: {}", path, e))
        })?;

        let manifest: Self = serde_json::from_str(&contents).map_err(|e| {
            AppError::Serialization(format!("Failed to parse index manifest {:?}: {}", path, e))
        })?;

        if manifest.format_version != FORMAT_VERSION {
            return Err(AppError::Knowledge(format!(
                "Index at {:?} has format version {}, expected {}. Rebuild with --force.",
                dir, manifest.format_version, FORMAT_VERSION
            )));
        }

        Ok(manifest)
    }
}
