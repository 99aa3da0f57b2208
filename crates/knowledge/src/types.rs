//! Knowledge system type definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Text extracted from one file, or one page of a paginated file.
///
/// Produced by the loader and consumed only by the chunker.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    pub text: String,

    pub source_path: PathBuf,

    /// 1-based page number for paginated formats
    pub page: Option<u32>,
}

/// A bounded text window, the unit of embedding and retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Stable identifier derived from provenance and text
    pub id: String,

    pub text: String,

    pub source_path: PathBuf,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,

    /// Position of this window within its document
    pub sequence_index: u32,
}

impl Chunk {
    /// File name of the source, for display.
    pub fn source_name(&self) -> String {
        display_name(&self.source_path)
    }
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

/// A retrieved chunk with its cosine similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Ordered retrieval output: at most `k` entries, best first.
pub type RetrievalResult = Vec<ScoredChunk>;

/// Which index backend holds (or opened) an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// LanceDB table on disk
    Persistent,

    /// JSON snapshot loaded fully into memory
    Snapshot,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Persistent => "persistent",
            Self::Snapshot => "snapshot",
        }
    }

    /// Storage engine behind the backend, for operator-facing output.
    pub fn engine(&self) -> &'static str {
        match self {
            Self::Persistent => "lancedb",
            Self::Snapshot => "json-snapshot",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.as_str(), self.engine())
    }
}

/// Statistics from a build.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildReport {
    pub backend: BackendKind,

    /// Why the persistent backend was not used, if it was not
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,

    pub index_dir: PathBuf,

    /// Raw documents loaded (files, or pages for PDFs)
    pub documents_count: usize,

    /// Distinct source files
    pub sources_count: usize,

    pub chunks_count: usize,

    pub dimensions: usize,

    pub duration_secs: f64,
}
