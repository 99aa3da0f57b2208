//! Question-answering result types.

use crate::types::{BackendKind, Chunk};
use serde::{Deserialize, Serialize};

/// Characters of chunk text shown per source.
pub const PREVIEW_CHARS: usize = 280;

/// Answer to one question.
///
/// `cited_chunks` are exactly the chunks placed in the model's context, in
/// retrieval order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QaResult {
    pub answer: String,

    pub cited_chunks: Vec<Chunk>,

    /// Model that produced the answer
    pub model: String,

    pub backend: BackendKind,
}

impl QaResult {
    /// User-facing references for the cited chunks.
    pub fn sources(&self) -> Vec<SourceRef> {
        self.cited_chunks.iter().map(SourceRef::from_chunk).collect()
    }
}

/// Where part of an answer came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    /// Source file name
    pub source: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,

    /// Leading text of the chunk, truncated on a character boundary
    pub preview: String,
}

impl SourceRef {
    pub fn from_chunk(chunk: &Chunk) -> Self {
        Self {
            source: chunk.source_name(),
            page: chunk.page,
            preview: preview(&chunk.text),
        }
    }

    /// File name, plus page when known.
    pub fn label(&self) -> String {
        match self.page {
            Some(page) => format!("{} (page {})", self.source, page),
            None => self.source.clone(),
        }
    }
}

fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}
