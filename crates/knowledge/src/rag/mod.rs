//! Retrieval-augmented question answering.

pub mod ask;
pub mod types;

pub use ask::{GenerationOptions, QaOrchestrator};
pub use types::{QaResult, SourceRef, PREVIEW_CHARS};
