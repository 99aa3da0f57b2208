//! Prompt system for the HIPAA Q&A assistant.
//!
//! This crate provides structured prompt management with:
//! - A built-in question-answering prompt
//! - YAML overrides from the workspace
//! - Handlebars rendering of retrieved context

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_qa_prompt;
pub use loader::{default_qa_prompt, load_prompt, load_prompt_or_default, QA_PROMPT_ID};
pub use types::{BuiltPrompt, BuiltPromptMetadata, ContextDocument, PromptDefinition};
