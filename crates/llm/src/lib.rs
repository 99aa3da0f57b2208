//! LLM integration crate for the HIPAA Q&A assistant.
//!
//! This crate provides a provider-agnostic abstraction for single-shot
//! completions. Providers implement [`LlmClient`]; the factory picks one from
//! configuration.
//!
//! # Providers
//! - **Groq**: Hosted OpenAI-compatible chat completions (default)
//! - **Ollama**: Local LLM runtime
//!
//! # Example
//! ```no_run
//! use hipaa_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("What is a covered entity?", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod aliases;
pub mod client;
pub mod factory;
pub mod providers;

// Re-export main types
pub use aliases::ModelAliases;
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::{create_client, resolve_model};
pub use providers::{GroqClient, OllamaClient};
