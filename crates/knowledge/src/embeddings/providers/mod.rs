//! Embedding provider implementations.

pub mod hashed;
pub mod ollama;
