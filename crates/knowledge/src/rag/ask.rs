//! Retrieval-augmented answering.
//!
//! Retrieves chunks for a question, renders them into the grounded prompt
//! and asks the generative model. Every retrieved chunk goes into the
//! prompt and is cited; there is no relevance cutoff.

use crate::rag::types::QaResult;
use crate::retriever::Retriever;
use crate::types::{Chunk, RetrievalResult};
use hipaa_core::config::LlmSettings;
use hipaa_core::{AppError, AppResult};
use hipaa_llm::{LlmClient, LlmRequest};
use hipaa_prompt::{build_qa_prompt, ContextDocument, PromptDefinition};
use std::sync::Arc;

/// Sampling parameters for answer generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    /// Alias-resolved model identifier
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl GenerationOptions {
    pub fn from_settings(settings: &LlmSettings, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        }
    }
}

/// Combines a retriever, a prompt and a generative model.
pub struct QaOrchestrator {
    retriever: Retriever,
    llm: Arc<dyn LlmClient>,
    prompt: PromptDefinition,
    options: GenerationOptions,
}

impl QaOrchestrator {
    pub fn new(
        retriever: Retriever,
        llm: Arc<dyn LlmClient>,
        prompt: PromptDefinition,
        options: GenerationOptions,
    ) -> Self {
        Self {
            retriever,
            llm,
            prompt,
            options,
        }
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Answer a question from the index.
    ///
    /// # Errors
    /// `EmbeddingFailed` if the question cannot be embedded,
    /// `RetrievalFailed` if the index search fails,
    /// `GenerationFailed` if the model call fails. No partial answer is
    /// returned either way.
    pub async fn answer(&self, question: &str) -> AppResult<QaResult> {
        tracing::info!("Answering question with top-{} retrieval", self.retriever.top_k());

        let retrieval = self.retriever.retrieve(question).await?;
        self.answer_with_retrieval(question, retrieval).await
    }

    /// Answer from an already computed retrieval.
    ///
    /// The model is called even when `retrieval` is empty.
    pub async fn answer_with_retrieval(
        &self,
        question: &str,
        retrieval: RetrievalResult,
    ) -> AppResult<QaResult> {
        let cited_chunks: Vec<Chunk> = retrieval.into_iter().map(|r| r.chunk).collect();

        if cited_chunks.is_empty() {
            tracing::info!("No chunks retrieved, asking model with empty context");
        }

        let documents: Vec<ContextDocument> = cited_chunks
            .iter()
            .map(|chunk| ContextDocument {
                source: chunk.source_name(),
                page: chunk.page,
                text: chunk.text.clone(),
            })
            .collect();

        let built = build_qa_prompt(&self.prompt, question, &documents)?;

        let mut request = LlmRequest::new(built.user, self.options.model.as_str())
            .with_temperature(self.options.temperature)
            .with_max_tokens(self.options.max_tokens);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }

        tracing::debug!(
            "Generating answer with {} (provider: {}, context chunks: {})",
            self.options.model,
            self.llm.provider_name(),
            built.metadata.context_documents
        );

        let response =
            self.llm
                .complete(&request)
                .await
                .map_err(|e| AppError::GenerationFailed {
                    model: self.options.model.clone(),
                    reason: e.to_string(),
                })?;

        Ok(QaResult {
            answer: response.content.trim().to_string(),
            cited_chunks,
            model: self.options.model.clone(),
            backend: self.retriever.backend(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::hashed::HashedProvider;
    use crate::embeddings::EmbeddingEngine;
    use crate::snapshot_index::SnapshotIndex;
    use crate::tests::support::ScriptedLlm;
    use crate::types::ScoredChunk;
    use hipaa_prompt::default_qa_prompt;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn chunk(id: &str, text: &str, page: Option<u32>) -> Chunk {
        Chunk {
            id: id.to_string(),
            text: text.to_string(),
            source_path: PathBuf::from("/data/privacy.pdf"),
            page,
            sequence_index: 0,
        }
    }

    fn orchestrator(temp: &TempDir, llm: Arc<ScriptedLlm>) -> QaOrchestrator {
        let engine = EmbeddingEngine::new(Arc::new(HashedProvider::new(16)));
        let index = SnapshotIndex::write(temp.path(), 16, &[], &[]).unwrap();
        let retriever = Retriever::new(Arc::new(index), engine, 4);
        QaOrchestrator::new(
            retriever,
            llm,
            default_qa_prompt(),
            GenerationOptions {
                model: "llama-3.1-8b-instant".to_string(),
                temperature: 0.0,
                max_tokens: 256,
            },
        )
    }

    #[tokio::test]
    async fn test_context_follows_retrieval_order() {
        let temp = TempDir::new().unwrap();
        let llm = Arc::new(ScriptedLlm::answering(" Patient privacy. "));
        let qa = orchestrator(&temp, llm.clone());

        let retrieval = vec![
            ScoredChunk {
                chunk: chunk("b", "SECOND-PASSAGE", None),
                score: 0.9,
            },
            ScoredChunk {
                chunk: chunk("a", "FIRST-PASSAGE", Some(7)),
                score: 0.4,
            },
        ];

        let result = qa
            .answer_with_retrieval("What does HIPAA protect?", retrieval)
            .await
            .unwrap();

        assert_eq!(result.answer, "Patient privacy.");
        let ids: Vec<&str> = result.cited_chunks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);

        let request = llm.last_request().unwrap();
        let second = request.prompt.find("SECOND-PASSAGE").unwrap();
        let first = request.prompt.find("FIRST-PASSAGE").unwrap();
        assert!(second < first);
        assert!(request.prompt.contains("[privacy.pdf, page 7]"));
        assert!(request.prompt.contains("What does HIPAA protect?"));
        assert_eq!(request.model, "llama-3.1-8b-instant");
        assert_eq!(request.temperature, Some(0.0));
        assert!(request.system.is_some());
    }

    #[tokio::test]
    async fn test_empty_retrieval_still_calls_model() {
        let temp = TempDir::new().unwrap();
        let llm = Arc::new(ScriptedLlm::answering("I don't know."));
        let qa = orchestrator(&temp, llm.clone());

        let result = qa.answer("Anything?").await.unwrap();

        assert_eq!(llm.calls(), 1);
        assert!(result.cited_chunks.is_empty());
        assert_eq!(result.answer, "I don't know.");
    }

    #[tokio::test]
    async fn test_model_failure_is_generation_failed() {
        let temp = TempDir::new().unwrap();
        let qa = orchestrator(&temp, Arc::new(ScriptedLlm::failing("quota exceeded")));

        match qa.answer("What is PHI?").await {
            Err(AppError::GenerationFailed { model, reason }) => {
                assert_eq!(model, "llama-3.1-8b-instant");
                assert!(reason.contains("quota exceeded"));
            }
            other => panic!("Expected GenerationFailed, got {:?}", other.map(|r| r.answer)),
        }
    }
}
