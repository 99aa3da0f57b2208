//! Build-once question answering service.
//!
//! The serving entry point: the first call to [`QaService::initialize`]
//! opens the index (building it first if no backend holds one) and
//! assembles the pipeline. Later calls reuse it. Concurrent first callers
//! wait for the same initialization instead of starting their own.

use crate::builder::IndexBuilder;
use crate::config::{ChunkSettings, IndexLocations};
use crate::embeddings::{shared_provider, EmbeddingEngine};
use crate::manifest::IndexManifest;
use crate::probe::{probe_for, BackendProbe};
use crate::rag::{GenerationOptions, QaOrchestrator, QaResult};
use crate::retriever::Retriever;
use crate::selector::{BackendSelector, OpenedIndex};
use crate::types::{BackendKind, BuildReport};
use hipaa_core::{AppConfig, AppError, AppResult};
use hipaa_llm::{resolve_model, LlmClient};
use hipaa_prompt::{load_prompt_or_default, QA_PROMPT_ID};
use std::sync::Arc;
use tokio::sync::OnceCell;

struct Ready {
    orchestrator: QaOrchestrator,
    backend: BackendKind,
    manifest: IndexManifest,
    build: Option<BuildReport>,
}

pub struct QaService {
    config: AppConfig,
    llm: Arc<dyn LlmClient>,
    engine: EmbeddingEngine,
    probe: Arc<dyn BackendProbe>,
    ready: OnceCell<Ready>,
}

impl QaService {
    /// Service using the configured embedder and backend probe.
    pub fn from_config(config: &AppConfig, llm: Arc<dyn LlmClient>) -> AppResult<Self> {
        let engine = EmbeddingEngine::new(shared_provider(&config.embedding)?);
        Ok(Self::new(config.clone(), llm, engine, probe_for(&config.index)))
    }

    pub fn new(
        config: AppConfig,
        llm: Arc<dyn LlmClient>,
        engine: EmbeddingEngine,
        probe: Arc<dyn BackendProbe>,
    ) -> Self {
        Self {
            config,
            llm,
            engine,
            probe,
            ready: OnceCell::new(),
        }
    }

    /// Open (building if needed) the index and return the backend in use.
    ///
    /// # Errors
    /// `NoDocumentsFound` if a build was needed and the corpus is empty,
    /// `EmbeddingMismatch` if the index was built with another embedder,
    /// plus any build failure.
    pub async fn initialize(&self) -> AppResult<BackendKind> {
        let ready = self.ready.get_or_try_init(|| self.prepare()).await?;
        Ok(ready.backend)
    }

    pub fn is_ready(&self) -> bool {
        self.ready.initialized()
    }

    pub fn backend(&self) -> Option<BackendKind> {
        self.ready.get().map(|ready| ready.backend)
    }

    pub fn manifest(&self) -> Option<&IndexManifest> {
        self.ready.get().map(|ready| &ready.manifest)
    }

    /// Report of the build run during initialization, if one was needed.
    pub fn build_report(&self) -> Option<&BuildReport> {
        self.ready.get().and_then(|ready| ready.build.as_ref())
    }

    /// Answer one question. Safe to call repeatedly; the index is opened once.
    pub async fn answer(&self, question: &str) -> AppResult<QaResult> {
        self.initialize().await?;
        let ready = self
            .ready
            .get()
            .ok_or_else(|| AppError::Knowledge("Service is not initialized".to_string()))?;
        ready.orchestrator.answer(question).await
    }

    async fn prepare(&self) -> AppResult<Ready> {
        let locations = IndexLocations::from_config(&self.config);
        let selector = BackendSelector::new(locations.clone(), self.engine.fingerprint());

        let (opened, build) = match selector.open().await {
            Ok(opened) => (opened, None),
            Err(AppError::NoIndexFound { .. }) => {
                let corpus_dir = self.config.corpus_dir();
                tracing::info!("No usable index, building from {:?}", corpus_dir);

                let builder = IndexBuilder::new(
                    locations,
                    ChunkSettings::from(&self.config.index),
                    self.engine.clone(),
                    Arc::clone(&self.probe),
                );
                let report = builder.build(&corpus_dir).await?.report;
                (selector.open().await?, Some(report))
            }
            Err(e) => return Err(e),
        };

        let OpenedIndex {
            index,
            backend,
            manifest,
        } = opened;

        let prompt = load_prompt_or_default(&self.config.prompts_dir(), QA_PROMPT_ID)?;
        let model = resolve_model(&self.config.llm)?;

        tracing::info!(
            "Vector store: {} ({} chunks from {} sources)",
            backend,
            manifest.chunk_count,
            manifest.source_count
        );

        let retriever = Retriever::new(index, self.engine.clone(), self.config.index.top_k);
        let orchestrator = QaOrchestrator::new(
            retriever,
            Arc::clone(&self.llm),
            prompt,
            GenerationOptions::from_settings(&self.config.llm, model),
        );

        Ok(Ready {
            orchestrator,
            backend,
            manifest,
            build,
        })
    }
}
