//! Shared test fixtures.

use crate::embeddings::providers::hashed::HashedProvider;
use crate::embeddings::EmbeddingEngine;
use crate::probe::BackendProbe;
use crate::service::QaService;
use hipaa_core::config::EmbeddingSettings;
use hipaa_core::{AppConfig, AppError, AppResult};
use hipaa_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub(crate) const TEST_DIMENSIONS: usize = 256;

/// Generative model that replays a fixed reply and records every request.
pub(crate) struct ScriptedLlm {
    reply: Result<String, String>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedLlm {
    pub(crate) fn answering(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub(crate) fn last_request(&self) -> Option<LlmRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedLlm {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.reply {
            Ok(content) => Ok(LlmResponse {
                content: content.clone(),
                model: request.model.clone(),
                usage: LlmUsage::new(10, 5),
            }),
            Err(message) => Err(AppError::Llm(message.clone())),
        }
    }
}

/// Write `files` into `<root>/data` and return that directory.
pub(crate) fn write_corpus(root: &Path, files: &[(&str, &str)]) -> PathBuf {
    let dir = root.join("data");
    fs::create_dir_all(&dir).unwrap();
    for (name, contents) in files {
        fs::write(dir.join(name), contents).unwrap();
    }
    dir
}

/// Config rooted at `root` using the offline embedder.
pub(crate) fn test_config(root: &Path) -> AppConfig {
    let mut config = AppConfig {
        workspace: root.to_path_buf(),
        ..AppConfig::default()
    };
    config.embedding = EmbeddingSettings {
        provider: "hashed".to_string(),
        dimensions: TEST_DIMENSIONS,
        ..EmbeddingSettings::default()
    };
    config
}

pub(crate) fn hashed_engine() -> EmbeddingEngine {
    EmbeddingEngine::new(Arc::new(HashedProvider::new(TEST_DIMENSIONS)))
}

pub(crate) fn service(
    config: &AppConfig,
    llm: Arc<ScriptedLlm>,
    probe: Arc<dyn BackendProbe>,
) -> QaService {
    QaService::new(config.clone(), llm, hashed_engine(), probe)
}
