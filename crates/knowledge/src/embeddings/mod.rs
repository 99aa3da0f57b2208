//! Embedding engine.
//!
//! Providers are created once per process for each configured model and
//! shared; the engine checks every response against the provider's declared
//! shape before anything is indexed or searched.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingFingerprint;
pub use provider::{create_provider, EmbeddingProvider};

use hipaa_core::config::EmbeddingSettings;
use hipaa_core::{AppError, AppResult};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex};

type ProviderCache = Mutex<HashMap<String, Arc<dyn EmbeddingProvider>>>;

static PROVIDERS: LazyLock<ProviderCache> = LazyLock::new(|| Mutex::new(HashMap::new()));

/// Get the process-wide provider for these settings, creating it on first use.
pub fn shared_provider(settings: &EmbeddingSettings) -> AppResult<Arc<dyn EmbeddingProvider>> {
    let key = format!(
        "{}|{}|{}|{}",
        settings.provider,
        settings.model,
        settings.dimensions,
        settings.endpoint.as_deref().unwrap_or("")
    );

    let mut providers = PROVIDERS
        .lock()
        .map_err(|_| AppError::Knowledge("Embedding provider cache is poisoned".to_string()))?;

    if let Some(provider) = providers.get(&key) {
        return Ok(Arc::clone(provider));
    }

    tracing::debug!(
        "Creating embedding provider: provider={}, model={}, dimensions={}",
        settings.provider,
        settings.model,
        settings.dimensions
    );

    let provider = create_provider(settings)?;
    providers.insert(key, Arc::clone(&provider));
    Ok(provider)
}

/// Shape-checked access to one embedding provider.
#[derive(Debug, Clone)]
pub struct EmbeddingEngine {
    provider: Arc<dyn EmbeddingProvider>,
}

impl EmbeddingEngine {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider }
    }

    pub fn fingerprint(&self) -> EmbeddingFingerprint {
        self.provider.fingerprint()
    }

    pub fn dimensions(&self) -> usize {
        self.provider.dimensions()
    }

    /// Embed texts in one provider call.
    ///
    /// # Errors
    /// `EmbeddingFailed` if the provider fails or returns the wrong number
    /// of vectors or a vector of the wrong length.
    pub async fn embed_texts(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = self.provider.model_name().to_string();

        tracing::info!(
            "Embedding {} texts using provider '{}' (model: {})",
            texts.len(),
            self.provider.provider_name(),
            model
        );

        let embeddings = self
            .provider
            .embed_batch(texts)
            .await
            .map_err(|e| match e {
                AppError::EmbeddingFailed { .. } => e,
                other => AppError::EmbeddingFailed {
                    model: model.clone(),
                    reason: other.to_string(),
                },
            })?;

        if embeddings.len() != texts.len() {
            return Err(AppError::EmbeddingFailed {
                model,
                reason: format!(
                    "expected {} embeddings, got {}",
                    texts.len(),
                    embeddings.len()
                ),
            });
        }

        let dimensions = self.provider.dimensions();
        if let Some(bad) = embeddings.iter().find(|e| e.len() != dimensions) {
            return Err(AppError::EmbeddingFailed {
                model,
                reason: format!(
                    "expected {} dimensions, got {}",
                    dimensions,
                    bad.len()
                ),
            });
        }

        tracing::debug!(
            "Generated {} embeddings of dimension {}",
            embeddings.len(),
            dimensions
        );

        Ok(embeddings)
    }

    /// Embed a single question.
    pub async fn embed_query(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut embeddings = self.embed_texts(&[text.to_string()]).await?;
        embeddings.pop().ok_or_else(|| AppError::EmbeddingFailed {
            model: self.provider.model_name().to_string(),
            reason: "no embedding returned".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::hashed::HashedProvider;

    /// Returns vectors of the wrong length.
    #[derive(Debug)]
    struct ShortProvider;

    #[async_trait::async_trait]
    impl EmbeddingProvider for ShortProvider {
        fn provider_name(&self) -> &str {
            "short"
        }

        fn model_name(&self) -> &str {
            "short-v1"
        }

        fn dimensions(&self) -> usize {
            8
        }

        async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![0.0; 4]).collect())
        }
    }

    #[tokio::test]
    async fn test_embed_texts_preserves_order() {
        let engine = EmbeddingEngine::new(Arc::new(HashedProvider::new(64)));
        let texts = vec!["privacy rule".to_string(), "security rule".to_string()];

        let batch = engine.embed_texts(&texts).await.unwrap();
        let second = engine.embed_query("security rule").await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[1], second);
    }

    #[tokio::test]
    async fn test_wrong_dimensions_are_rejected() {
        let engine = EmbeddingEngine::new(Arc::new(ShortProvider));
        let result = engine.embed_query("anything").await;
        assert!(matches!(result, Err(AppError::EmbeddingFailed { .. })));
    }

    #[test]
    fn test_shared_provider_is_memoized() {
        let settings = EmbeddingSettings {
            provider: "hashed".to_string(),
            dimensions: 32,
            ..EmbeddingSettings::default()
        };

        let first = shared_provider(&settings).unwrap();
        let second = shared_provider(&settings).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let other = shared_provider(&EmbeddingSettings {
            dimensions: 48,
            ..settings
        })
        .unwrap();
        assert!(!Arc::ptr_eq(&first, &other));
    }
}
