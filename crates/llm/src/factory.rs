//! LLM provider factory.
//!
//! Builds the configured client and resolves the model identifier through
//! the alias table.

use crate::aliases::ModelAliases;
use crate::client::LlmClient;
use crate::providers::groq::DEFAULT_GROQ_URL;
use crate::providers::ollama::DEFAULT_OLLAMA_URL;
use crate::providers::{GroqClient, OllamaClient};
use hipaa_core::config::LlmSettings;
use hipaa_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Create an LLM client from settings.
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or a required API
/// key is missing.
pub fn create_client(
    settings: &LlmSettings,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn LlmClient>> {
    let timeout = Duration::from_secs(settings.timeout_secs);

    match settings.provider.to_lowercase().as_str() {
        "groq" => {
            let api_key = api_key.ok_or_else(|| {
                AppError::Config(format!(
                    "Groq provider requires an API key ({})",
                    settings.api_key_env
                ))
            })?;
            let base_url = settings.endpoint.as_deref().unwrap_or(DEFAULT_GROQ_URL);
            Ok(Arc::new(GroqClient::with_base_url(
                base_url, api_key, timeout,
            )?))
        }
        "ollama" => {
            let base_url = settings.endpoint.as_deref().unwrap_or(DEFAULT_OLLAMA_URL);
            Ok(Arc::new(OllamaClient::with_timeout(base_url, timeout)?))
        }
        _ => Err(AppError::Config(format!(
            "Unknown LLM provider: {}",
            settings.provider
        ))),
    }
}

/// Resolve the configured model through its alias table.
pub fn resolve_model(settings: &LlmSettings) -> AppResult<String> {
    ModelAliases::new(settings.model_aliases.clone()).resolve(&settings.model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_groq_client() {
        let client = create_client(&LlmSettings::default(), Some("gsk_test")).unwrap();
        assert_eq!(client.provider_name(), "groq");
    }

    #[test]
    fn test_groq_requires_api_key() {
        match create_client(&LlmSettings::default(), None) {
            Err(AppError::Config(message)) => assert!(message.contains("GROQ_API_KEY")),
            _ => panic!("Expected config error for Groq without API key"),
        }
    }

    #[test]
    fn test_create_ollama_with_custom_endpoint() {
        let settings = LlmSettings {
            provider: "ollama".to_string(),
            endpoint: Some("http://localhost:8080".to_string()),
            ..LlmSettings::default()
        };
        let client = create_client(&settings, None).unwrap();
        assert_eq!(client.provider_name(), "ollama");
    }

    #[test]
    fn test_unknown_provider() {
        let settings = LlmSettings {
            provider: "unknown".to_string(),
            ..LlmSettings::default()
        };
        assert!(create_client(&settings, None).is_err());
    }

    #[test]
    fn test_resolve_model_uses_aliases() {
        let mut settings = LlmSettings {
            model: "llama3-8b-8192".to_string(),
            ..LlmSettings::default()
        };
        assert_eq!(resolve_model(&settings).unwrap(), "llama3-8b-8192");

        settings.model_aliases.insert(
            "llama3-8b-8192".to_string(),
            "llama-3.1-8b-instant".to_string(),
        );
        assert_eq!(resolve_model(&settings).unwrap(), "llama-3.1-8b-instant");
    }
}
