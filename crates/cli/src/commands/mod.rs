//! Command handlers for the HIPAA Q&A CLI.

pub mod ask;
pub mod build;
pub mod chat;
pub mod status;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use build::BuildCommand;
pub use chat::ChatCommand;
pub use status::StatusCommand;

use hipaa_core::{config::AppConfig, AppResult};
use hipaa_knowledge::{QaResult, QaService};

/// Service for commands that generate answers.
///
/// Fails early when the generative model cannot authenticate, before any
/// index work happens.
pub(crate) fn answering_service(config: &AppConfig, top_k: Option<usize>) -> AppResult<QaService> {
    config.validate_llm_credentials()?;

    let mut config = config.clone();
    if let Some(k) = top_k {
        config.index.top_k = k;
    }
    config.validate()?;

    let llm = hipaa_llm::create_client(&config.llm, config.api_key.as_deref())?;
    QaService::from_config(&config, llm)
}

/// Human-readable answer with its sources.
pub(crate) fn print_result(result: &QaResult) {
    println!("{}", result.answer);
    println!();

    let sources = result.sources();
    if sources.is_empty() {
        println!("Sources: (none retrieved)");
        return;
    }

    println!("Sources:");
    for (i, source) in sources.iter().enumerate() {
        println!("[{}] {}", i + 1, source.label());
        println!("    {}", source.preview.replace('\n', " "));
    }
}
