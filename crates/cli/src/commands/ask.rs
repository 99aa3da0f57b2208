//! Ask command handler.

use super::{answering_service, print_result};
use clap::Args;
use hipaa_core::{config::AppConfig, AppError, AppResult};

/// Answer a single question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Number of chunks to retrieve (default: index.topK from config)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");

        if self.question.trim().is_empty() {
            return Err(AppError::Config("Question must not be empty".to_string()));
        }

        let service = answering_service(config, self.top_k)?;
        let backend = service.initialize().await?;
        if let Some(report) = service.build_report() {
            eprintln!(
                "Built index: {} chunks from {} sources",
                report.chunks_count, report.sources_count
            );
        }
        eprintln!("Vector store: {}", backend);

        let result = service.answer(&self.question).await?;

        if self.json {
            let output = serde_json::json!({
                "question": self.question,
                "answer": result.answer,
                "model": result.model,
                "backend": result.backend,
                "sources": result.sources(),
                "citedChunks": result.cited_chunks,
            });
            let output = serde_json::to_string_pretty(&output)
                .map_err(|e| AppError::Serialization(format!("JSON serialization failed: {}", e)))?;
            println!("{}", output);
        } else {
            print_result(&result);
        }

        Ok(())
    }
}
