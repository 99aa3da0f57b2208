//! Build command handler.

use clap::Args;
use hipaa_core::{config::AppConfig, AppError, AppResult};
use hipaa_knowledge::BuildOutcome;
use std::path::PathBuf;

/// Load, chunk and embed the corpus into an index
#[derive(Args, Debug)]
pub struct BuildCommand {
    /// Corpus directory (default: corpus.dir from config)
    #[arg(long)]
    pub corpus: Option<PathBuf>,

    /// Rebuild even if an index already exists
    #[arg(long)]
    pub force: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl BuildCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing build command (force: {})", self.force);

        let outcome = hipaa_knowledge::build_index(config, self.force).await?;

        if self.json {
            let output = serde_json::to_string_pretty(&outcome)
                .map_err(|e| AppError::Serialization(format!("JSON serialization failed: {}", e)))?;
            println!("{}", output);
            return Ok(());
        }

        match outcome {
            BuildOutcome::Built(report) => {
                println!(
                    "Indexed {} chunks from {} sources ({} documents) in {:.2}s",
                    report.chunks_count,
                    report.sources_count,
                    report.documents_count,
                    report.duration_secs
                );
                println!("Vector store: {} at {}", report.backend, report.index_dir.display());
                if let Some(reason) = report.fallback_reason {
                    println!("Persistent backend not used: {}", reason);
                }
            }
            BuildOutcome::Skipped { backend, index_dir } => {
                println!(
                    "Index already exists ({} at {}). Use --force to rebuild.",
                    backend,
                    index_dir.display()
                );
            }
        }

        Ok(())
    }
}
