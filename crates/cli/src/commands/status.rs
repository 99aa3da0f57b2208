//! Status command handler.

use clap::Args;
use hipaa_core::{config::AppConfig, AppError, AppResult};
use hipaa_knowledge::LocationStatus;

/// Show which index exists and which backend serves it
#[derive(Args, Debug)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatusCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing status command");

        let status = hipaa_knowledge::index_status(config).await?;

        if self.json {
            let output = serde_json::to_string_pretty(&status)
                .map_err(|e| AppError::Serialization(format!("JSON serialization failed: {}", e)))?;
            println!("{}", output);
            return Ok(());
        }

        println!("Corpus: {}", config.corpus_dir().display());
        print_location("Persistent index", &status.persistent);
        print_location("Snapshot index", &status.snapshot);

        match (&status.active, &status.manifest) {
            (Some(backend), Some(manifest)) => {
                println!("Vector store: {}", backend);
                println!("  Embedding: {}", manifest.embedding);
                println!(
                    "  Chunks: {} from {} sources (size {}, overlap {})",
                    status.chunk_count.unwrap_or(manifest.chunk_count),
                    manifest.source_count,
                    manifest.chunk_size,
                    manifest.chunk_overlap
                );
                println!("  Built: {}", manifest.built_at.to_rfc3339());
            }
            _ => match &status.error {
                Some(error) => println!("Vector store: unusable ({})", error),
                None => println!("Vector store: none (run `hipaa build`)"),
            },
        }

        Ok(())
    }
}

fn print_location(label: &str, location: &LocationStatus) {
    let state = if location.populated { "present" } else { "absent" };
    println!("{}: {} ({})", label, location.path.display(), state);
}
