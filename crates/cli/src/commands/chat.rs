//! Chat command handler.
//!
//! Interactive question loop over stdin. The index is opened once at
//! startup; a question that fails is reported and the session continues.

use super::{answering_service, print_result};
use clap::Args;
use hipaa_core::{config::AppConfig, AppResult};
use hipaa_knowledge::{QaResult, QaService};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Interactive question session
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Number of chunks to retrieve (default: index.topK from config)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,
}

/// Append-only record of the session.
#[derive(Debug, Default)]
struct SessionHistory {
    entries: Vec<(String, QaResult)>,
}

impl SessionHistory {
    fn push(&mut self, question: String, result: QaResult) {
        self.entries.push((question, result));
    }

    fn print(&self) {
        if self.entries.is_empty() {
            println!("(no questions yet)");
            return;
        }

        for (i, (question, result)) in self.entries.iter().enumerate() {
            println!("{}. Q: {}", i + 1, question);
            println!("   A: {}", result.answer);
            let labels: Vec<String> = result.sources().iter().map(|s| s.label()).collect();
            if !labels.is_empty() {
                println!("   Sources: {}", labels.join(", "));
            }
        }
    }
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chat command");

        let service = answering_service(config, self.top_k)?;

        // Initialization failures end the command before any question is read
        let backend = service.initialize().await?;
        if let Some(report) = service.build_report() {
            println!(
                "Built index: {} chunks from {} sources",
                report.chunks_count, report.sources_count
            );
        }
        println!("Vector store: {}", backend);
        println!("Ask a question about HIPAA. Commands: /history, /quit");

        self.run_session(&service).await
    }

    async fn run_session(&self, service: &QaService) -> AppResult<()> {
        let mut history = SessionHistory::default();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                println!();
                break;
            };

            let question = line.trim();
            match question {
                "" => continue,
                "/quit" | "/exit" => break,
                "/history" => {
                    history.print();
                    continue;
                }
                _ => {}
            }

            match service.answer(question).await {
                Ok(result) => {
                    println!();
                    print_result(&result);
                    println!();
                    history.push(question.to_string(), result);
                }
                Err(e) if e.is_query_recoverable() => {
                    tracing::warn!("Question failed: {}", e);
                    eprintln!("Answer unavailable: {}", e);
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!("Chat session ended after {} questions", history.entries.len());
        Ok(())
    }
}
