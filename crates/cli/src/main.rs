//! HIPAA Q&A CLI
//!
//! Builds the document index and answers questions about the HIPAA corpus.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, BuildCommand, ChatCommand, StatusCommand};
use hipaa_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// HIPAA Q&A - answers questions grounded in the HIPAA regulations
#[derive(Parser, Debug)]
#[command(name = "hipaa")]
#[command(about = "Retrieval-augmented question answering over the HIPAA regulations", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "HIPAA_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file (default: <workspace>/.hipaa/config.yaml)
    #[arg(short, long, global = true, env = "HIPAA_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load, chunk and embed the corpus into an index
    Build(BuildCommand),

    /// Answer a single question
    Ask(AskCommand),

    /// Interactive question session
    Chat(ChatCommand),

    /// Show which index exists and which backend serves it
    Status(StatusCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let corpus_override = match &cli.command {
        Commands::Build(cmd) => cmd.corpus.clone(),
        _ => None,
    };

    let config = AppConfig::load(cli.workspace, cli.config)?.with_overrides(
        corpus_override,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::debug!("Workspace: {:?}", config.workspace);
    if let Some(path) = &config.config_file {
        tracing::debug!("Config file: {:?}", path);
    }

    config.validate()?;

    let command_name = match &cli.command {
        Commands::Build(_) => "build",
        Commands::Ask(_) => "ask",
        Commands::Chat(_) => "chat",
        Commands::Status(_) => "status",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Build(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Chat(cmd) => cmd.execute(&config).await,
        Commands::Status(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::debug!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
