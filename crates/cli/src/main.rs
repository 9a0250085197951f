//! Smart City Assistant CLI
//!
//! Main entry point for the `civic` command-line tool: serves the question
//! answering API, maintains the knowledge store and offers a terminal chat.

mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};
use civic_core::config::{AppConfig, ConfigOverrides};
use civic_core::logging;
use commands::{
    AskCommand, ChatCommand, IndexCommand, SearchCommand, ServeCommand, StatsCommand,
};
use std::path::PathBuf;

/// Smart City Assistant - answers questions about city services
#[derive(Parser, Debug)]
#[command(name = "civic")]
#[command(about = "Question answering over a city knowledge base", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "CIVIC_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file (default: <workspace>/.civic/config.yaml)
    #[arg(short, long, global = true, env = "CIVIC_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter (error, warn, info, debug, trace or a full directive)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    /// Knowledge-base JSON file
    #[arg(long, global = true)]
    knowledge_base: Option<PathBuf>,

    /// Vector store location
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Completion model identifier
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Embedding model identifier
    #[arg(long, global = true)]
    embedding_model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the store if needed and serve the HTTP API
    Serve(ServeCommand),

    /// Build (or rebuild) the knowledge store
    Index(IndexCommand),

    /// Show the documents most similar to a query
    Search(SearchCommand),

    /// Answer one question in-process
    Ask(AskCommand),

    /// Show knowledge store statistics
    Stats(StatsCommand),

    /// Chat with a running assistant service
    Chat(ChatCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.workspace.clone(), cli.config.clone())
        .context("Failed to load configuration")?;

    let mut overrides = ConfigOverrides {
        knowledge_base: cli.knowledge_base.clone(),
        store: cli.store.clone(),
        llm_model: cli.model.clone(),
        embedding_model: cli.embedding_model.clone(),
        log_level: cli.log_level.clone(),
        verbose: cli.verbose,
        no_color: cli.no_color,
        log_json: cli.log_json,
        ..ConfigOverrides::default()
    };
    match &cli.command {
        Commands::Serve(cmd) => {
            overrides.host = cmd.host.clone();
            overrides.port = cmd.port;
        }
        Commands::Chat(cmd) => overrides.backend_url = cmd.backend_url.clone(),
        _ => {}
    }

    let config = config.with_overrides(overrides);
    config.validate().context("Invalid configuration")?;

    logging::init_logging(config.log_level.as_deref(), config.no_color, config.log_json)
        .context("Failed to initialize logging")?;

    tracing::debug!("Workspace: {:?}", config.workspace);
    if let Some(file) = &config.config_file {
        tracing::debug!("Config file: {:?}", file);
    }

    let command_name = match &cli.command {
        Commands::Serve(_) => "serve",
        Commands::Index(_) => "index",
        Commands::Search(_) => "search",
        Commands::Ask(_) => "ask",
        Commands::Stats(_) => "stats",
        Commands::Chat(_) => "chat",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Serve(cmd) => cmd.execute(&config).await,
        Commands::Index(cmd) => cmd.execute(&config).await,
        Commands::Search(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Stats(cmd) => cmd.execute(&config).await,
        Commands::Chat(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::debug!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result.with_context(|| format!("civic {} failed", command_name))
}
