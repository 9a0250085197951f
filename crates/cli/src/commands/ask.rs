//! Ask command handler.
//!
//! Answers a single question in-process, without the HTTP service.

use clap::Args;
use civic_core::{config::AppConfig, AppError, AppResult};
use civic_server::bootstrap;

use super::print_json;

/// Answer one question in-process
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");

        let startup = bootstrap(config).await?;
        let service = startup.state.service.ok_or_else(|| {
            AppError::Config("Answer chain could not be initialized; see logs above".to_string())
        })?;

        let response = service.handle_query(&self.question).await?;

        if self.json {
            return print_json(&serde_json::to_value(&response)?);
        }

        println!("{}", response.answer);
        if !response.sources.is_empty() {
            println!();
            println!("Sources:");
            for source in &response.sources {
                println!("- {} ({})", source.title, source.category);
            }
        }

        Ok(())
    }
}
