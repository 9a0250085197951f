//! Serve command handler.

use clap::Args;
use civic_core::{config::AppConfig, AppResult};
use civic_server::{bootstrap, serve};

/// Build the store if needed and serve the HTTP API
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Interface to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl ServeCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Starting Smart City Assistant service");

        let startup = bootstrap(config).await?;
        if !startup.state.chain_initialized() {
            tracing::warn!("Serving in degraded mode: /query will answer 500");
        }

        serve(config, startup.state).await
    }
}
