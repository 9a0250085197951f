//! Index command handler.
//!
//! Runs the one-time knowledge store build.

use clap::Args;
use civic_core::{config::AppConfig, AppResult};
use civic_knowledge::{BuildOutcome, KnowledgeStore};

use super::print_json;

/// Build (or rebuild) the knowledge store
#[derive(Args, Debug)]
pub struct IndexCommand {
    /// Delete stored documents and build again
    #[arg(long)]
    pub rebuild: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IndexCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let knowledge_base = config.knowledge_base_path();
        tracing::info!(
            "Indexing {} into {}",
            knowledge_base.display(),
            config.store_path().display()
        );

        let store = KnowledgeStore::open(config)?;
        let outcome = if self.rebuild {
            store.rebuild(&knowledge_base).await?
        } else {
            store.build(&knowledge_base).await?
        };

        if self.json {
            let (built, stale) = match outcome {
                BuildOutcome::Built { .. } => (true, false),
                BuildOutcome::AlreadyBuilt { stale, .. } => (false, stale),
            };
            return print_json(&serde_json::json!({
                "documents": outcome.documents(),
                "built": built,
                "stale": stale,
                "store": config.store_path(),
            }));
        }

        match outcome {
            BuildOutcome::Built { documents } => {
                println!("Indexed {} documents", documents);
            }
            BuildOutcome::AlreadyBuilt { documents, stale } => {
                println!("Store already holds {} documents", documents);
                if stale {
                    println!("The knowledge base changed since the last build; run `civic index --rebuild` to refresh it.");
                }
            }
        }

        Ok(())
    }
}
