//! Stats command handler.

use clap::Args;
use civic_core::{config::AppConfig, AppResult};
use civic_knowledge::KnowledgeStore;

use super::print_json;

/// Show knowledge store statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let knowledge_base = config.knowledge_base_path();
        let store = KnowledgeStore::open(config)?;
        let stats = store.stats(&knowledge_base)?;

        if self.json {
            return print_json(&serde_json::json!({
                "store": config.store_path(),
                "documents": stats.documents,
                "dbSizeBytes": stats.db_size_bytes,
                "manifest": stats.manifest,
                "sourceChanged": stats.source_changed,
            }));
        }

        println!("Store: {}", config.store_path().display());
        println!("  Documents: {}", stats.documents);
        println!("  DB size: {} bytes", stats.db_size_bytes);

        match &stats.manifest {
            Some(manifest) => {
                println!(
                    "  Embedding: {}/{} ({} dims)",
                    manifest.embedding_provider,
                    manifest.embedding_model,
                    manifest.embedding_dimensions
                );
                println!("  Built at: {}", manifest.built_at.to_rfc3339());
            }
            None => println!("  Not built yet. Run `civic index`."),
        }

        match stats.source_changed {
            Some(true) => println!(
                "  {} changed since the build; run `civic index --rebuild`.",
                knowledge_base.display()
            ),
            Some(false) => println!("  {} is unchanged.", knowledge_base.display()),
            None => {}
        }

        Ok(())
    }
}
