//! Search command handler.

use clap::Args;
use civic_core::{config::AppConfig, AppResult};
use civic_knowledge::{KnowledgeStore, DEFAULT_TOP_K};

use super::print_json;

/// Show the documents most similar to a query
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// Query text
    pub query: String,

    /// Number of documents to return
    #[arg(short = 'k', long, default_value_t = DEFAULT_TOP_K)]
    pub top_k: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SearchCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Searching store for '{}'", self.query);

        let store = KnowledgeStore::open(config)?;
        let results = store.search(&self.query, self.top_k).await?;

        if self.json {
            let output: Vec<_> = results
                .iter()
                .map(|r| {
                    serde_json::json!({
                        "id": r.document.id,
                        "score": r.score,
                        "metadata": r.document.metadata,
                    })
                })
                .collect();
            return print_json(&serde_json::Value::Array(output));
        }

        if results.is_empty() {
            println!("No documents in the store. Run `civic index` first.");
            return Ok(());
        }

        for (rank, result) in results.iter().enumerate() {
            let meta = &result.document.metadata;
            println!(
                "{}. [{:.3}] {} ({}) id={}",
                rank + 1,
                result.score,
                meta.title,
                meta.category,
                result.document.id
            );
        }

        Ok(())
    }
}
