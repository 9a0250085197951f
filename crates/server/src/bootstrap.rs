//! Startup sequence: build the store, then assemble the answer chain.

use civic_core::{AppConfig, AppResult};
use civic_knowledge::{
    AnswerComposer, BuildOutcome, KnowledgeStore, QueryOptions, QueryService,
};
use civic_llm::create_client;
use civic_prompt::load_answer_prompt;
use std::time::Duration;

use crate::state::AppState;

/// Everything startup produced.
pub struct Startup {
    pub state: AppState,
    pub build: BuildOutcome,
}

/// Build the knowledge store and construct the query service.
///
/// Store and build failures are returned: the service must not start
/// against a missing or partially built store. Completion client and prompt
/// failures are logged and yield a degraded state instead.
pub async fn bootstrap(config: &AppConfig) -> AppResult<Startup> {
    let store = KnowledgeStore::open(config)?;
    let knowledge_base = config.knowledge_base_path();

    tracing::info!("Building knowledge store from {}", knowledge_base.display());
    let build = store.build(&knowledge_base).await?;

    let llm = match create_client(
        &config.llm.provider,
        Some(config.llm.endpoint.as_str()),
        config.llm.timeout_secs.map(Duration::from_secs),
    ) {
        Ok(client) => {
            tracing::info!(
                "LLM initialized: {} model {} at {}",
                client.provider_name(),
                config.llm.model,
                config.llm.endpoint
            );
            client
        }
        Err(e) => {
            tracing::error!("Failed to initialize LLM: {}", e);
            return Ok(Startup {
                state: AppState::degraded(false),
                build,
            });
        }
    };

    let prompt = match load_answer_prompt(&config.workspace) {
        Ok(prompt) => prompt,
        Err(e) => {
            tracing::error!("Failed to create answer chain: {}", e);
            return Ok(Startup {
                state: AppState::degraded(true),
                build,
            });
        }
    };

    let service = QueryService::new(
        store.retriever(),
        AnswerComposer::with_prompt(llm, config.llm.model.clone(), prompt)
            .with_sampling(config.llm.temperature, config.llm.max_tokens),
        QueryOptions {
            top_k: config.knowledge.top_k,
            max_sources: config.knowledge.max_sources,
        },
    );

    tracing::info!("Answer chain initialized");

    Ok(Startup {
        state: AppState::ready(service),
        build,
    })
}
