//! Command handlers for the civic CLI.

pub mod ask;
pub mod chat;
pub mod index;
pub mod search;
pub mod serve;
pub mod stats;

pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use index::IndexCommand;
pub use search::SearchCommand;
pub use serve::ServeCommand;
pub use stats::StatsCommand;

/// Print a JSON value to stdout.
pub(crate) fn print_json(value: &serde_json::Value) -> civic_core::AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
