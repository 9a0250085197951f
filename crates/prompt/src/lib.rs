//! Prompt system for the Smart City Assistant.
//!
//! This crate provides:
//! - The built-in grounded-answer prompt
//! - YAML prompt overrides under `.civic/prompts/`
//! - Handlebars template rendering

pub mod builder;
pub mod builtin;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use builtin::{answer_prompt, ANSWER_PROMPT_ID};
pub use loader::{load_answer_prompt, load_prompt};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition};
