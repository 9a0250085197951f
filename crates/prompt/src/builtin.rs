//! Prompts compiled into the binary.

use crate::types::PromptDefinition;

/// Identifier of the grounded-answer prompt.
pub const ANSWER_PROMPT_ID: &str = "city.answer";

/// Variables every answer prompt must reference.
pub const ANSWER_PROMPT_VARIABLES: &[&str] = &["context", "question"];

const ANSWER_TEMPLATE: &str = "You are a helpful and informative Smart City Assistant.
Your primary role is to provide comprehensive and detailed answers based on the information available in the provided context.

Please thoroughly review the context below to answer the user's question.
Explain the key aspects, provide relevant details, and aim for a clear and elaborate response.
If the context contains specific steps, lists, or multiple pieces of information related to the question, try to include them in your answer.

If the information is not available in the context to fully answer the question, or if the context is limited,
clearly state what information you could find and what remains unanswered based on the provided context.
Do not invent information or answer outside of the provided context.

Context:
{{context}}

Question: {{question}}

Detailed Answer:";

/// The built-in grounded-answer prompt.
pub fn answer_prompt() -> PromptDefinition {
    PromptDefinition {
        id: ANSWER_PROMPT_ID.to_string(),
        title: "Smart City grounded answer".to_string(),
        api_version: "1.0".to_string(),
        template: ANSWER_TEMPLATE.to_string(),
    }
}
