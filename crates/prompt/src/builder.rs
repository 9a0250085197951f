//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, PromptDefinition};
use civic_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Build a prompt from a definition and input variables.
///
/// Values are substituted verbatim: no HTML escaping, and braces inside a
/// value are never re-interpreted as template syntax.
///
/// # Example
/// ```no_run
/// use civic_prompt::{build_prompt, builtin::answer_prompt};
/// use std::collections::HashMap;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut vars = HashMap::new();
/// vars.insert("context".to_string(), "Source Title: Parking".to_string());
/// vars.insert("question".to_string(), "Where can I park?".to_string());
///
/// let built = build_prompt(&answer_prompt(), vars)?;
/// println!("{}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let rendered = render_template(&definition.template, &variables)?;

    Ok(BuiltPrompt::new(rendered, definition.id.clone(), variables))
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Disable HTML escaping for plain text
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    let rendered = handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

    Ok(rendered)
}
