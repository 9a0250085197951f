//! Prompt loader for workspace prompt overrides.

use crate::builtin::{answer_prompt, ANSWER_PROMPT_ID, ANSWER_PROMPT_VARIABLES};
use crate::types::PromptDefinition;
use civic_core::{AppError, AppResult};
use std::path::{Path, PathBuf};

/// Path of the override file for a prompt ID.
pub fn prompt_path(workspace_path: &Path, prompt_id: &str) -> PathBuf {
    workspace_path
        .join(".civic/prompts")
        .join(format!("{}.yml", prompt_id))
}

/// Load a prompt definition by ID from the workspace.
///
/// This function reads `<id>.yml` from the `.civic/prompts/` directory.
///
/// # Example
/// ```no_run
/// use civic_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), "city.answer")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompt_path(workspace_path, prompt_id);

    tracing::debug!("Loading prompt from: {:?}", prompt_file);

    if !prompt_file.exists() {
        return Err(AppError::Prompt(format!(
            "Prompt file not found: {:?}",
            prompt_file
        )));
    }

    let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to read prompt file {:?}: {}",
            prompt_file, e
        ))
    })?;

    let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to parse prompt YAML {:?}: {}",
            prompt_file, e
        ))
    })?;

    validate_prompt(&definition)?;

    tracing::info!("Loaded prompt: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// Resolve the answer prompt: the workspace override when present,
/// otherwise the built-in template.
pub fn load_answer_prompt(workspace_path: &Path) -> AppResult<PromptDefinition> {
    if !prompt_path(workspace_path, ANSWER_PROMPT_ID).exists() {
        return Ok(answer_prompt());
    }

    let definition = load_prompt(workspace_path, ANSWER_PROMPT_ID)?;
    require_variables(&definition, ANSWER_PROMPT_VARIABLES)?;
    Ok(definition)
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}

/// Every variable must appear as `{{name}}` in the template.
fn require_variables(def: &PromptDefinition, variables: &[&str]) -> AppResult<()> {
    let missing: Vec<&str> = variables
        .iter()
        .copied()
        .filter(|var| !def.template.contains(&format!("{{{{{}}}}}", var)))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::Prompt(format!(
            "Prompt {} must reference {}",
            def.id,
            missing
                .iter()
                .map(|var| format!("{{{{{}}}}}", var))
                .collect::<Vec<_>>()
                .join(" and ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_prompt(dir: &Path, id: &str, content: &str) -> PathBuf {
        let file_path = prompt_path(dir, id);
        fs::create_dir_all(file_path.parent().unwrap()).unwrap();
        fs::write(&file_path, content).unwrap();
        file_path
    }

    #[test]
    fn test_load_valid_prompt() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(
            temp_dir.path(),
            "city.answer",
            "id: city.answer\ntitle: Terse\napiVersion: \"1.0\"\ntemplate: \"{{context}}\\n{{question}}\"\n",
        );

        let prompt = load_prompt(temp_dir.path(), "city.answer").unwrap();
        assert_eq!(prompt.id, "city.answer");
        assert_eq!(prompt.title, "Terse");
    }

    #[test]
    fn test_load_nonexistent_prompt() {
        let temp_dir = TempDir::new().unwrap();
        let result = load_prompt(temp_dir.path(), "nonexistent");
        assert!(matches!(result, Err(AppError::Prompt(_))));
    }

    #[test]
    fn test_load_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(temp_dir.path(), "invalid", "invalid: yaml: content:");

        let result = load_prompt(temp_dir.path(), "invalid");
        assert!(result.is_err());
    }

    #[test]
    fn test_answer_prompt_falls_back_to_builtin() {
        let temp_dir = TempDir::new().unwrap();
        let prompt = load_answer_prompt(temp_dir.path()).unwrap();
        assert_eq!(prompt.id, ANSWER_PROMPT_ID);
        assert!(prompt.template.starts_with("You are a helpful"));
    }

    #[test]
    fn test_answer_override_must_reference_question() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(
            temp_dir.path(),
            "city.answer",
            "id: city.answer\ntitle: Broken\napiVersion: \"1.0\"\ntemplate: \"Only {{context}}\"\n",
        );

        match load_answer_prompt(temp_dir.path()) {
            Err(AppError::Prompt(msg)) => assert!(msg.contains("{{question}}")),
            other => panic!("Expected prompt error, got {:?}", other),
        }
    }
}
