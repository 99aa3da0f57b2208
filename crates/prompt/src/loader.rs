//! Prompt loader.
//!
//! The question-answering prompt ships built in. A workspace can replace it
//! with `<prompts_dir>/<id>.yml`.

use crate::types::PromptDefinition;
use hipaa_core::{AppError, AppResult};
use std::path::Path;

/// Identifier of the question-answering prompt.
pub const QA_PROMPT_ID: &str = "hipaa.qa.default";

const QA_SYSTEM: &str = "You are an assistant answering questions about the HIPAA \
regulations. Answer only from the provided context.";

const QA_TEMPLATE: &str = "Use the following pieces of context to answer the question at the end. \
If you don't know the answer, just say that you don't know, don't try to make up an answer.

{{#each documents}}
[{{source}}{{#if page}}, page {{page}}{{/if}}]
{{text}}

{{/each}}
Question: {{question}}
Helpful Answer:";

/// The built-in question-answering prompt.
pub fn default_qa_prompt() -> PromptDefinition {
    PromptDefinition {
        id: QA_PROMPT_ID.to_string(),
        title: "HIPAA question answering".to_string(),
        api_version: "1.0".to_string(),
        system: Some(QA_SYSTEM.to_string()),
        template: QA_TEMPLATE.to_string(),
    }
}

/// Load a prompt definition by ID from `prompts_dir`.
///
/// # Example
/// ```no_run
/// use hipaa_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new(".hipaa/prompts"), "hipaa.qa.default")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(prompts_dir: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompts_dir.join(format!("{}.yml", prompt_id));

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

/// Load a workspace override for `prompt_id`, or the built-in prompt.
///
/// A present but invalid override is an error rather than a silent fallback.
pub fn load_prompt_or_default(prompts_dir: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    if prompts_dir.join(format!("{}.yml", prompt_id)).exists() {
        return load_prompt(prompts_dir, prompt_id);
    }

    if prompt_id == QA_PROMPT_ID {
        return Ok(default_qa_prompt());
    }

    Err(AppError::Prompt(format!(
        "No prompt named '{}' and no built-in default",
        prompt_id
    )))
}

fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.is_empty() {
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
