//! Prompt builder: renders a definition with the question and retrieved context.

use crate::types::{BuiltPrompt, BuiltPromptMetadata, ContextDocument, PromptDefinition};
use hipaa_core::{AppError, AppResult};
use handlebars::Handlebars;
use serde_json::json;

/// Render the question-answering prompt.
///
/// Every passage in `documents` is made available to the template, in
/// order. Nothing is filtered here.
///
/// # Example
/// ```no_run
/// use hipaa_prompt::{build_qa_prompt, default_qa_prompt, ContextDocument};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let docs = vec![ContextDocument {
///     source: "hipaa-simplification.pdf".to_string(),
///     page: Some(12),
///     text: "A covered entity may not use or disclose...".to_string(),
/// }];
/// let built = build_qa_prompt(&default_qa_prompt(), "What is a covered entity?", &docs)?;
/// println!("{}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_qa_prompt(
    definition: &PromptDefinition,
    question: &str,
    documents: &[ContextDocument],
) -> AppResult<BuiltPrompt> {
    tracing::debug!(
        prompt = %definition.id,
        documents = documents.len(),
        "Building prompt"
    );

    let context = json!({
        "question": question,
        "documents": documents,
    });

    let handlebars = renderer();

    let user = render(&handlebars, &definition.template, &context)?;
    let system = definition
        .system
        .as_deref()
        .map(|template| render(&handlebars, template, &context))
        .transpose()?;

    Ok(BuiltPrompt {
        system,
        user,
        metadata: BuiltPromptMetadata {
            source_prompt_id: definition.id.clone(),
            context_documents: documents.len(),
        },
    })
}

fn renderer() -> Handlebars<'static> {
    let mut handlebars = Handlebars::new();
    // Prompts are plain text
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars
}

fn render(
    handlebars: &Handlebars<'static>,
    template: &str,
    context: &serde_json::Value,
) -> AppResult<String> {
    handlebars
        .render_template(template, context)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::default_qa_prompt;

    fn doc(source: &str, page: Option<u32>, text: &str) -> ContextDocument {
        ContextDocument {
            source: source.to_string(),
            page,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_every_document_is_rendered_in_order() {
        let docs = vec![
            doc("rules.pdf", Some(3), "First passage"),
            doc("notes.md", None, "Second passage"),
        ];

        let built = build_qa_prompt(&default_qa_prompt(), "What applies?", &docs).unwrap();

        let first = built.user.find("First passage").unwrap();
        let second = built.user.find("Second passage").unwrap();
        assert!(first < second);
        assert!(built.user.contains("[rules.pdf, page 3]"));
        assert!(built.user.contains("[notes.md]"));
        assert!(built.user.contains("Question: What applies?"));
        assert_eq!(built.metadata.context_documents, 2);
        assert!(built.system.is_some());
    }

    #[test]
    fn test_no_escaping_of_text() {
        let docs = vec![doc("a.txt", None, "45 CFR § 164.502 <a> & \"b\"")];
        let built = build_qa_prompt(&default_qa_prompt(), "q", &docs).unwrap();
        assert!(built.user.contains("45 CFR § 164.502 <a> & \"b\""));
    }

    #[test]
    fn test_empty_context_still_renders_question() {
        let built = build_qa_prompt(&default_qa_prompt(), "Anything?", &[]).unwrap();
        assert!(built.user.contains("Question: Anything?"));
        assert_eq!(built.metadata.context_documents, 0);
    }

    #[test]
    fn test_malformed_template_is_prompt_error() {
        let def = PromptDefinition {
            id: "broken".to_string(),
            title: "Broken".to_string(),
            api_version: "1.0".to_string(),
            system: None,
            template: "{{#each documents}}".to_string(),
        };
        let result = build_qa_prompt(&def, "q", &[]);
        assert!(matches!(result, Err(AppError::Prompt(_))));
    }
}
