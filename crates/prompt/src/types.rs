//! Prompt types.

use serde::{Deserialize, Serialize};

/// A prompt definition, built in or loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Optional system message (Handlebars)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// User message template (Handlebars)
    ///
    /// Rendered with `question` and `documents`; each document exposes
    /// `source`, `page` and `text`.
    pub template: String,
}

/// One retrieved passage as seen by the template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContextDocument {
    /// Display name of the source file
    pub source: String,

    /// 1-based page number for paginated sources
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,

    pub text: String,
}

/// A fully built prompt ready for LLM execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    pub system: Option<String>,

    pub user: String,

    pub metadata: BuiltPromptMetadata,
}

/// Metadata about a built prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPromptMetadata {
    #[serde(rename = "sourcePromptId")]
    pub source_prompt_id: String,

    /// Number of passages stuffed into the prompt
    #[serde(rename = "contextDocuments")]
    pub context_documents: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_definition_deserialization() {
        let yaml = r#"
id: hipaa.qa.default
title: Test Prompt
apiVersion: "1.0"
system: "Answer only from context."
template: "{{question}}"
"#;

        let def: PromptDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.id, "hipaa.qa.default");
        assert_eq!(def.system.as_deref(), Some("Answer only from context."));
        assert_eq!(def.template, "{{question}}");
    }

    #[test]
    fn test_older_prompt_files_with_output_section_still_load() {
        let yaml = r#"
id: hipaa.qa.custom
title: Custom
apiVersion: "1.0"
template: "{{question}}"
output:
  format: markdown
"#;

        let def: PromptDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.id, "hipaa.qa.custom");
        assert!(def.system.is_none());
    }

    #[test]
    fn test_context_document_omits_missing_page() {
        let doc = ContextDocument {
            source: "notes.md".to_string(),
            page: None,
            text: "Minimum necessary".to_string(),
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert!(json.get("page").is_none());
    }
}
