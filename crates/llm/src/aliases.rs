//! Model identifier aliases.
//!
//! Hosted providers retire model identifiers. An alias table maps a
//! retired identifier to its replacement so stored configuration keeps
//! working. The table is empty unless configured.

use hipaa_core::{AppError, AppResult};
use std::collections::{HashMap, HashSet};

/// Mapping from deprecated model identifiers to replacements.
#[derive(Debug, Clone, Default)]
pub struct ModelAliases {
    aliases: HashMap<String, String>,
}

impl ModelAliases {
    pub fn new(aliases: HashMap<String, String>) -> Self {
        Self { aliases }
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Resolve a model identifier, following chained aliases.
    ///
    /// Identifiers without an entry resolve to themselves. A cycle in the
    /// table is a configuration error.
    pub fn resolve(&self, model: &str) -> AppResult<String> {
        let mut current = model;
        let mut seen = HashSet::new();

        while let Some(next) = self.aliases.get(current) {
            if !seen.insert(current) {
                return Err(AppError::Config(format!(
                    "Model alias cycle detected starting at '{}'",
                    model
                )));
            }
            current = next;
        }

        if current != model {
            tracing::info!("Model '{}' resolved to '{}'", model, current);
        }

        Ok(current.to_string())
    }
}
