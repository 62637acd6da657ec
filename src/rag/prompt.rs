//! Detail-level prompt construction.

use crate::config::Prompts;
use crate::index::RetrievedDocument;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// How technical the answer should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetailLevel {
    Simple,
    #[default]
    Regular,
    InDepth,
}

impl DetailLevel {
    /// Parse a caller-supplied level. Anything unrecognised, including a
    /// missing value, is `Regular`.
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("simple") => DetailLevel::Simple,
            Some("regular") => DetailLevel::Regular,
            Some("in-depth") => DetailLevel::InDepth,
            Some(other) => {
                debug!("Unknown detail level {:?}, using regular", other);
                DetailLevel::Regular
            }
            None => DetailLevel::Regular,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DetailLevel::Simple => "simple",
            DetailLevel::Regular => "regular",
            DetailLevel::InDepth => "in-depth",
        }
    }
}

impl std::fmt::Display for DetailLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Join the page content of the first `max_documents` documents with blank lines.
pub fn build_context(documents: &[RetrievedDocument], max_documents: usize) -> String {
    documents
        .iter()
        .take(max_documents)
        .map(|d| d.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Renders answer prompts from the shared template and a per-level style block.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    prompts: Prompts,
}

impl PromptBuilder {
    pub fn new(prompts: Prompts) -> Self {
        Self { prompts }
    }

    fn style(&self, level: DetailLevel) -> &str {
        match level {
            DetailLevel::Simple => &self.prompts.answer.simple,
            DetailLevel::Regular => &self.prompts.answer.regular,
            DetailLevel::InDepth => &self.prompts.answer.in_depth,
        }
    }

    /// The template for a level, with `{{context}}` and `{{question}}` still open.
    pub fn template(&self, level: DetailLevel) -> String {
        let mut vars = HashMap::new();
        vars.insert("style".to_string(), self.style(level).to_string());
        self.prompts
            .render_with_custom(&self.prompts.answer.template, &vars)
    }

    /// Render the full prompt.
    pub fn build(&self, question: &str, context: &str, level: DetailLevel) -> String {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), context.to_string());
        vars.insert("question".to_string(), question.to_string());
        Prompts::render(&self.template(level), &vars)
    }
}
