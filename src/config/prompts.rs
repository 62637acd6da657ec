//! Prompt templates for the finance tutor.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.
//! They are loaded once at startup and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub answer: AnswerPrompts,
    pub quiz: QuizPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for grounded answer generation.
///
/// `template` is shared by every detail level; only the style fragment
/// substituted for `{{style}}` changes between levels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerPrompts {
    pub template: String,
    pub simple: String,
    pub regular: String,
    pub in_depth: String,
}

impl Default for AnswerPrompts {
    fn default() -> Self {
        Self {
            template: r#"You are a finance tutor. Use the following context to answer the question.
Cite sources where appropriate. If the context does not contain the answer, say so.

Style:
{{style}}

Context:
{{context}}

Question: {{question}}
Answer:"#
                .to_string(),

            simple: r#"- Explain as if to someone with no finance background.
- Do not use jargon; if a finance term is unavoidable, replace it with everyday words.
- Keep sentences short and use a simple example where it helps."#
                .to_string(),

            regular: r#"- Define each finance term the first time you use it.
- Structure the answer as clear, numbered steps of reasoning.
- Finish with a one-sentence summary."#
                .to_string(),

            in_depth: r#"- Be technically precise and use the correct finance terminology.
- Refer explicitly to the source material the answer relies on.
- Do not introduce any information that is not present in the context."#
                .to_string(),
        }
    }
}

/// Prompts for knowledge-check quiz generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizPrompts {
    pub system: String,
    pub user: String,
}

impl Default for QuizPrompts {
    fn default() -> Self {
        Self {
            system: "You are a finance tutor who writes short knowledge-check questions. \
                     You always respond with a single JSON object and nothing else."
                .to_string(),

            user: r#"Write one multiple-choice question that checks understanding of this finance topic: {{topic}}

Respond with a JSON object of this exact shape:
{
  "question": "The question text",
  "choices": ["choice A", "choice B", "choice C", "choice D"],
  "correctAnswer": "the exact text of the correct choice",
  "explanation": "Why the correct answer is right"
}

Rules:
1. Provide exactly four choices.
2. "correctAnswer" must be copied verbatim from "choices".
3. Keep the explanation to two sentences."#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let answer_path = custom_path.join("answer.toml");
            if answer_path.exists() {
                let content = std::fs::read_to_string(&answer_path)?;
                prompts.answer = toml::from_str(&content)?;
            }

            let quiz_path = custom_path.join("quiz.toml");
            if quiz_path.exists() {
                let content = std::fs::read_to_string(&quiz_path)?;
                prompts.quiz = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Substitution is a single pass: text inserted for one placeholder is
    /// never scanned for further placeholders. Unknown placeholders are kept.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find("}}") {
                Some(end) => {
                    let key = &after[..end];
                    match vars.get(key.trim()) {
                        Some(value) => result.push_str(value),
                        None => {
                            result.push_str("{{");
                            result.push_str(key);
                            result.push_str("}}");
                        }
                    }
                    rest = &after[end + 2..];
                }
                None => {
                    result.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        result.push_str(rest);
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
