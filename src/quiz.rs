//! Knowledge-check quiz generation.
//!
//! A single prompt per topic; no retrieval is involved.

use crate::config::Prompts;
use crate::error::{Result, TutorError};
use crate::rag::Generator;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Number of choices every quiz item must carry.
pub const CHOICE_COUNT: usize = 4;

/// A multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizItem {
    pub question: String,
    pub choices: Vec<String>,
    #[serde(rename = "correctAnswer")]
    pub correct_answer: String,
    pub explanation: String,
}

impl QuizItem {
    /// Check the item has four choices and that the answer is one of them.
    pub fn validate(&self) -> Result<()> {
        if self.choices.len() != CHOICE_COUNT {
            return Err(TutorError::MalformedOutput(format!(
                "expected {} choices, got {}",
                CHOICE_COUNT,
                self.choices.len()
            )));
        }
        if !self.choices.contains(&self.correct_answer) {
            return Err(TutorError::MalformedOutput(format!(
                "correct answer {:?} is not one of the choices",
                self.correct_answer
            )));
        }
        Ok(())
    }
}

/// Parse a model response into a validated quiz item.
///
/// Tolerates prose or markdown fences around the JSON object.
pub fn parse_quiz(response: &str) -> Result<QuizItem> {
    let json_str = match (response.find('{'), response.rfind('}')) {
        (Some(start), Some(end)) if end > start => &response[start..=end],
        _ => {
            return Err(TutorError::MalformedOutput(
                "no JSON object in model response".to_string(),
            ))
        }
    };

    let item: QuizItem = serde_json::from_str(json_str)
        .map_err(|e| TutorError::MalformedOutput(format!("invalid quiz JSON: {}", e)))?;
    item.validate()?;
    Ok(item)
}

/// Generates quiz items for a topic.
pub struct QuizGenerator {
    generator: Arc<dyn Generator>,
    prompts: Prompts,
}

impl QuizGenerator {
    pub fn new(generator: Arc<dyn Generator>, prompts: Prompts) -> Self {
        Self { generator, prompts }
    }

    /// Generate one quiz item for `topic`.
    #[instrument(skip(self))]
    pub async fn generate(&self, topic: &str) -> Result<QuizItem> {
        if topic.trim().is_empty() {
            return Err(TutorError::InvalidInput("topic must not be empty".to_string()));
        }

        let mut vars = HashMap::new();
        vars.insert("topic".to_string(), topic.to_string());
        let prompt = self.prompts.render_with_custom(&self.prompts.quiz.user, &vars);

        let response = self.generator.generate(&prompt).await?;
        debug!("Quiz response: {} characters", response.len());

        parse_quiz(&response).inspect_err(|e| warn!("Rejected quiz for {:?}: {}", topic, e))
    }
}
