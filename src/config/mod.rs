//! Configuration module for the finance tutor.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AnswerPrompts, Prompts, QuizPrompts};
pub use settings::{
    EmbeddingSettings, GeneralSettings, IndexProvider, IndexSettings, LlmSettings,
    PromptSettings, RetrievalSettings, ServerSettings, Settings, VideoSettings,
};
