//! Pre-flight checks before talking to external services.
//!
//! Validates that required credentials are configured before starting
//! operations that would otherwise fail on the first request.

use crate::config::{IndexProvider, Settings};
use crate::error::{Result, TutorError};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Serving needs the model and both indices.
    Serve,
    /// Asking needs the model and both indices.
    Ask,
    /// Quizzes only need the model.
    Quiz,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Serve | Operation::Ask => {
            check_openai_key(settings)?;
            check_index(settings)?;
        }
        Operation::Quiz => {
            check_openai_key(settings)?;
        }
    }
    Ok(())
}

fn check_openai_key(settings: &Settings) -> Result<()> {
    match settings.llm.api_key.as_deref() {
        Some(key) if !key.is_empty() => Ok(()),
        _ => Err(TutorError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

fn check_index(settings: &Settings) -> Result<()> {
    let index = &settings.index;
    match index.provider {
        IndexProvider::Pinecone => match index.api_key.as_deref() {
            Some(key) if !key.is_empty() => Ok(()),
            _ => Err(TutorError::Config(
                "PINECONE_API_KEY not set. Set it with: export PINECONE_API_KEY='...'".to_string(),
            )),
        },
        IndexProvider::Memory => {
            for seed in [&index.knowledge_seed, &index.video_seed].into_iter().flatten() {
                let path = Settings::expand_path(seed);
                if !path.exists() {
                    return Err(TutorError::Config(format!(
                        "Seed file not found: {}",
                        path.display()
                    )));
                }
            }
            Ok(())
        }
    }
}
