//! Error types for the finance tutor.

use thiserror::Error;

/// Library-level error type for tutor operations.
#[derive(Error, Debug)]
pub enum TutorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No relevant documents found: {0}")]
    NotFound(String),

    #[error("Language model error: {0}")]
    Upstream(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector index error: {0}")]
    Index(String),

    #[error("Malformed model output: {0}")]
    MalformedOutput(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl TutorError {
    /// Whether retrieval came back empty, as opposed to failing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, TutorError::NotFound(_))
    }

    /// Whether a collaborator (index, embedder or language model) failed.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            TutorError::Upstream(_)
                | TutorError::Embedding(_)
                | TutorError::Index(_)
                | TutorError::Http(_)
        )
    }
}

/// Result type alias for tutor operations.
pub type Result<T> = std::result::Result<T, TutorError>;
