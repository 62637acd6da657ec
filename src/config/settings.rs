//! Configuration settings for the finance tutor.

use crate::error::TutorError;
use crate::rag::MAX_CONTEXT_DOCUMENTS;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub server: ServerSettings,
    pub llm: LlmSettings,
    pub embedding: EmbeddingSettings,
    pub index: IndexSettings,
    pub retrieval: RetrievalSettings,
    pub videos: VideoSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Origins allowed to call the API (credentials are allowed for these).
    pub allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "https://finance-tutor-ai.vercel.app".to_string(),
            ],
        }
    }
}

/// Language model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// OpenAI API key. `OPENAI_API_KEY` overrides this.
    pub api_key: Option<String>,
    /// Model for answer generation.
    pub model: String,
    /// Model for quiz generation.
    pub quiz_model: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gpt-4".to_string(),
            quiz_model: "gpt-4o-mini".to_string(),
            timeout_secs: crate::openai::DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model; must match the one the indices were built with.
    pub model: String,
    /// Output dimensions (only for models that support shortening).
    pub dimensions: Option<u32>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-ada-002".to_string(),
            dimensions: None,
        }
    }
}

/// Vector index backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum IndexProvider {
    /// Hosted Pinecone indices (default).
    #[default]
    Pinecone,
    /// In-process indices seeded from JSON files.
    Memory,
}

impl std::str::FromStr for IndexProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pinecone" => Ok(IndexProvider::Pinecone),
            "memory" => Ok(IndexProvider::Memory),
            _ => Err(format!("Unknown index provider: {}", s)),
        }
    }
}

impl std::fmt::Display for IndexProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexProvider::Pinecone => write!(f, "pinecone"),
            IndexProvider::Memory => write!(f, "memory"),
        }
    }
}

/// Knowledge base and video index settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub provider: IndexProvider,
    /// Pinecone API key. `PINECONE_API_KEY` overrides this.
    pub api_key: Option<String>,
    /// Knowledge base index name. `KNOWLEDGE_INDEX_NAME` overrides this.
    pub knowledge_index: String,
    /// Video transcript index name. `VIDEO_INDEX_NAME` overrides this.
    pub video_index: String,
    /// Explicit data-plane host for the knowledge index (skips host lookup).
    pub knowledge_host: Option<String>,
    /// Explicit data-plane host for the video index (skips host lookup).
    pub video_host: Option<String>,
    pub namespace: Option<String>,
    /// Seed file for the memory provider's knowledge index.
    pub knowledge_seed: Option<String>,
    /// Seed file for the memory provider's video index.
    pub video_seed: Option<String>,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            provider: IndexProvider::Pinecone,
            api_key: None,
            knowledge_index: "financetutor".to_string(),
            video_index: "youtube-index".to_string(),
            knowledge_host: None,
            video_host: None,
            namespace: None,
            knowledge_seed: None,
            video_seed: None,
        }
    }
}

/// Knowledge base retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Number of nearest neighbours to fetch.
    pub top_k: usize,
    /// Minimum relevance score for the primary search.
    pub score_threshold: f32,
    /// Maximum number of documents stuffed into the prompt.
    pub max_context_documents: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 3,
            score_threshold: 0.6,
            max_context_documents: MAX_CONTEXT_DOCUMENTS,
        }
    }
}

/// Video recommendation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoSettings {
    pub top_k: usize,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self { top_k: 3 }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    ///
    /// Environment variables are applied on top of the file.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.apply_env_with(|key| std::env::var(key).ok());
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values no backend can serve.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.retrieval.top_k == 0 {
            return Err(TutorError::Config("retrieval.top_k must be at least 1".to_string()));
        }
        if self.videos.top_k == 0 {
            return Err(TutorError::Config("videos.top_k must be at least 1".to_string()));
        }
        let max = self.retrieval.max_context_documents;
        if !(1..=MAX_CONTEXT_DOCUMENTS).contains(&max) {
            return Err(TutorError::Config(format!(
                "retrieval.max_context_documents must be between 1 and {}, got {}",
                MAX_CONTEXT_DOCUMENTS, max
            )));
        }
        Ok(())
    }

    /// Apply environment overrides using the given lookup.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("OPENAI_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(key) = get("PINECONE_API_KEY") {
            self.index.api_key = Some(key);
        }
        if let Some(name) = get("KNOWLEDGE_INDEX_NAME") {
            self.index.knowledge_index = name;
        }
        if let Some(name) = get("VIDEO_INDEX_NAME") {
            self.index.video_index = name;
        }
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fintutor")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }
}
