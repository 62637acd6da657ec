//! Service wiring for the finance tutor.
//!
//! Builds the shared clients once and hands out the engine and quiz generator.

use crate::config::{IndexProvider, Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{Result, TutorError};
use crate::index::{MemoryIndex, PineconeIndex, VectorIndex};
use crate::openai::create_client_with_timeout;
use crate::quiz::QuizGenerator;
use crate::rag::{OpenAIGenerator, PromptBuilder, Retriever, TutorEngine, VideoRecommender};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

/// Owns the long-lived services.
pub struct Orchestrator {
    engine: Arc<TutorEngine>,
    quiz: Arc<QuizGenerator>,
}

impl Orchestrator {
    /// Connect to the language model and both indices.
    #[instrument(skip(settings), fields(provider = %settings.index.provider))]
    pub async fn connect(settings: &Settings) -> Result<Self> {
        settings.validate()?;

        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let timeout = Duration::from_secs(settings.llm.timeout_secs);
        let client = create_client_with_timeout(settings.llm.api_key.as_deref(), timeout)?;

        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::new(
            client.clone(),
            &settings.embedding.model,
            settings.embedding.dimensions,
        ));

        let (knowledge, videos) = Self::connect_indices(settings, embedder.as_ref(), timeout).await?;

        let retriever = Retriever::new(embedder.clone(), knowledge)
            .with_top_k(settings.retrieval.top_k)
            .with_threshold(settings.retrieval.score_threshold);
        let recommender =
            VideoRecommender::new(embedder, videos).with_top_k(settings.videos.top_k);

        let answer_generator = Arc::new(OpenAIGenerator::new(client.clone(), &settings.llm.model));
        let engine = TutorEngine::new(
            retriever,
            PromptBuilder::new(prompts.clone()),
            answer_generator,
            recommender,
        )
        .with_max_context_documents(settings.retrieval.max_context_documents);

        let quiz_generator = Arc::new(
            OpenAIGenerator::new(client, &settings.llm.quiz_model)
                .with_system_prompt(&prompts.quiz.system)
                .with_temperature(0.7),
        );
        let quiz = QuizGenerator::new(quiz_generator, prompts);

        info!(
            "Services ready (model {}, knowledge index {}, video index {})",
            settings.llm.model, settings.index.knowledge_index, settings.index.video_index
        );

        Ok(Self {
            engine: Arc::new(engine),
            quiz: Arc::new(quiz),
        })
    }

    async fn connect_indices(
        settings: &Settings,
        embedder: &dyn Embedder,
        timeout: Duration,
    ) -> Result<(Arc<dyn VectorIndex>, Arc<dyn VectorIndex>)> {
        let index = &settings.index;

        match index.provider {
            IndexProvider::Pinecone => {
                let api_key = index.api_key.as_deref().ok_or_else(|| {
                    TutorError::Config(
                        "PINECONE_API_KEY not set. Set it with: export PINECONE_API_KEY='...'"
                            .to_string(),
                    )
                })?;
                let http = reqwest::Client::builder()
                    .timeout(timeout)
                    .build()
                    .map_err(|e| TutorError::Config(format!("Failed to create HTTP client: {}", e)))?;

                let knowledge = PineconeIndex::connect(
                    http.clone(),
                    api_key,
                    &index.knowledge_index,
                    index.knowledge_host.as_deref(),
                    index.namespace.as_deref(),
                )
                .await?;
                let videos = PineconeIndex::connect(
                    http,
                    api_key,
                    &index.video_index,
                    index.video_host.as_deref(),
                    index.namespace.as_deref(),
                )
                .await?;

                Ok((Arc::new(knowledge), Arc::new(videos)))
            }
            IndexProvider::Memory => {
                let knowledge =
                    Self::memory_index(&index.knowledge_index, index.knowledge_seed.as_deref(), embedder)
                        .await?;
                let videos =
                    Self::memory_index(&index.video_index, index.video_seed.as_deref(), embedder)
                        .await?;

                Ok((Arc::new(knowledge), Arc::new(videos)))
            }
        }
    }

    async fn memory_index(name: &str, seed: Option<&str>, embedder: &dyn Embedder) -> Result<MemoryIndex> {
        match seed {
            Some(path) => MemoryIndex::from_seed_file(name, &Settings::expand_path(path), embedder).await,
            None => Ok(MemoryIndex::new(name)),
        }
    }

    /// Build from already-constructed services.
    pub fn from_parts(engine: TutorEngine, quiz: QuizGenerator) -> Self {
        Self {
            engine: Arc::new(engine),
            quiz: Arc::new(quiz),
        }
    }

    pub fn engine(&self) -> Arc<TutorEngine> {
        self.engine.clone()
    }

    pub fn quiz(&self) -> Arc<QuizGenerator> {
        self.quiz.clone()
    }
}
