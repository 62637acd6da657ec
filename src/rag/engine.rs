//! The answering pipeline.

use super::{
    build_context, DetailLevel, Generator, PromptBuilder, Retriever, SourceRef, StreamSequencer,
    VideoRecommender,
};
use crate::error::{Result, TutorError};
use crate::index::RetrievedDocument;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Upper bound on retrieved documents placed in the prompt and `contexts`.
pub const MAX_CONTEXT_DOCUMENTS: usize = 4;

/// A blocking answer.
#[derive(Debug, Clone)]
pub struct Answer {
    /// The generated answer.
    pub answer: String,
    /// Page content of the documents the prompt was built from.
    pub contexts: Vec<String>,
    /// Citations for every retrieved document, in retrieval order.
    pub sources: Vec<SourceRef>,
}

/// Retrieved documents and the prompt rendered from them.
struct Prepared {
    documents: Vec<RetrievedDocument>,
    prompt: String,
}

/// Answers finance questions from the knowledge base.
///
/// Holds no per-request state and can be shared freely across requests.
pub struct TutorEngine {
    retriever: Retriever,
    prompt_builder: PromptBuilder,
    generator: Arc<dyn Generator>,
    videos: Arc<VideoRecommender>,
    max_context_documents: usize,
}

impl TutorEngine {
    pub fn new(
        retriever: Retriever,
        prompt_builder: PromptBuilder,
        generator: Arc<dyn Generator>,
        videos: VideoRecommender,
    ) -> Self {
        Self {
            retriever,
            prompt_builder,
            generator,
            videos: Arc::new(videos),
            max_context_documents: MAX_CONTEXT_DOCUMENTS,
        }
    }

    /// Set how many retrieved documents go into the prompt.
    ///
    /// Clamped to `1..=MAX_CONTEXT_DOCUMENTS`.
    pub fn with_max_context_documents(mut self, max: usize) -> Self {
        let clamped = max.clamp(1, MAX_CONTEXT_DOCUMENTS);
        if clamped != max {
            warn!("max_context_documents {} out of range, using {}", max, clamped);
        }
        self.max_context_documents = clamped;
        self
    }

    async fn prepare(&self, query: &str, level: DetailLevel) -> Result<Prepared> {
        if query.trim().is_empty() {
            return Err(TutorError::InvalidInput("query must not be empty".to_string()));
        }

        let documents = self.retriever.retrieve(query).await?;
        if documents.is_empty() {
            return Err(TutorError::NotFound(query.to_string()));
        }

        let context = build_context(&documents, self.max_context_documents);
        let prompt = self.prompt_builder.build(query, &context, level);

        Ok(Prepared { documents, prompt })
    }

    /// Answer a question in one blocking call.
    #[instrument(skip(self, level), fields(level = %level))]
    pub async fn ask(&self, query: &str, level: DetailLevel) -> Result<Answer> {
        info!("Processing question: {}", query);

        let Prepared { documents, prompt } = self.prepare(query, level).await?;
        let answer = self.generator.generate(&prompt).await?;

        Ok(Answer {
            answer,
            contexts: documents
                .iter()
                .take(self.max_context_documents)
                .map(|d| d.content.clone())
                .collect(),
            sources: documents.iter().map(SourceRef::from).collect(),
        })
    }

    /// Retrieve, start video recommendation and open the answer stream.
    ///
    /// Fails before any event is produced when the query is empty, nothing
    /// relevant is found, or the model cannot be reached.
    #[instrument(skip(self, level), fields(level = %level))]
    pub async fn open_stream(&self, query: &str, level: DetailLevel) -> Result<StreamSequencer> {
        info!("Processing streamed question: {}", query);

        let Prepared { documents, prompt } = self.prepare(query, level).await?;
        let videos = self.videos.recommend_in_background(query);
        let fragments = self.generator.generate_stream(&prompt).await?;

        let sources = documents.iter().map(SourceRef::from).collect();
        Ok(StreamSequencer::new(fragments, sources, videos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Prompts;
    use crate::rag::StreamEvent;
    use crate::testing::{doc, FakeEmbedder, ScriptedGenerator, ScriptedIndex};
    use futures::StreamExt;
    use tokio_test::{assert_err, assert_ok};

    struct Fixture {
        engine: TutorEngine,
        knowledge: Arc<ScriptedIndex>,
        generator: Arc<ScriptedGenerator>,
    }

    fn fixture(knowledge: ScriptedIndex, videos: ScriptedIndex, generator: ScriptedGenerator) -> Fixture {
        let embedder = Arc::new(FakeEmbedder);
        let knowledge = Arc::new(knowledge);
        let generator = Arc::new(generator);
        let engine = TutorEngine::new(
            Retriever::new(embedder.clone(), knowledge.clone()).with_top_k(10),
            PromptBuilder::new(Prompts::default()),
            generator.clone(),
            VideoRecommender::new(embedder, Arc::new(videos)),
        );
        Fixture {
            engine,
            knowledge,
            generator,
        }
    }

    fn kinds(events: &[StreamEvent]) -> Vec<&'static str> {
        events.iter().map(|e| e.kind()).collect()
    }

    #[tokio::test]
    async fn test_ask_uses_primary_results() {
        let f = fixture(
            ScriptedIndex::new(
                vec![doc("Money now beats money later", 0.9), doc("Discounting", 0.7)],
                vec![doc("fallback", 0.3)],
            ),
            ScriptedIndex::new(vec![], vec![]),
            ScriptedGenerator::new(&["A dollar today ", "is worth more."]),
        );

        let answer = assert_ok!(
            f.engine
                .ask("What is the time value of money?", DetailLevel::Regular)
                .await
        );

        assert_eq!(answer.answer, "A dollar today is worth more.");
        assert_eq!(answer.contexts, vec!["Money now beats money later", "Discounting"]);
        assert_eq!(answer.sources.len(), 2);
        assert_eq!(f.knowledge.plain_calls(), 0);

        let prompt = f.generator.last_prompt().unwrap();
        assert!(prompt.contains("Money now beats money later\n\nDiscounting"));
        assert!(prompt.contains("Question: What is the time value of money?"));
    }

    #[tokio::test]
    async fn test_contexts_are_first_four_in_order() {
        let docs: Vec<_> = (1..=6).map(|i| doc(&format!("chunk {}", i), 0.9)).collect();
        let f = fixture(
            ScriptedIndex::new(docs, vec![]),
            ScriptedIndex::new(vec![], vec![]),
            ScriptedGenerator::new(&["ok"]),
        );

        let answer = f.engine.ask("q", DetailLevel::Simple).await.unwrap();

        assert_eq!(answer.contexts, vec!["chunk 1", "chunk 2", "chunk 3", "chunk 4"]);
        assert_eq!(answer.sources.len(), 6);
        for (context, source) in answer.contexts.iter().zip(&answer.sources) {
            assert_eq!(source.heading, format!("{} (heading)", context));
        }
        let prompt = f.generator.last_prompt().unwrap();
        assert!(!prompt.contains("chunk 5"));
    }

    #[tokio::test]
    async fn test_context_limit_is_capped() {
        let docs: Vec<_> = (1..=6).map(|i| doc(&format!("chunk {}", i), 0.9)).collect();
        let f = fixture(
            ScriptedIndex::new(docs, vec![]),
            ScriptedIndex::new(vec![], vec![]),
            ScriptedGenerator::new(&["ok"]),
        );
        let engine = f.engine.with_max_context_documents(6);

        let answer = engine.ask("q", DetailLevel::Regular).await.unwrap();

        assert_eq!(answer.contexts.len(), MAX_CONTEXT_DOCUMENTS);
        assert_eq!(answer.contexts, vec!["chunk 1", "chunk 2", "chunk 3", "chunk 4"]);
        let prompt = f.generator.last_prompt().unwrap();
        assert!(prompt.contains("chunk 4"));
        assert!(!prompt.contains("chunk 5"));
    }

    #[tokio::test]
    async fn test_zero_context_limit_keeps_one_document() {
        let f = fixture(
            ScriptedIndex::new(vec![doc("Liquidity", 0.9), doc("Solvency", 0.8)], vec![]),
            ScriptedIndex::new(vec![], vec![]),
            ScriptedGenerator::new(&["ok"]),
        );
        let engine = f.engine.with_max_context_documents(0);

        let answer = engine.ask("q", DetailLevel::Regular).await.unwrap();

        assert_eq!(answer.contexts, vec!["Liquidity"]);
        assert!(f.generator.last_prompt().unwrap().contains("Liquidity"));
    }

    #[tokio::test]
    async fn test_ask_not_found_skips_generation() {
        let f = fixture(
            ScriptedIndex::new(vec![], vec![]),
            ScriptedIndex::new(vec![], vec![]),
            ScriptedGenerator::new(&["unused"]),
        );

        let err = assert_err!(f.engine.ask("asldkjasldkj nonsense", DetailLevel::Regular).await);

        assert!(err.is_not_found());
        assert_eq!(f.knowledge.plain_calls(), 1);
        assert!(f.generator.last_prompt().is_none());
    }

    #[tokio::test]
    async fn test_ask_rejects_blank_query() {
        let f = fixture(
            ScriptedIndex::new(vec![doc("a", 0.9)], vec![]),
            ScriptedIndex::new(vec![], vec![]),
            ScriptedGenerator::new(&["unused"]),
        );

        let err = f.engine.ask("   ", DetailLevel::Regular).await.unwrap_err();
        assert!(matches!(err, TutorError::InvalidInput(_)));
        assert_eq!(f.knowledge.thresholded_calls(), 0);
    }

    #[tokio::test]
    async fn test_ask_surfaces_model_failure() {
        let f = fixture(
            ScriptedIndex::new(vec![doc("a", 0.9)], vec![]),
            ScriptedIndex::new(vec![], vec![]),
            ScriptedGenerator::unavailable(),
        );

        let err = f.engine.ask("What is beta?", DetailLevel::Regular).await.unwrap_err();
        assert!(err.is_upstream());
    }

    #[tokio::test]
    async fn test_stream_sends_tokens_then_metadata() {
        let f = fixture(
            ScriptedIndex::new(vec![doc("Bonds pay coupons", 0.8)], vec![]),
            ScriptedIndex::new(vec![], vec![doc("Bonds 101", 0.5)]),
            ScriptedGenerator::new(&["Bonds ", "pay ", "interest."]),
        );

        let sequencer = f
            .engine
            .open_stream("How do bonds pay?", DetailLevel::InDepth)
            .await
            .unwrap();
        let events: Vec<_> = sequencer.into_events().collect().await;

        assert_eq!(kinds(&events), vec!["message", "message", "message", "metadata", "end"]);
        match &events[3] {
            StreamEvent::Metadata(metadata) => {
                assert_eq!(metadata.sources[0].heading, "Bonds pay coupons (heading)");
                assert_eq!(metadata.videos.len(), 1);
                assert_eq!(metadata.videos[0].title, "Bonds 101 (heading)");
            }
            other => panic!("expected metadata, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stream_survives_video_failure() {
        let f = fixture(
            ScriptedIndex::new(vec![doc("Equity is ownership", 0.8)], vec![]),
            ScriptedIndex::failing("video index down"),
            ScriptedGenerator::new(&["Equity ", "means ownership."]),
        );

        let events: Vec<_> = f
            .engine
            .open_stream("What is equity?", DetailLevel::Regular)
            .await
            .unwrap()
            .into_events()
            .collect()
            .await;

        assert_eq!(kinds(&events), vec!["message", "message", "metadata", "end"]);
        match &events[2] {
            StreamEvent::Metadata(metadata) => {
                assert_eq!(metadata.sources.len(), 1);
                assert!(metadata.videos.is_empty());
            }
            other => panic!("expected metadata, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stream_not_found_before_generation() {
        let f = fixture(
            ScriptedIndex::new(vec![], vec![]),
            ScriptedIndex::new(vec![], vec![]),
            ScriptedGenerator::new(&["unused"]),
        );

        let err = f
            .engine
            .open_stream("asldkjasldkj nonsense", DetailLevel::Regular)
            .await
            .err()
            .unwrap();

        assert!(err.is_not_found());
        assert!(f.generator.last_prompt().is_none());
    }

    #[tokio::test]
    async fn test_stream_midway_failure_is_single_error() {
        let f = fixture(
            ScriptedIndex::new(vec![doc("a", 0.9)], vec![]),
            ScriptedIndex::new(vec![], vec![doc("v", 0.5)]),
            ScriptedGenerator::failing_after(&["Half an "], "rate limited"),
        );

        let events: Vec<_> = f
            .engine
            .open_stream("q", DetailLevel::Regular)
            .await
            .unwrap()
            .into_events()
            .collect()
            .await;

        assert_eq!(kinds(&events), vec!["message", "error"]);
    }
}
