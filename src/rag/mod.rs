//! Retrieval-augmented answering for finance questions.
//!
//! A query flows through the [`Retriever`], the [`PromptBuilder`] and a
//! [`Generator`]; streaming answers are framed by the [`StreamSequencer`]
//! with citations and [`VideoRecommender`] results attached at the end.

mod engine;
mod generator;
mod prompt;
mod retriever;
mod stream;
mod videos;

pub use engine::{Answer, TutorEngine, MAX_CONTEXT_DOCUMENTS};
pub use generator::{FragmentStream, Generator, OpenAIGenerator};
pub use prompt::{build_context, DetailLevel, PromptBuilder};
pub use retriever::Retriever;
pub use stream::{StreamEvent, StreamMetadata, StreamSequencer};
pub use videos::VideoRecommender;

use crate::index::RetrievedDocument;
use serde::{Deserialize, Serialize};

/// A citation shown alongside an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    pub heading: String,
    pub url: String,
}

impl From<&RetrievedDocument> for SourceRef {
    fn from(doc: &RetrievedDocument) -> Self {
        Self {
            heading: doc.heading.clone(),
            url: doc.url.clone(),
        }
    }
}

/// A recommended video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRef {
    pub url: String,
    pub title: String,
}

impl From<RetrievedDocument> for VideoRef {
    fn from(doc: RetrievedDocument) -> Self {
        Self {
            url: doc.url,
            title: doc.heading,
        }
    }
}
