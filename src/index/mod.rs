//! Vector index abstraction over the knowledge base and video transcripts.
//!
//! Both indices are populated offline; this crate only queries them.

mod memory;
mod pinecone;

pub use memory::{MemoryIndex, SeedDocument};
pub use pinecone::PineconeIndex;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A chunk returned by a similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    /// Page content of the chunk.
    pub content: String,
    /// Section heading, or the video title for transcript chunks.
    pub heading: String,
    /// Link to the source page or timestamped video.
    pub url: String,
    /// Similarity score (higher is better).
    pub relevance_score: f32,
}

/// Trait for similarity search backends.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Index name, for logging.
    fn name(&self) -> &str;

    /// Plain top-k similarity search.
    async fn search(&self, query_embedding: &[f32], k: usize) -> Result<Vec<RetrievedDocument>>;

    /// Top-k similarity search restricted to scores of at least `min_score`.
    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        k: usize,
        min_score: f32,
    ) -> Result<Vec<RetrievedDocument>>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
