//! Two-tier knowledge base retrieval.

use crate::embedding::Embedder;
use crate::error::Result;
use crate::index::{RetrievedDocument, VectorIndex};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Retrieves documents for a query, relaxing the relevance bar when nothing clears it.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    top_k: usize,
    threshold: f32,
}

impl Retriever {
    /// Create a retriever with the default `k = 3` and threshold `0.6`.
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self {
            embedder,
            index,
            top_k: 3,
            threshold: 0.6,
        }
    }

    /// Set the number of nearest neighbours to fetch.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set the minimum relevance score for the primary search.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Retrieve documents in relevance order.
    ///
    /// Runs a thresholded search first and falls back to a plain top-k search
    /// only when it comes back empty. Search failures are returned as errors,
    /// never treated as empty. An empty `Ok` means nothing relevant exists.
    #[instrument(skip(self), fields(index = self.index.name()))]
    pub async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedDocument>> {
        let query_embedding = self.embedder.embed(query).await?;

        let documents = self
            .index
            .search_with_threshold(&query_embedding, self.top_k, self.threshold)
            .await?;

        if !documents.is_empty() {
            debug!("{} documents above threshold {}", documents.len(), self.threshold);
            return Ok(documents);
        }

        info!(
            "No documents above threshold {}, falling back to top-{} search",
            self.threshold, self.top_k
        );
        let documents = self.index.search(&query_embedding, self.top_k).await?;
        debug!("Fallback search returned {} documents", documents.len());
        Ok(documents)
    }
}
