//! In-memory vector index.
//!
//! Useful for tests and for running offline against a small seed corpus.

use super::{cosine_similarity, RetrievedDocument, VectorIndex};
use crate::embedding::Embedder;
use crate::error::{Result, TutorError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// A document in a seed file, before embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedDocument {
    pub content: String,
    #[serde(default)]
    pub heading: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone)]
struct Entry {
    document: SeedDocument,
    embedding: Vec<f32>,
}

/// Read-only in-memory index.
pub struct MemoryIndex {
    name: String,
    entries: Vec<Entry>,
}

impl MemoryIndex {
    /// Create an empty index.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: Vec::new(),
        }
    }

    /// Add a pre-embedded document.
    pub fn with_document(mut self, document: SeedDocument, embedding: Vec<f32>) -> Self {
        self.entries.push(Entry {
            document,
            embedding,
        });
        self
    }

    /// Load a JSON array of seed documents and embed them.
    pub async fn from_seed_file(name: &str, path: &Path, embedder: &dyn Embedder) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let documents: Vec<SeedDocument> = serde_json::from_str(&content)?;

        let texts: Vec<String> = documents.iter().map(|d| d.content.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;
        if embeddings.len() != documents.len() {
            return Err(TutorError::Embedding(format!(
                "Expected {} embeddings for seed file {}, got {}",
                documents.len(),
                path.display(),
                embeddings.len()
            )));
        }

        let mut index = Self::new(name);
        for (document, embedding) in documents.into_iter().zip(embeddings) {
            index = index.with_document(document, embedding);
        }

        info!("Loaded {} documents into memory index {}", index.len(), name);
        Ok(index)
    }

    /// Number of documents in the index.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no documents.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, query_embedding: &[f32], k: usize) -> Result<Vec<RetrievedDocument>> {
        self.search_with_threshold(query_embedding, k, f32::MIN).await
    }

    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        k: usize,
        min_score: f32,
    ) -> Result<Vec<RetrievedDocument>> {
        let mut results: Vec<RetrievedDocument> = self
            .entries
            .iter()
            .map(|entry| RetrievedDocument {
                content: entry.document.content.clone(),
                heading: entry.document.heading.clone(),
                url: entry.document.url.clone(),
                relevance_score: cosine_similarity(query_embedding, &entry.embedding),
            })
            .filter(|d| d.relevance_score >= min_score)
            .collect();

        results.sort_by(|a, b| {
            b.relevance_score
                .partial_cmp(&a.relevance_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(k);

        Ok(results)
    }
}
