//! Scripted collaborators shared by unit tests.

use crate::embedding::Embedder;
use crate::error::{Result, TutorError};
use crate::index::{RetrievedDocument, VectorIndex};
use crate::rag::{FragmentStream, Generator};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Deterministic embedder: a short vector derived from the text bytes.
pub struct FakeEmbedder;

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let sum: u32 = text.bytes().map(u32::from).sum();
        Ok(vec![text.len() as f32, (sum % 97) as f32, 1.0])
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}

pub fn doc(content: &str, score: f32) -> RetrievedDocument {
    RetrievedDocument {
        content: content.to_string(),
        heading: format!("{} (heading)", content),
        url: format!("https://kb.example/{}", content.replace(' ', "-")),
        relevance_score: score,
    }
}

enum Outcome {
    Docs(Vec<RetrievedDocument>),
    Fail(String),
}

impl Outcome {
    fn resolve(&self, k: usize) -> Result<Vec<RetrievedDocument>> {
        match self {
            Outcome::Docs(docs) => Ok(docs.iter().take(k).cloned().collect()),
            Outcome::Fail(msg) => Err(TutorError::Index(msg.clone())),
        }
    }
}

/// Index with fixed answers for the thresholded and plain searches.
pub struct ScriptedIndex {
    thresholded: Outcome,
    plain: Outcome,
    pub thresholded_calls: AtomicUsize,
    pub plain_calls: AtomicUsize,
}

impl ScriptedIndex {
    pub fn new(thresholded: Vec<RetrievedDocument>, plain: Vec<RetrievedDocument>) -> Self {
        Self {
            thresholded: Outcome::Docs(thresholded),
            plain: Outcome::Docs(plain),
            thresholded_calls: AtomicUsize::new(0),
            plain_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            thresholded: Outcome::Fail(msg.to_string()),
            plain: Outcome::Fail(msg.to_string()),
            thresholded_calls: AtomicUsize::new(0),
            plain_calls: AtomicUsize::new(0),
        }
    }

    pub fn thresholded_calls(&self) -> usize {
        self.thresholded_calls.load(Ordering::SeqCst)
    }

    pub fn plain_calls(&self) -> usize {
        self.plain_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VectorIndex for ScriptedIndex {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn search(&self, _query_embedding: &[f32], k: usize) -> Result<Vec<RetrievedDocument>> {
        self.plain_calls.fetch_add(1, Ordering::SeqCst);
        self.plain.resolve(k)
    }

    async fn search_with_threshold(
        &self,
        _query_embedding: &[f32],
        k: usize,
        _min_score: f32,
    ) -> Result<Vec<RetrievedDocument>> {
        self.thresholded_calls.fetch_add(1, Ordering::SeqCst);
        self.thresholded.resolve(k)
    }
}

/// Generator replaying fixed fragments and recording the prompts it saw.
pub struct ScriptedGenerator {
    fragments: Vec<std::result::Result<String, String>>,
    fail_to_open: bool,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(fragments: &[&str]) -> Self {
        Self {
            fragments: fragments.iter().map(|f| Ok(f.to_string())).collect(),
            fail_to_open: false,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Emit the given fragments, then fail mid-stream.
    pub fn failing_after(fragments: &[&str], msg: &str) -> Self {
        let mut generator = Self::new(fragments);
        generator.fragments.push(Err(msg.to_string()));
        generator
    }

    /// Refuse to answer at all.
    pub fn unavailable() -> Self {
        let mut generator = Self::new(&[]);
        generator.fail_to_open = true;
        generator
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }

    fn record(&self, prompt: &str) -> Result<()> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if self.fail_to_open {
            return Err(TutorError::Upstream("model unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.record(prompt)?;
        let mut answer = String::new();
        for fragment in &self.fragments {
            match fragment {
                Ok(text) => answer.push_str(text),
                Err(msg) => return Err(TutorError::Upstream(msg.clone())),
            }
        }
        Ok(answer)
    }

    async fn generate_stream(&self, prompt: &str) -> Result<FragmentStream> {
        self.record(prompt)?;
        let items: Vec<Result<String>> = self
            .fragments
            .iter()
            .map(|f| f.clone().map_err(TutorError::Upstream))
            .collect();
        Ok(stream::iter(items).boxed())
    }
}
