//! Video recommendations from the transcript index.

use super::VideoRef;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::index::VectorIndex;
use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

/// Recommends transcript chunks related to a query.
///
/// There is no relevance bar; recommendations are supplementary.
pub struct VideoRecommender {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    top_k: usize,
}

/// Aborts the task when the handle is dropped unawaited.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

impl VideoRecommender {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self {
            embedder,
            index,
            top_k: 3,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Plain top-k search against the video index.
    #[instrument(skip(self), fields(index = self.index.name()))]
    pub async fn recommend(&self, query: &str) -> Result<Vec<VideoRef>> {
        let query_embedding = self.embedder.embed(query).await?;
        let hits = self.index.search(&query_embedding, self.top_k).await?;
        debug!("{} video recommendations", hits.len());
        Ok(hits.into_iter().map(VideoRef::from).collect())
    }

    /// Start recommending on a background task.
    ///
    /// The returned future never fails: errors are logged and yield no videos.
    /// Dropping it before completion aborts the task.
    pub fn recommend_in_background(self: &Arc<Self>, query: &str) -> BoxFuture<'static, Vec<VideoRef>> {
        let recommender = Arc::clone(self);
        let query = query.to_string();
        let task = AbortOnDrop(tokio::spawn(async move { recommender.recommend(&query).await }));

        async move {
            let mut task = task;
            match (&mut task.0).await {
                Ok(Ok(videos)) => videos,
                Ok(Err(e)) => {
                    warn!("Video recommendation failed, continuing without videos: {}", e);
                    Vec::new()
                }
                Err(e) => {
                    warn!("Video recommendation task did not finish: {}", e);
                    Vec::new()
                }
            }
        }
        .boxed()
    }
}
