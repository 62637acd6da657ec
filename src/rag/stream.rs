//! Ordering of streamed answer events.
//!
//! A stream is always `message* (metadata end | error)`.

use super::{FragmentStream, SourceRef, VideoRef};
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, BoxStream, StreamExt};
use serde::Serialize;
use std::future::Future;
use tracing::{debug, error};

/// Citations and videos sent once generation has finished.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamMetadata {
    pub sources: Vec<SourceRef>,
    pub videos: Vec<VideoRef>,
}

/// One event of a streamed answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum StreamEvent {
    Message(String),
    Metadata(StreamMetadata),
    End,
    Error(String),
}

impl StreamEvent {
    /// Event name used on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            StreamEvent::Message(_) => "message",
            StreamEvent::Metadata(_) => "metadata",
            StreamEvent::End => "end",
            StreamEvent::Error(_) => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::End | StreamEvent::Error(_))
    }
}

enum Phase {
    Generating {
        fragments: FragmentStream,
        sources: Vec<SourceRef>,
        videos: BoxFuture<'static, Vec<VideoRef>>,
    },
    Finishing,
    Done,
}

/// Turns a fragment stream plus side-channel data into ordered events.
pub struct StreamSequencer {
    fragments: FragmentStream,
    sources: Vec<SourceRef>,
    videos: BoxFuture<'static, Vec<VideoRef>>,
}

impl StreamSequencer {
    /// `videos` may still be running; it is awaited only after the last fragment.
    pub fn new<F>(fragments: FragmentStream, sources: Vec<SourceRef>, videos: F) -> Self
    where
        F: Future<Output = Vec<VideoRef>> + Send + 'static,
    {
        Self {
            fragments,
            sources,
            videos: videos.boxed(),
        }
    }

    /// Consume into the event stream.
    ///
    /// Nothing is pulled from upstream until the returned stream is polled,
    /// and dropping it drops the upstream fragment stream.
    pub fn into_events(self) -> BoxStream<'static, StreamEvent> {
        let start = Phase::Generating {
            fragments: self.fragments,
            sources: self.sources,
            videos: self.videos,
        };

        stream::unfold(start, |phase| async move {
            match phase {
                Phase::Generating {
                    mut fragments,
                    sources,
                    videos,
                } => {
                    loop {
                        let item = fragments.next().await;
                        match item {
                            None => break,
                            Some(Ok(fragment)) if fragment.is_empty() => continue,
                            Some(Ok(fragment)) => {
                                let next = Phase::Generating {
                                    fragments,
                                    sources,
                                    videos,
                                };
                                return Some((StreamEvent::Message(fragment), next));
                            }
                            Some(Err(e)) => {
                                error!("Answer stream failed: {}", e);
                                return Some((StreamEvent::Error(e.to_string()), Phase::Done));
                            }
                        }
                    }
                    drop(fragments);

                    let videos = videos.await;
                    debug!(
                        "Generation finished; sending {} sources and {} videos",
                        sources.len(),
                        videos.len()
                    );
                    let metadata = StreamMetadata { sources, videos };
                    Some((StreamEvent::Metadata(metadata), Phase::Finishing))
                }
                Phase::Finishing => Some((StreamEvent::End, Phase::Done)),
                Phase::Done => None,
            }
        })
        .boxed()
    }
}
