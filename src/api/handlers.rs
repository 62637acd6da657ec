//! Request handlers.

use crate::error::TutorError;
use crate::orchestrator::Orchestrator;
use crate::quiz::QuizGenerator;
use crate::rag::{DetailLevel, StreamEvent, TutorEngine};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, KeepAliveStream, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::future;
use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{error, warn};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    engine: Arc<TutorEngine>,
    quiz: Arc<QuizGenerator>,
}

impl AppState {
    pub fn new(orchestrator: &Orchestrator) -> Self {
        Self {
            engine: orchestrator.engine(),
            quiz: orchestrator.quiz(),
        }
    }
}

// === Request/Response Types ===

#[derive(Debug, Deserialize)]
pub struct AskParams {
    pub query: String,
    #[serde(default, rename = "detailLevel")]
    pub detail_level: Option<String>,
}

impl AskParams {
    fn level(&self) -> DetailLevel {
        DetailLevel::from_param(self.detail_level.as_deref())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    pub contexts: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct QuizRequest {
    pub topic: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Log a failure and convert it into a status code.
fn error_response(context: &str, e: TutorError) -> Response {
    let status = match &e {
        TutorError::NotFound(_) => StatusCode::NOT_FOUND,
        TutorError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        error!("{} failed: {}", context, e);
    } else {
        warn!("{} rejected: {}", context, e);
    }

    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}

// === Handlers ===

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn ask(State(state): State<AppState>, Query(params): Query<AskParams>) -> Response {
    match state.engine.ask(&params.query, params.level()).await {
        Ok(answer) => Json(AskResponse {
            answer: answer.answer,
            contexts: answer.contexts,
        })
        .into_response(),
        Err(e) => error_response("ask", e),
    }
}

pub async fn ask_stream(
    State(state): State<AppState>,
    Query(params): Query<AskParams>,
) -> Sse<KeepAliveStream<BoxStream<'static, Result<Event, Infallible>>>> {
    let events = sse_frames(answer_events(state.engine.clone(), params));
    Sse::new(events).keep_alive(KeepAlive::default())
}

pub async fn generate_quiz(
    State(state): State<AppState>,
    Json(req): Json<QuizRequest>,
) -> Response {
    match state.quiz.generate(&req.topic).await {
        Ok(item) => Json(item).into_response(),
        Err(e) => error_response("generate-quiz", e),
    }
}

/// The full event sequence for one streamed question.
///
/// Failures before streaming starts become a single `error` event.
pub fn answer_events(engine: Arc<TutorEngine>, params: AskParams) -> BoxStream<'static, StreamEvent> {
    stream::once(async move { engine.open_stream(&params.query, params.level()).await })
        .flat_map(|opened| match opened {
            Ok(sequencer) => sequencer.into_events(),
            Err(e) => {
                if e.is_not_found() {
                    warn!("ask/stream found nothing: {}", e);
                } else {
                    error!("ask/stream failed: {}", e);
                }
                stream::iter([StreamEvent::Error(e.to_string())]).boxed()
            }
        })
        .boxed()
}

/// Frame events for the SSE transport.
///
/// The stream ends after the first terminal frame, so at most one of
/// `end` or `error` is ever sent.
fn sse_frames(events: BoxStream<'static, StreamEvent>) -> BoxStream<'static, Result<Event, Infallible>> {
    events
        .scan(false, |finished, event| {
            if *finished {
                return future::ready(None);
            }
            let (frame, terminal) = to_sse(event);
            *finished = terminal;
            future::ready(Some(Ok::<_, Infallible>(frame)))
        })
        .boxed()
}

/// Frame one stream event, flagging frames nothing may follow.
fn to_sse(event: StreamEvent) -> (Event, bool) {
    match event {
        StreamEvent::Message(text) => {
            let frame = Event::default().event("message").data(text.replace('\r', ""));
            (frame, false)
        }
        StreamEvent::Metadata(metadata) => json_frame("metadata", &metadata),
        StreamEvent::End => (Event::default().event("end").data(""), true),
        StreamEvent::Error(message) => (error_frame(&message), true),
    }
}

/// A JSON frame; an encoding failure becomes a terminal `error` frame.
fn json_frame<T: Serialize>(name: &str, value: &T) -> (Event, bool) {
    match Event::default().event(name).json_data(value) {
        Ok(frame) => (frame, false),
        Err(e) => {
            error!("Failed to encode stream {}: {}", name, e);
            (error_frame(&format!("failed to encode {}", name)), true)
        }
    }
}

fn error_frame(message: &str) -> Event {
    Event::default().event("error").data(message.replace('\r', ""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Prompts;
    use crate::rag::{PromptBuilder, Retriever, VideoRecommender};
    use crate::testing::{doc, FakeEmbedder, ScriptedGenerator, ScriptedIndex};

    const QUIZ: &str = r#"{"question": "What is a coupon?", "choices": ["Interest payment", "Discount", "Dividend", "Fee"], "correctAnswer": "Interest payment", "explanation": "Bonds pay coupons."}"#;

    fn state(knowledge: ScriptedIndex, fragments: &[&str]) -> AppState {
        let embedder = Arc::new(FakeEmbedder);
        let engine = TutorEngine::new(
            Retriever::new(embedder.clone(), Arc::new(knowledge)),
            PromptBuilder::new(Prompts::default()),
            Arc::new(ScriptedGenerator::new(fragments)),
            VideoRecommender::new(embedder, Arc::new(ScriptedIndex::new(vec![], vec![doc("video", 0.4)]))),
        );
        let quiz = QuizGenerator::new(Arc::new(ScriptedGenerator::new(&[QUIZ])), Prompts::default());
        AppState::new(&Orchestrator::from_parts(engine, quiz))
    }

    fn params(query: &str, level: Option<&str>) -> AskParams {
        AskParams {
            query: query.to_string(),
            detail_level: level.map(str::to_string),
        }
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_ask_ok() {
        let state = state(
            ScriptedIndex::new(vec![doc("TVM basics", 0.9), doc("Discount rates", 0.8)], vec![]),
            &["A dollar today is worth more."],
        );

        let response = ask(State(state), Query(params("What is the time value of money?", None))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: AskResponse = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(body.answer, "A dollar today is worth more.");
        assert_eq!(body.contexts, vec!["TVM basics", "Discount rates"]);
    }

    #[tokio::test]
    async fn test_ask_not_found_is_404() {
        let state = state(ScriptedIndex::new(vec![], vec![]), &["unused"]);

        let response = ask(State(state), Query(params("asldkjasldkj nonsense", Some("simple")))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("No relevant documents"));
    }

    #[tokio::test]
    async fn test_ask_upstream_failure_is_500() {
        let state = state(ScriptedIndex::failing("index unreachable"), &["unused"]);

        let response = ask(State(state), Query(params("What is beta?", None))).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_ask_blank_query_is_400() {
        let state = state(ScriptedIndex::new(vec![doc("a", 0.9)], vec![]), &["unused"]);

        let response = ask(State(state), Query(params("  ", None))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_stream_not_found_is_single_error_event() {
        let state = state(ScriptedIndex::new(vec![], vec![]), &["unused"]);

        let events: Vec<_> = answer_events(state.engine.clone(), params("asldkjasldkj nonsense", None))
            .collect()
            .await;

        assert_eq!(events.len(), 1);
        match &events[0] {
            StreamEvent::Error(message) => assert!(message.contains("No relevant documents")),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stream_success_sequence() {
        let state = state(
            ScriptedIndex::new(vec![doc("Stocks are shares", 0.9)], vec![]),
            &["Stocks ", "are ", "ownership."],
        );

        let events: Vec<_> = answer_events(state.engine.clone(), params("What is a stock?", Some("in-depth")))
            .collect()
            .await;

        let kinds: Vec<_> = events.iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, vec!["message", "message", "message", "metadata", "end"]);
    }

    #[tokio::test]
    async fn test_ask_stream_handler_responds() {
        let state = state(ScriptedIndex::new(vec![doc("a", 0.9)], vec![]), &["hi"]);

        let response = ask_stream(State(state), Query(params("q", None))).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "text/event-stream"
        );
    }

    #[tokio::test]
    async fn test_generate_quiz() {
        let state = state(ScriptedIndex::new(vec![], vec![]), &[]);

        let response = generate_quiz(
            State(state),
            Json(QuizRequest {
                topic: "bonds".to_string(),
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["choices"].as_array().unwrap().len(), 4);
        assert_eq!(body["correctAnswer"], "Interest payment");
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_ask_stream_wire_format() {
        let state = state(
            ScriptedIndex::new(vec![doc("Yield curve", 0.9)], vec![]),
            &["line one\r\nline two"],
        );

        let response = ask_stream(State(state), Query(params("What is a yield curve?", None)))
            .await
            .into_response();
        let body = body_text(response).await;

        assert!(!body.contains('\r'));
        let message = body.find("event: message\ndata: line one\ndata: line two\n").unwrap();
        let metadata = body.find("event: metadata\ndata: {").unwrap();
        let end = body.find("event: end\n").unwrap();
        assert!(message < metadata && metadata < end);
        assert!(body.contains("\"heading\":\"Yield curve (heading)\""));
        assert!(body.contains("\"title\":\"video (heading)\""));
        assert!(!body.contains("event: error"));
    }

    #[tokio::test]
    async fn test_ask_stream_wire_format_on_not_found() {
        let state = state(ScriptedIndex::new(vec![], vec![]), &["unused"]);

        let response = ask_stream(State(state), Query(params("asldkjasldkj", None)))
            .await
            .into_response();
        let body = body_text(response).await;

        assert!(body.starts_with("event: error\ndata: No relevant documents"));
        assert!(!body.contains("event: message"));
        assert!(!body.contains("event: end"));
    }

    #[tokio::test]
    async fn test_frames_stop_after_first_terminal() {
        let events = stream::iter([
            StreamEvent::Message("partial".to_string()),
            StreamEvent::Error("connection reset".to_string()),
            StreamEvent::End,
        ])
        .boxed();

        let frames: Vec<_> = sse_frames(events).collect().await;
        assert_eq!(frames.len(), 2);
    }

    struct Unencodable;

    impl Serialize for Unencodable {
        fn serialize<S: serde::Serializer>(&self, _serializer: S) -> std::result::Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("not encodable"))
        }
    }

    #[test]
    fn test_encoding_failure_is_terminal() {
        let (_, terminal) = json_frame("metadata", &Unencodable);
        assert!(terminal);

        let (_, terminal) = json_frame("metadata", &serde_json::json!({ "sources": [] }));
        assert!(!terminal);
    }
}
