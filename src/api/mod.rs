//! HTTP API for the tutor.
//!
//! `GET /ask` answers in one response, `GET /ask/stream` answers as
//! server-sent events, `POST /generate-quiz` produces a knowledge check.

mod handlers;

pub use handlers::{answer_events, AppState, AskParams, AskResponse, QuizRequest};

use crate::error::{Result, TutorError};
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the API router.
pub fn router(state: AppState, allowed_origins: &[String]) -> Result<Router> {
    Ok(Router::new()
        .route("/health", get(handlers::health))
        .route("/ask", get(handlers::ask))
        .route("/ask/stream", get(handlers::ask_stream))
        .route("/generate-quiz", post(handlers::generate_quiz))
        .layer(cors_layer(allowed_origins)?)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// CORS for a fixed list of origins, with credentials.
///
/// Wildcards cannot be combined with credentials, so methods and headers
/// mirror the preflight request instead.
pub fn cors_layer(allowed_origins: &[String]) -> Result<CorsLayer> {
    let origins = allowed_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|e| TutorError::Config(format!("Invalid CORS origin {:?}: {}", origin, e)))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request()))
}
