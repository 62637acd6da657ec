//! HTTP API server command.

use crate::api::{self, AppState};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use tracing::info;

/// Run the HTTP API server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Serve, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let orchestrator = Orchestrator::connect(&settings).await?;
    let app = api::router(AppState::new(&orchestrator), &settings.server.allowed_origins)?;

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    Output::header("Finance Tutor API");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Ask", "GET  /ask?query=...&detailLevel=simple|regular|in-depth");
    Output::kv("Ask (SSE)", "GET  /ask/stream?query=...&detailLevel=...");
    Output::kv("Quiz", "POST /generate-quiz");
    println!();
    Output::kv("Allowed origins", &settings.server.allowed_origins.join(", "));
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}
