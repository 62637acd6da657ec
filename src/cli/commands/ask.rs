//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::rag::{DetailLevel, StreamEvent};
use anyhow::Result;
use futures::StreamExt;
use std::io::Write;

/// Run the ask command.
pub async fn run_ask(question: &str, detail: &str, stream: bool, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let level = DetailLevel::from_param(Some(detail));
    if level.as_str() != detail {
        Output::warning(&format!("Unknown detail level '{}', using regular.", detail));
    }

    let orchestrator = Orchestrator::connect(&settings).await?;
    let engine = orchestrator.engine();

    if !stream {
        let spinner = Output::spinner("Searching knowledge base...");
        let result = engine.ask(question, level).await;
        spinner.finish_and_clear();

        return match result {
            Ok(answer) => {
                println!("\n{}\n", answer.answer);
                if !answer.sources.is_empty() {
                    Output::header("Sources");
                    for source in &answer.sources {
                        Output::link(&source.heading, &source.url);
                    }
                }
                Ok(())
            }
            Err(e) => {
                Output::error(&format!("Failed to generate answer: {}", e));
                Err(e.into())
            }
        };
    }

    let spinner = Output::spinner("Searching knowledge base...");
    let opened = engine.open_stream(question, level).await;
    spinner.finish_and_clear();

    let mut events = match opened {
        Ok(sequencer) => sequencer.into_events(),
        Err(e) => {
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    };

    println!();
    let mut stdout = std::io::stdout();
    while let Some(event) = events.next().await {
        match event {
            StreamEvent::Message(text) => {
                print!("{}", text);
                stdout.flush()?;
            }
            StreamEvent::Metadata(metadata) => {
                println!("\n");
                if !metadata.sources.is_empty() {
                    Output::header("Sources");
                    for source in &metadata.sources {
                        Output::link(&source.heading, &source.url);
                    }
                }
                if !metadata.videos.is_empty() {
                    Output::header("Related Videos");
                    for video in &metadata.videos {
                        Output::link(&video.title, &video.url);
                    }
                }
            }
            StreamEvent::End => break,
            StreamEvent::Error(message) => {
                println!();
                Output::error(&format!("Answer stream failed: {}", message));
                anyhow::bail!(message);
            }
        }
    }

    Ok(())
}
