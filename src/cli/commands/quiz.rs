//! Quiz command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the quiz command, printing the item as JSON.
pub async fn run_quiz(topic: &str, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Quiz, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let orchestrator = Orchestrator::connect(&settings).await?;

    let spinner = Output::spinner("Writing a question...");
    let result = orchestrator.quiz().generate(topic).await;
    spinner.finish_and_clear();

    match result {
        Ok(item) => {
            println!("{}", serde_json::to_string_pretty(&item)?);
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Failed to generate quiz: {}", e));
            Err(e.into())
        }
    }
}
