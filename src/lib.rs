//! Finance Tutor - Retrieval-Augmented Answers for Finance Education
//!
//! Answers finance questions from a pre-built knowledge base, at a
//! caller-selected level of detail, with citations and related videos.
//!
//! # Overview
//!
//! The tutor:
//! - Retrieves relevant passages, relaxing the relevance bar when nothing clears it
//! - Builds a prompt tuned to a simple, regular or in-depth explanation
//! - Generates the answer in one call or as a token stream
//! - Attaches sources and recommended videos to streamed answers
//! - Writes multiple-choice knowledge checks for a topic
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `embedding` - Query embedding
//! - `index` - Knowledge base and video index access
//! - `rag` - Retrieval, prompting, generation and stream sequencing
//! - `quiz` - Knowledge-check generation
//! - `orchestrator` - Service wiring
//! - `api` - HTTP endpoints
//! - `cli` - Command-line interface
//!
//! # Example
//!
//! ```rust,no_run
//! use fintutor::config::Settings;
//! use fintutor::orchestrator::Orchestrator;
//! use fintutor::rag::DetailLevel;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::connect(&settings).await?;
//!
//!     let answer = orchestrator
//!         .engine()
//!         .ask("What is the time value of money?", DetailLevel::Simple)
//!         .await?;
//!     println!("{}", answer.answer);
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod index;
pub mod openai;
pub mod orchestrator;
pub mod quiz;
pub mod rag;

#[cfg(test)]
mod testing;

pub use error::{Result, TutorError};
