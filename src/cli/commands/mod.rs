//! CLI command implementations.

mod ask;
mod config;
mod quiz;
mod serve;

pub use ask::run_ask;
pub use config::run_config;
pub use quiz::run_quiz;
pub use serve::run_serve;
