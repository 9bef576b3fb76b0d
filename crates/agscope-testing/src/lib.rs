//! Testing infrastructure for agscope integration tests.
//!
//! - `TestWorld`: isolated data directory and source roots, CLI execution
//! - `fixtures`: session log writers for each source layout
//! - `providers`: source-specific directory conventions
//! - `assertions`: checks over the CLI's JSON output

pub mod assertions;
pub mod fixtures;
pub mod providers;
pub mod world;

pub use fixtures::{ClaudeTranscript, CodexRollout, GeminiChat};
pub use providers::TestProvider;
pub use world::{CliResult, TestWorld};
