use crate::types::{LogLevel, OutputFormat, ShowMode, parse_since, parse_until};
use agscope_types::{EventKind, Source};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "agscope")]
#[command(about = "Search Codex, Claude Code and Gemini CLI session logs", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Data directory holding config.toml (defaults to $AGSCOPE_PATH, then the platform data dir)
    #[arg(long, global = true)]
    pub data_dir: Option<String>,

    #[arg(long, default_value = "plain", global = true)]
    pub format: OutputFormat,

    /// Overrides RUST_LOG
    #[arg(long, global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Index every enabled source and report what was found
    Index,

    /// List sessions, most recent first
    List {
        #[arg(long)]
        source: Option<Source>,

        #[arg(long, default_value = "50")]
        limit: usize,
    },

    /// Search session contents, small files first
    Search {
        query: String,

        /// Repeatable; defaults to every enabled source
        #[arg(long)]
        source: Vec<Source>,

        #[arg(long, value_parser = parse_since)]
        since: Option<DateTime<Utc>>,

        #[arg(long, value_parser = parse_until)]
        until: Option<DateTime<Utc>>,

        /// Case-insensitive substring of the model name
        #[arg(long)]
        model: Option<String>,

        /// Repeatable: user, assistant, tool_call, tool_result, error, meta
        #[arg(long)]
        kind: Vec<EventKind>,

        /// Repository name or a substring of the working directory
        #[arg(long)]
        project: Option<String>,

        #[arg(long, default_value = "50")]
        limit: usize,
    },

    /// Render one session
    Show {
        /// Session id or a unique prefix of it
        id: String,

        #[arg(long, default_value = "transcript")]
        mode: ShowMode,

        #[arg(long)]
        timestamps: bool,

        /// Include bookkeeping records
        #[arg(long)]
        meta: bool,
    },
}
