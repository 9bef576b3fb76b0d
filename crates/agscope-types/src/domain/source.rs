use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Agent CLI that produced a session log
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Codex CLI: line-delimited JSON sharded into dated directories
    Codex,
    /// Claude Code: per-project logs with nested role/content wrappers
    Claude,
    /// Gemini CLI: one JSON document per chat
    Gemini,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::Codex, Source::Claude, Source::Gemini];

    /// Stable identifier used in config files and CLI flags
    pub fn id(&self) -> &'static str {
        match self {
            Source::Codex => "codex",
            Source::Claude => "claude",
            Source::Gemini => "gemini",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Source::Codex => "Codex CLI",
            Source::Claude => "Claude Code",
            Source::Gemini => "Gemini CLI",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Source {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "codex" => Ok(Source::Codex),
            "claude" | "claude_code" => Ok(Source::Claude),
            "gemini" => Ok(Source::Gemini),
            other => Err(Error::InvalidValue(format!("unknown source: {}", other))),
        }
    }
}
