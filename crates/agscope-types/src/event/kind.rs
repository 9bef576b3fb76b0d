use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Normalized event category shared by every source
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    User,
    Assistant,
    ToolCall,
    ToolResult,
    Error,
    /// Bookkeeping records (session headers, token counts, snapshots)
    Meta,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::User,
        EventKind::Assistant,
        EventKind::ToolCall,
        EventKind::ToolResult,
        EventKind::Error,
        EventKind::Meta,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::User => "user",
            EventKind::Assistant => "assistant",
            EventKind::ToolCall => "tool_call",
            EventKind::ToolResult => "tool_result",
            EventKind::Error => "error",
            EventKind::Meta => "meta",
        }
    }

    pub fn is_meta(&self) -> bool {
        matches!(self, EventKind::Meta)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::InvalidValue(format!("unknown event kind: {}", s)))
    }
}
