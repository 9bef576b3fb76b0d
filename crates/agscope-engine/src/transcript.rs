//! Transcript rendering.
//!
//! `render` is a pure function of the ordered events and the render options.
//! Stream chunks are merged by an explicit [`coalesce`] pass that runs once
//! per render; nothing is accumulated in the parser.

use agscope_types::{EventKind, Session, SessionEvent};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// `Label: text` lines; the text search runs against this form
    #[default]
    Transcript,
    /// Role headers with indented bodies, for reading in a terminal
    Terminal,
    /// Each event's raw record, one per line, meta included
    Json,
}

impl FromStr for RenderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transcript" => Ok(RenderMode::Transcript),
            "terminal" => Ok(RenderMode::Terminal),
            "json" => Ok(RenderMode::Json),
            _ => Err(format!("Unknown render mode: {}", s)),
        }
    }
}

/// Render configuration; part of the transcript cache key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RenderOptions {
    pub mode: RenderMode,
    pub show_timestamps: bool,
    pub show_meta: bool,
}

impl RenderOptions {
    pub fn new(mode: RenderMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// The form text search matches against
    pub fn search() -> Self {
        Self::default()
    }

    pub fn with_timestamps(mut self, show: bool) -> Self {
        self.show_timestamps = show;
        self
    }

    pub fn with_meta(mut self, show: bool) -> Self {
        self.show_meta = show;
        self
    }
}

/// One logical transcript entry after coalescing
#[derive(Debug, Clone, PartialEq)]
pub struct Block<'a> {
    pub kind: EventKind,
    /// Timestamp of the first chunk
    pub timestamp: Option<DateTime<Utc>>,
    pub text: String,
    pub tool_name: Option<&'a str>,
    pub tool_input: Option<&'a str>,
    pub tool_output: Option<&'a str>,
    /// Number of events merged into this block
    pub chunks: usize,
}

impl<'a> Block<'a> {
    fn from_event(event: &'a SessionEvent) -> Self {
        Self {
            kind: event.kind,
            timestamp: event.timestamp,
            text: event.text.clone().unwrap_or_default(),
            tool_name: event.tool_name.as_deref(),
            tool_input: event.tool_input.as_deref(),
            tool_output: event.tool_output.as_deref(),
            chunks: 1,
        }
    }
}

/// Whether `next` continues the stream chunk `prev`: both deltas of the same
/// kind sharing a message id, or (without ids) the same tool name
fn continues(prev: &SessionEvent, next: &SessionEvent) -> bool {
    if !prev.is_delta || !next.is_delta || prev.kind != next.kind {
        return false;
    }
    match (&prev.message_id, &next.message_id) {
        (Some(a), Some(b)) => a == b,
        (None, None) => prev.tool_name.is_some() && prev.tool_name == next.tool_name,
        _ => false,
    }
}

/// Group consecutive stream chunks into blocks, keeping the first timestamp
pub fn coalesce(events: &[SessionEvent]) -> Vec<Block<'_>> {
    let mut blocks: Vec<Block<'_>> = Vec::with_capacity(events.len());
    let mut prev: Option<&SessionEvent> = None;

    for event in events {
        match (prev, blocks.last_mut()) {
            (Some(p), Some(block)) if continues(p, event) => {
                if let Some(text) = &event.text {
                    block.text.push_str(text);
                }
                if block.timestamp.is_none() {
                    block.timestamp = event.timestamp;
                }
                block.chunks += 1;
            }
            _ => blocks.push(Block::from_event(event)),
        }
        prev = Some(event);
    }

    blocks
}

fn label(kind: EventKind) -> &'static str {
    match kind {
        EventKind::User => "User",
        EventKind::Assistant => "Assistant",
        EventKind::ToolCall => "Tool call",
        EventKind::ToolResult => "Tool result",
        EventKind::Error => "Error",
        EventKind::Meta => "Meta",
    }
}

/// Body lines of a block; empty when the block has nothing to show
fn body(block: &Block<'_>) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if !block.text.is_empty() {
        parts.push(&block.text);
    }
    match block.kind {
        EventKind::ToolCall => parts.extend(block.tool_input),
        EventKind::ToolResult | EventKind::Error => parts.extend(block.tool_output),
        _ => {}
    }
    parts.join("\n")
}

fn heading(block: &Block<'_>, options: &RenderOptions) -> String {
    let mut heading = String::new();
    if options.show_timestamps
        && let Some(ts) = block.timestamp
    {
        let _ = write!(heading, "[{}] ", ts.format("%Y-%m-%d %H:%M:%S"));
    }
    heading.push_str(label(block.kind));
    if let Some(name) = block.tool_name
        && matches!(
            block.kind,
            EventKind::ToolCall | EventKind::ToolResult | EventKind::Error
        )
    {
        let _ = write!(heading, " ({})", name);
    }
    heading
}

/// Render a session's events. Output is byte-identical for identical inputs.
/// Tool output is never truncated.
pub fn render(session: &Session, options: &RenderOptions) -> String {
    render_events(&session.events, options)
}

pub fn render_events(events: &[SessionEvent], options: &RenderOptions) -> String {
    let mut out = String::new();

    if options.mode == RenderMode::Json {
        for event in events {
            out.push_str(&event.raw_json);
            out.push('\n');
        }
        return out;
    }

    for block in coalesce(events) {
        if block.kind.is_meta() && !options.show_meta {
            continue;
        }
        let body = body(&block);
        let is_tool = matches!(block.kind, EventKind::ToolCall | EventKind::ToolResult);
        if body.is_empty() && !is_tool {
            continue;
        }

        let heading = heading(&block, options);
        match options.mode {
            RenderMode::Transcript => {
                if body.is_empty() {
                    let _ = writeln!(out, "{}", heading);
                } else {
                    let _ = writeln!(out, "{}: {}", heading, body);
                }
            }
            RenderMode::Terminal => {
                let _ = writeln!(out, "── {}", heading);
                for line in body.lines() {
                    let _ = writeln!(out, "   {}", line);
                }
                out.push('\n');
            }
            RenderMode::Json => {}
        }
    }

    out
}
