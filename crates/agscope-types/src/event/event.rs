use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::kind::EventKind;

// NOTE: Event model
//
// Every source decoder produces the same flat event shape. Typed fields are
// best-effort; `raw_json` always holds the record verbatim so a record whose
// typed fields all failed to decode is still displayable and searchable.
//
// Streamed chunks are NOT merged here. They keep `is_delta` and their
// `message_id`, and the transcript builder groups them at render time.

/// One normalized message, tool call, tool result or system record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    /// Deterministic per-session event identifier
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    pub kind: EventKind,

    /// Normalized role ("user", "assistant", "tool", "system")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_input: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_output: Option<String>,

    /// Provider message id, shared by the chunks of one streamed message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    #[serde(default)]
    pub is_delta: bool,

    /// Source record: the verbatim line for line-delimited sources, the
    /// message object for document sources
    pub raw_json: String,
}

impl SessionEvent {
    /// Minimal event carrying only the raw record; typed fields are filled by the decoder
    pub fn new(id: impl Into<String>, kind: EventKind, raw_json: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            timestamp: None,
            kind,
            role: None,
            text: None,
            tool_name: None,
            tool_input: None,
            tool_output: None,
            message_id: None,
            parent_id: None,
            is_delta: false,
            raw_json: raw_json.into(),
        }
    }

    /// Stub event replacing a record that was too large to load
    pub fn oversized(id: impl Into<String>, size_bytes: u64, limit_bytes: u64) -> Self {
        let raw = format!(r#"{{"oversized_record_bytes":{}}}"#, size_bytes);
        let mut event = Self::new(id, EventKind::Error, raw);
        event.role = Some("system".to_string());
        event.text = Some(format!(
            "[record of {} bytes skipped: exceeds {} byte limit]",
            size_bytes, limit_bytes
        ));
        event
    }

    /// Searchable typed fields in display order
    pub fn searchable_fields(&self) -> impl Iterator<Item = &str> {
        [&self.text, &self.tool_input, &self.tool_output]
            .into_iter()
            .filter_map(|field| field.as_deref())
    }
}
