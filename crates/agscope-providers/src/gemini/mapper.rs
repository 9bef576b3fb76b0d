use agscope_types::{EventKind, SessionEvent, is_64_char_hex};
use serde_json::Value;
use std::path::Path;

use crate::builder::{EventBuilder, SemanticSuffix};
use crate::normalization::{
    MetadataScan, derive_kind, extract_text, find_timestamp, parse_timestamp_value,
    value_to_display,
};
use crate::traits::RecordMapper;

pub(crate) struct GeminiMapper;

impl RecordMapper for GeminiMapper {
    /// `~/.gemini/tmp/<sha256(project_root)>/chats/session-*.json`
    fn project_key(&self, path: &Path) -> Option<String> {
        path.ancestors()
            .filter_map(|dir| dir.file_name().and_then(|n| n.to_str()))
            .find(|name| is_64_char_hex(name))
            .map(str::to_string)
    }

    fn scan_document(&self, document: &Value, scan: &mut MetadataScan) {
        for key in ["startTime", "lastUpdated"] {
            if let Some(ts) = document.get(key).and_then(parse_timestamp_value) {
                scan.observe_timestamp(ts);
            }
        }
        if scan.project_key.is_none() {
            scan.project_key = document
                .get("projectHash")
                .and_then(Value::as_str)
                .filter(|h| is_64_char_hex(h))
                .map(str::to_string);
        }
    }

    fn scan_record(&self, record: &Value, scan: &mut MetadataScan) {
        scan.observe_record(record);
        if derive_kind(record) == EventKind::User
            && let Some(text) = extract_text(record)
        {
            scan.observe_user_text(&text);
        }
    }

    fn map_record(
        &self,
        row: usize,
        record: &Value,
        raw: &str,
        builder: &mut EventBuilder,
        events: &mut Vec<SessionEvent>,
    ) {
        let kind = derive_kind(record);
        let timestamp = find_timestamp(record);
        let message_id = record
            .get("id")
            .or_else(|| record.get("messageId"))
            .and_then(value_to_display);

        let tool_calls = record.get("toolCalls").and_then(Value::as_array);
        let part_calls: Vec<&Value> = record
            .get("parts")
            .and_then(Value::as_array)
            .map(|parts| {
                parts
                    .iter()
                    .filter(|p| p.get("functionCall").is_some() || p.get("functionResponse").is_some())
                    .collect()
            })
            .unwrap_or_default();

        let text = extract_text(record);
        if text.is_some() || (tool_calls.is_none() && part_calls.is_empty()) {
            let mut event = builder.event(row, SemanticSuffix::for_kind(kind), kind, raw);
            event.timestamp = timestamp;
            event.role = Some(role_for(kind).to_string());
            event.text = text;
            event.message_id = message_id.clone();
            builder.push(events, event);
        }

        if let Some(thoughts) = record.get("thoughts").and_then(Value::as_array) {
            let lines: Vec<String> = thoughts
                .iter()
                .filter_map(|t| {
                    let subject = t.get("subject").and_then(Value::as_str).unwrap_or("");
                    let description = t.get("description").and_then(Value::as_str).unwrap_or("");
                    match (subject.is_empty(), description.is_empty()) {
                        (true, true) => None,
                        (false, true) => Some(subject.to_string()),
                        (true, false) => Some(description.to_string()),
                        (false, false) => Some(format!("{}: {}", subject, description)),
                    }
                })
                .collect();
            if !lines.is_empty() {
                let mut event = builder.event(row, SemanticSuffix::Reasoning, EventKind::Meta, raw);
                event.timestamp = timestamp;
                event.role = Some("assistant".to_string());
                event.text = Some(lines.join("\n"));
                event.message_id = message_id.clone();
                builder.push(events, event);
            }
        }

        for call in tool_calls.into_iter().flatten() {
            map_tool_call(row, raw, call, timestamp, builder, events);
        }

        for part in part_calls {
            if let Some(call) = part.get("functionCall") {
                let name = call.get("name").and_then(Value::as_str).unwrap_or("");
                let mut event = builder.event(row, SemanticSuffix::ToolCall, EventKind::ToolCall, raw);
                event.timestamp = timestamp;
                event.role = Some("assistant".to_string());
                event.tool_name = Some(name.to_string()).filter(|n| !n.is_empty());
                event.tool_input = call.get("args").and_then(value_to_display);
                builder.push(events, event);
            } else if let Some(response) = part.get("functionResponse") {
                let mut event =
                    builder.event(row, SemanticSuffix::ToolResult, EventKind::ToolResult, raw);
                event.timestamp = timestamp;
                event.role = Some("tool".to_string());
                event.tool_name = response
                    .get("name")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                event.tool_output = response_output(response);
                builder.push(events, event);
            }
        }
    }
}

fn role_for(kind: EventKind) -> &'static str {
    match kind {
        EventKind::User => "user",
        EventKind::Assistant => "assistant",
        EventKind::ToolCall | EventKind::ToolResult => "tool",
        EventKind::Error | EventKind::Meta => "system",
    }
}

/// A `toolCalls` entry carries both the call and its result
fn map_tool_call(
    row: usize,
    raw: &str,
    call: &Value,
    message_ts: Option<chrono::DateTime<chrono::Utc>>,
    builder: &mut EventBuilder,
    events: &mut Vec<SessionEvent>,
) {
    let name = call.get("name").and_then(Value::as_str).unwrap_or("");
    let call_id = call.get("id").and_then(Value::as_str).map(str::to_string);
    let timestamp = find_timestamp(call).or(message_ts);

    let mut event = builder.event(row, SemanticSuffix::ToolCall, EventKind::ToolCall, raw);
    event.timestamp = timestamp;
    event.role = Some("assistant".to_string());
    event.tool_name = Some(name.to_string()).filter(|n| !n.is_empty());
    event.tool_input = call.get("args").and_then(value_to_display);
    event.message_id = call_id.clone();
    builder.push(events, event);

    let output = call
        .get("result")
        .and_then(Value::as_array)
        .and_then(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("functionResponse"))
                .find_map(response_output)
        })
        .or_else(|| call.get("resultDisplay").and_then(value_to_display))
        .or_else(|| call.get("result").and_then(value_to_display));

    let failed = call.get("status").and_then(Value::as_str) == Some("error");
    if output.is_none() && !failed {
        return;
    }

    let kind = if failed {
        EventKind::Error
    } else {
        EventKind::ToolResult
    };
    let mut event = builder.event(row, SemanticSuffix::ToolResult, kind, raw);
    event.timestamp = timestamp;
    event.role = Some("tool".to_string());
    event.tool_name = Some(name.to_string()).filter(|n| !n.is_empty());
    event.tool_output = output;
    event.message_id = call_id;
    builder.push(events, event);
}

/// `functionResponse.response` is `{output}` or `{error}`, sometimes a bare value
fn response_output(response: &Value) -> Option<String> {
    let body = response.get("response")?;
    body.get("output")
        .or_else(|| body.get("error"))
        .and_then(value_to_display)
        .or_else(|| value_to_display(body))
}
