use agscope_types::{EventKind, SessionEvent};
use serde::Deserialize;
use serde_json::Value;

use super::schema::{CodexRecord, EventMsg, ResponseItem};
use crate::builder::{EventBuilder, SemanticSuffix};
use crate::normalization::{
    MetadataScan, extract_text, find_timestamp, kind_from_role, value_to_display,
};
use crate::traits::RecordMapper;

pub(crate) struct CodexMapper;

impl RecordMapper for CodexMapper {
    fn scan_record(&self, record: &Value, scan: &mut MetadataScan) {
        scan.observe_record(record);

        let payload = record.get("payload").unwrap_or(record);
        let user_text = match payload.get("type").and_then(Value::as_str) {
            Some("message") if payload.get("role").and_then(Value::as_str) == Some("user") => {
                payload.get("content").and_then(extract_text)
            }
            Some("user_message") => payload
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        };
        if let Some(text) = user_text {
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
        let Ok(parsed) = CodexRecord::deserialize(record) else {
            // Rollouts written before the envelope format carry the item
            // inline and open with an untyped header record
            match ResponseItem::deserialize(record) {
                Ok(item) => map_item(row, record, raw, item, builder, events),
                Err(_) => map_meta(row, record, raw, record, builder, events),
            }
            return;
        };

        match parsed {
            CodexRecord::SessionMeta { payload } | CodexRecord::TurnContext { payload } => {
                map_meta(row, record, raw, &payload, builder, events);
            }
            CodexRecord::ResponseItem { payload } => {
                map_item(row, record, raw, payload, builder, events);
            }
            CodexRecord::EventMsg { payload } => {
                map_event_msg(row, record, raw, payload, builder, events);
            }
            CodexRecord::Other => {
                if let Ok(item) = ResponseItem::deserialize(record) {
                    map_item(row, record, raw, item, builder, events);
                }
            }
        }
    }
}

fn map_meta(
    row: usize,
    record: &Value,
    raw: &str,
    payload: &Value,
    builder: &mut EventBuilder,
    events: &mut Vec<SessionEvent>,
) {
    let mut event = builder.event(row, SemanticSuffix::Meta, EventKind::Meta, raw);
    event.timestamp = find_timestamp(record);
    event.role = Some("system".to_string());
    event.text = payload
        .get("instructions")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    builder.push(events, event);
}

fn map_item(
    row: usize,
    record: &Value,
    raw: &str,
    item: ResponseItem,
    builder: &mut EventBuilder,
    events: &mut Vec<SessionEvent>,
) {
    let mut event = match item {
        ResponseItem::Message { id, role, content } => {
            let kind = kind_from_role(&role).unwrap_or(EventKind::Assistant);
            let mut event = builder.event(row, SemanticSuffix::for_kind(kind), kind, raw);
            event.role = Some(role).filter(|r| !r.is_empty());
            event.text = extract_text(&content);
            event.message_id = id;
            event
        }
        ResponseItem::Reasoning { summary } => {
            let mut event = builder.event(row, SemanticSuffix::Reasoning, EventKind::Meta, raw);
            event.role = Some("assistant".to_string());
            event.text = extract_text(&summary);
            event
        }
        ResponseItem::FunctionCall {
            name,
            arguments,
            call_id,
        } => tool_call(row, raw, &name, shell_command(&arguments), call_id, builder),
        ResponseItem::CustomToolCall {
            name,
            input,
            call_id,
        } => tool_call(row, raw, &name, value_to_display(&input), call_id, builder),
        ResponseItem::LocalShellCall { call_id, action } => tool_call(
            row,
            raw,
            "local_shell",
            shell_command(&action),
            call_id,
            builder,
        ),
        ResponseItem::WebSearchCall { action } => {
            let query = action
                .get("query")
                .and_then(Value::as_str)
                .map(str::to_string);
            tool_call(row, raw, "web_search", query, None, builder)
        }
        ResponseItem::FunctionCallOutput { call_id, output }
        | ResponseItem::CustomToolCallOutput { call_id, output } => {
            let mut event = builder.event(row, SemanticSuffix::ToolResult, EventKind::ToolResult, raw);
            event.role = Some("tool".to_string());
            event.tool_name = call_id.as_deref().and_then(|id| builder.tool_name(id));
            event.tool_output = tool_output(&output);
            event.message_id = call_id;
            event
        }
        ResponseItem::Other => return,
    };

    event.timestamp = find_timestamp(record);
    builder.push(events, event);
}

fn map_event_msg(
    row: usize,
    record: &Value,
    raw: &str,
    msg: EventMsg,
    builder: &mut EventBuilder,
    events: &mut Vec<SessionEvent>,
) {
    // user_message/agent_message echo response items already in the log;
    // they are kept as meta so transcripts do not show them twice.
    let (kind, suffix, text, delta_of) = match msg {
        EventMsg::UserMessage { message } | EventMsg::AgentMessage { message } => {
            (EventKind::Meta, SemanticSuffix::Meta, message, None)
        }
        EventMsg::AgentReasoning { text } => {
            (EventKind::Meta, SemanticSuffix::Reasoning, text, None)
        }
        EventMsg::AgentMessageDelta { delta, item_id } => {
            (EventKind::Assistant, SemanticSuffix::Message, delta, Some(item_id))
        }
        EventMsg::AgentReasoningDelta { delta, item_id } => {
            (EventKind::Meta, SemanticSuffix::Reasoning, delta, Some(item_id))
        }
        EventMsg::Error { message } | EventMsg::StreamError { message } => {
            (EventKind::Error, SemanticSuffix::Error, message, None)
        }
        EventMsg::Other => (EventKind::Meta, SemanticSuffix::Meta, String::new(), None),
    };

    let mut event = builder.event(row, suffix, kind, raw);
    event.timestamp = find_timestamp(record);
    event.role = Some(
        match kind {
            EventKind::Assistant => "assistant",
            _ => "system",
        }
        .to_string(),
    );
    event.text = Some(text).filter(|t| !t.is_empty());
    if let Some(item_id) = delta_of {
        event.is_delta = true;
        event.message_id = item_id;
    }
    builder.push(events, event);
}

fn tool_call(
    row: usize,
    raw: &str,
    name: &str,
    input: Option<String>,
    call_id: Option<String>,
    builder: &mut EventBuilder,
) -> SessionEvent {
    let mut event = builder.event(row, SemanticSuffix::ToolCall, EventKind::ToolCall, raw);
    event.role = Some("assistant".to_string());
    event.tool_name = Some(name.to_string()).filter(|n| !n.is_empty());
    event.tool_input = input;
    if let Some(id) = &call_id {
        builder.register_tool_call(id, name);
    }
    event.message_id = call_id;
    event
}

/// Shell arguments arrive as a JSON string such as
/// `{"command":["bash","-lc","ls"],"workdir":"/x"}`; show the command line.
fn shell_command(arguments: &Value) -> Option<String> {
    let parsed = match arguments {
        Value::String(s) => serde_json::from_str::<Value>(s).unwrap_or_else(|_| arguments.clone()),
        other => other.clone(),
    };

    match parsed.get("command") {
        Some(Value::Array(parts)) => {
            let words: Vec<&str> = parts.iter().filter_map(Value::as_str).collect();
            Some(words.join(" "))
        }
        Some(Value::String(cmd)) => Some(cmd.clone()),
        _ => value_to_display(arguments),
    }
}

/// Function outputs are often a JSON string wrapping `{"output": ..., "metadata": ...}`
fn tool_output(output: &Value) -> Option<String> {
    if let Value::String(s) = output
        && let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(s)
        && let Some(inner) = obj.get("output").and_then(Value::as_str)
    {
        return Some(inner.to_string());
    }
    match output {
        Value::Object(obj) => obj
            .get("output")
            .or_else(|| obj.get("content"))
            .and_then(value_to_display)
            .or_else(|| value_to_display(output)),
        other => value_to_display(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_shell_command_from_json_string() {
        let args = json!(r#"{"command":["bash","-lc","cargo test"],"workdir":"/x"}"#);
        assert_eq!(shell_command(&args).as_deref(), Some("bash -lc cargo test"));
        assert_eq!(
            shell_command(&json!({"path": "a.rs"})).as_deref(),
            Some(r#"{"path":"a.rs"}"#)
        );
    }

    #[test]
    fn test_tool_output_unwraps_envelope() {
        let output = json!(r#"{"output":"ok\n","metadata":{"exit_code":0}}"#);
        assert_eq!(tool_output(&output).as_deref(), Some("ok\n"));
        assert_eq!(tool_output(&json!("plain")).as_deref(), Some("plain"));
    }
}
