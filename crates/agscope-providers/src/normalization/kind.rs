use agscope_types::EventKind;
use serde_json::Value;

/// Classify a record by its `type`, then its `role`; unknown records are
/// treated as assistant output so their text stays visible
pub fn derive_kind(record: &Value) -> EventKind {
    let type_kind = record
        .get("type")
        .and_then(Value::as_str)
        .and_then(kind_from_type);
    if let Some(kind) = type_kind {
        return kind;
    }

    let role = record
        .get("role")
        .or_else(|| record.get("message").and_then(|m| m.get("role")))
        .and_then(Value::as_str);
    role.and_then(kind_from_role).unwrap_or(EventKind::Assistant)
}

pub fn kind_from_type(kind: &str) -> Option<EventKind> {
    let kind = match kind.to_ascii_lowercase().as_str() {
        "user" | "human" | "user_message" => EventKind::User,
        "assistant" | "gemini" | "model" | "ai" | "agent_message" => EventKind::Assistant,
        "tool_use" | "tool_call" | "function_call" | "custom_tool_call" | "local_shell_call"
        | "web_search_call" => EventKind::ToolCall,
        "tool_result" | "tool_output" | "function_call_output" | "custom_tool_call_output" => {
            EventKind::ToolResult
        }
        "error" | "stream_error" => EventKind::Error,
        "info" | "system" | "summary" | "meta" | "session_meta" | "turn_context"
        | "token_count" | "reasoning" | "thinking" | "file-history-snapshot" => EventKind::Meta,
        _ => return None,
    };
    Some(kind)
}

pub fn kind_from_role(role: &str) -> Option<EventKind> {
    let kind = match role.to_ascii_lowercase().as_str() {
        "user" | "human" => EventKind::User,
        "assistant" | "model" | "gemini" | "ai" => EventKind::Assistant,
        "tool" | "function" => EventKind::ToolResult,
        "system" | "developer" => EventKind::Meta,
        _ => return None,
    };
    Some(kind)
}
