use agscope_types::{EventKind, SessionEvent};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

use super::schema::{ClaudeRecord, ContentBlock};
use crate::builder::{EventBuilder, SemanticSuffix};
use crate::normalization::{MetadataScan, extract_text, find_timestamp, value_to_display};
use crate::traits::RecordMapper;

pub(crate) struct ClaudeMapper;

impl RecordMapper for ClaudeMapper {
    /// `~/.claude/projects/<encoded-project>/<session>.jsonl`: the encoded
    /// directory name is the project key
    fn project_key(&self, path: &Path) -> Option<String> {
        path.ancestors()
            .skip(1)
            .find(|dir| {
                dir.parent()
                    .and_then(|p| p.file_name())
                    .is_some_and(|name| name == "projects")
            })
            .and_then(|dir| dir.file_name())
            .map(|name| name.to_string_lossy().to_string())
    }

    fn scan_record(&self, record: &Value, scan: &mut MetadataScan) {
        scan.observe_record(record);

        let is_user = record.get("type").and_then(Value::as_str) == Some("user");
        let is_meta = record
            .get("isMeta")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if is_user
            && !is_meta
            && let Some(text) = record.pointer("/message/content").and_then(extract_text)
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
        let Ok(parsed) = ClaudeRecord::deserialize(record) else {
            return;
        };
        let timestamp = find_timestamp(record);

        let kind = parsed
            .kind
            .clone()
            .or_else(|| parsed.message.as_ref().and_then(|m| m.role.clone()));

        match kind.as_deref() {
            Some("user") | Some("assistant") => {
                let is_user = kind.as_deref() == Some("user");
                let Some(message) = parsed.message else {
                    return;
                };
                let ctx = BlockContext {
                    row,
                    raw,
                    timestamp,
                    message_id: if is_user {
                        parsed.uuid.clone()
                    } else {
                        message.id.clone()
                    },
                };

                if is_user && parsed.is_meta {
                    let mut event = ctx.event(builder, SemanticSuffix::Meta, EventKind::Meta);
                    event.role = Some("user".to_string());
                    event.text = extract_text(&message.content);
                    builder.push(events, event);
                    return;
                }

                if let Some(text) = extract_text(&message.content) {
                    let kind = if is_user {
                        EventKind::User
                    } else {
                        EventKind::Assistant
                    };
                    let mut event = ctx.event(builder, SemanticSuffix::for_kind(kind), kind);
                    event.role = Some(if is_user { "user" } else { "assistant" }.to_string());
                    event.text = Some(text);
                    builder.push(events, event);
                }

                if let Value::Array(blocks) = &message.content {
                    for block in blocks {
                        map_block(&ctx, block, builder, events);
                    }
                }
            }
            Some("summary") => {
                let mut event = builder.event(row, SemanticSuffix::Meta, EventKind::Meta, raw);
                event.timestamp = timestamp;
                event.role = Some("system".to_string());
                event.text = parsed.summary;
                builder.push(events, event);
            }
            Some("system") => {
                let kind = if parsed.level.as_deref() == Some("error") {
                    EventKind::Error
                } else {
                    EventKind::Meta
                };
                let mut event = builder.event(row, SemanticSuffix::for_kind(kind), kind, raw);
                event.timestamp = timestamp;
                event.role = Some("system".to_string());
                event.text = parsed.content.as_ref().and_then(extract_text);
                builder.push(events, event);
            }
            Some(_) => {
                // file-history-snapshot, queue operations and similar bookkeeping
                let mut event = builder.event(row, SemanticSuffix::Meta, EventKind::Meta, raw);
                event.timestamp = timestamp;
                event.role = Some("system".to_string());
                builder.push(events, event);
            }
            None => {}
        }
    }
}

struct BlockContext<'a> {
    row: usize,
    raw: &'a str,
    timestamp: Option<chrono::DateTime<chrono::Utc>>,
    message_id: Option<String>,
}

impl BlockContext<'_> {
    fn event(
        &self,
        builder: &mut EventBuilder,
        suffix: SemanticSuffix,
        kind: EventKind,
    ) -> SessionEvent {
        let mut event = builder.event(self.row, suffix, kind, self.raw);
        event.timestamp = self.timestamp;
        event.message_id = self.message_id.clone();
        event
    }
}

fn map_block(
    ctx: &BlockContext<'_>,
    block: &Value,
    builder: &mut EventBuilder,
    events: &mut Vec<SessionEvent>,
) {
    let Ok(block) = ContentBlock::deserialize(block) else {
        return;
    };

    match block {
        ContentBlock::ToolUse { id, name, input } => {
            let mut event = ctx.event(builder, SemanticSuffix::ToolCall, EventKind::ToolCall);
            event.role = Some("assistant".to_string());
            event.tool_input = tool_input(&input);
            if let Some(id) = &id {
                builder.register_tool_call(id, &name);
            }
            event.tool_name = Some(name).filter(|n| !n.is_empty());
            event.message_id = id.or(event.message_id);
            builder.push(events, event);
        }
        ContentBlock::ToolResult {
            tool_use_id,
            content,
            is_error,
        } => {
            let kind = if is_error {
                EventKind::Error
            } else {
                EventKind::ToolResult
            };
            let mut event = ctx.event(builder, SemanticSuffix::ToolResult, kind);
            event.role = Some("tool".to_string());
            event.tool_name = tool_use_id.as_deref().and_then(|id| builder.tool_name(id));
            event.tool_output = extract_text(&content).or_else(|| value_to_display(&content));
            event.message_id = tool_use_id.or(event.message_id);
            builder.push(events, event);
        }
        ContentBlock::Thinking { thinking } if !thinking.trim().is_empty() => {
            let mut event = ctx.event(builder, SemanticSuffix::Reasoning, EventKind::Meta);
            event.role = Some("assistant".to_string());
            event.text = Some(thinking);
            builder.push(events, event);
        }
        ContentBlock::Thinking { .. } | ContentBlock::Other => {}
    }
}

/// Bash-style tools show their command; other inputs render as JSON
fn tool_input(input: &Value) -> Option<String> {
    input
        .get("command")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| value_to_display(input))
}
