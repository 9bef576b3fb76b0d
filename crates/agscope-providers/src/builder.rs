use agscope_types::{EventKind, SessionEvent, SessionId};
use std::collections::HashMap;
use uuid::Uuid;

/// Semantic suffix for deterministic event ids
/// Represents the "why" behind each event creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticSuffix {
    User,
    Message,
    Reasoning,
    ToolCall,
    ToolResult,
    Error,
    Meta,
    Oversized,
}

impl SemanticSuffix {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Message => "message",
            Self::Reasoning => "reasoning",
            Self::ToolCall => "call",
            Self::ToolResult => "result",
            Self::Error => "error",
            Self::Meta => "meta",
            Self::Oversized => "oversized",
        }
    }

    pub fn for_kind(kind: EventKind) -> Self {
        match kind {
            EventKind::User => Self::User,
            EventKind::Assistant => Self::Message,
            EventKind::ToolCall => Self::ToolCall,
            EventKind::ToolResult => Self::ToolResult,
            EventKind::Error => Self::Error,
            EventKind::Meta => Self::Meta,
        }
    }
}

/// EventBuilder turns decoded records into events
/// Maintains the parent chain and the tool call id -> tool name mapping
pub struct EventBuilder {
    /// Namespace derived from the session id
    namespace: Uuid,

    /// Id of the most recently pushed event
    tip: Option<String>,

    /// Events already built per (record index, suffix), for unique names
    ordinals: HashMap<(usize, SemanticSuffix), usize>,

    /// Provider tool call id -> tool name, so results can name their tool
    tool_names: HashMap<String, String>,
}

impl EventBuilder {
    pub fn new(session_id: &SessionId) -> Self {
        Self {
            namespace: Uuid::new_v5(&Uuid::NAMESPACE_OID, session_id.as_str().as_bytes()),
            tip: None,
            ordinals: HashMap::new(),
            tool_names: HashMap::new(),
        }
    }

    /// Create an event with a deterministic id.
    /// Uses UUID v5 with the session namespace and "row:suffix[:n]" as name,
    /// so reparsing the same file yields the same ids.
    pub fn event(
        &mut self,
        row: usize,
        suffix: SemanticSuffix,
        kind: EventKind,
        raw_json: &str,
    ) -> SessionEvent {
        let ordinal = self.ordinals.entry((row, suffix)).or_insert(0);
        let name = if *ordinal == 0 {
            format!("{}:{}", row, suffix.as_str())
        } else {
            format!("{}:{}:{}", row, suffix.as_str(), ordinal)
        };
        *ordinal += 1;

        let id = Uuid::new_v5(&self.namespace, name.as_bytes());
        SessionEvent::new(id.to_string(), kind, raw_json)
    }

    /// Append an event, linking it to the previous one
    pub fn push(&mut self, events: &mut Vec<SessionEvent>, mut event: SessionEvent) {
        if event.parent_id.is_none() {
            event.parent_id = self.tip.clone();
        }
        self.tip = Some(event.id.clone());
        events.push(event);
    }

    /// Stub event for a record over the size cap
    pub fn oversized(&mut self, row: usize, size_bytes: u64, limit_bytes: u64) -> SessionEvent {
        let placeholder = self.event(row, SemanticSuffix::Oversized, EventKind::Error, "");
        SessionEvent::oversized(placeholder.id, size_bytes, limit_bytes)
    }

    /// Register a tool call in the map (provider id -> tool name)
    pub fn register_tool_call(&mut self, call_id: &str, name: &str) {
        self.tool_names.insert(call_id.to_string(), name.to_string());
    }

    pub fn tool_name(&self, call_id: &str) -> Option<String> {
        self.tool_names.get(call_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_ids_are_deterministic_and_unique() {
        let session_id = SessionId::from_path(Path::new("/tmp/a.jsonl"));
        let mut first = EventBuilder::new(&session_id);
        let mut second = EventBuilder::new(&session_id);

        let a = first.event(0, SemanticSuffix::ToolCall, EventKind::ToolCall, "{}");
        let b = first.event(0, SemanticSuffix::ToolCall, EventKind::ToolCall, "{}");
        let c = second.event(0, SemanticSuffix::ToolCall, EventKind::ToolCall, "{}");

        assert_ne!(a.id, b.id);
        assert_eq!(a.id, c.id);
    }

    #[test]
    fn test_push_chains_parents() {
        let session_id = SessionId::new("s");
        let mut builder = EventBuilder::new(&session_id);
        let mut events = Vec::new();

        let first = builder.event(0, SemanticSuffix::User, EventKind::User, "{}");
        builder.push(&mut events, first);
        let second = builder.event(1, SemanticSuffix::Message, EventKind::Assistant, "{}");
        builder.push(&mut events, second);

        assert_eq!(events[0].parent_id, None);
        assert_eq!(events[1].parent_id.as_deref(), Some(events[0].id.as_str()));
    }

    #[test]
    fn test_tool_name_mapping() {
        let mut builder = EventBuilder::new(&SessionId::new("s"));
        builder.register_tool_call("call_1", "shell");
        assert_eq!(builder.tool_name("call_1").as_deref(), Some("shell"));
        assert_eq!(builder.tool_name("call_2"), None);
    }
}
