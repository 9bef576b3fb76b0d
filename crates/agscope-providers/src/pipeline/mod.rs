pub(crate) mod document;
pub(crate) mod jsonl;

use agscope_types::{EventKind, Session, SessionEvent, Source};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::path::Path;

use crate::builder::{EventBuilder, SemanticSuffix};
use crate::normalization::{derive_kind, extract_text, find_timestamp};
use crate::{Error, Result};

/// Session shell populated from file metadata
pub(crate) fn stat_session(source: Source, path: &Path) -> Result<Session> {
    let metadata = std::fs::metadata(path).map_err(|e| Error::unreadable(path, e))?;
    if !metadata.is_file() {
        return Err(Error::not_indexable(path, "not a regular file"));
    }
    let mut session = Session::for_file(source, path, metadata.len());
    session.modified_at = metadata.modified().ok().map(DateTime::<Utc>::from);
    Ok(session)
}

/// Map a record, falling back to a generic event when the source mapper
/// produced nothing for it
pub(crate) fn map_or_fallback(
    mapper: &dyn crate::traits::RecordMapper,
    row: usize,
    record: &Value,
    raw: &str,
    builder: &mut EventBuilder,
    events: &mut Vec<SessionEvent>,
) {
    let before = events.len();
    mapper.map_record(row, record, raw, builder, events);
    if events.len() == before {
        let event = generic_event(row, record, raw, builder);
        builder.push(events, event);
    }
}

/// Event built only from the shared decoding policy
pub(crate) fn generic_event(
    row: usize,
    record: &Value,
    raw: &str,
    builder: &mut EventBuilder,
) -> SessionEvent {
    let kind = derive_kind(record);
    let mut event = builder.event(row, SemanticSuffix::for_kind(kind), kind, raw);
    event.timestamp = find_timestamp(record);
    event.text = extract_text(record);
    event.role = Some(
        match kind {
            EventKind::User => "user",
            EventKind::Assistant => "assistant",
            EventKind::ToolCall | EventKind::ToolResult => "tool",
            EventKind::Error | EventKind::Meta => "system",
        }
        .to_string(),
    );
    event
}
