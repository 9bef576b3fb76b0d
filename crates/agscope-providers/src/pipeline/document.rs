use agscope_types::{Session, Source};
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::{map_or_fallback, stat_session};
use crate::builder::EventBuilder;
use crate::normalization::{MetadataScan, find_timestamp};
use crate::reader::{RawRecord, RecordReader};
use crate::traits::{DecodeContext, RecordMapper};
use crate::{Error, Result};

/// Message list of a document: a bare array, or an object holding
/// `messages`, `history` or `items`
pub(crate) fn document_records(document: &Value) -> Option<&Vec<Value>> {
    if let Some(array) = document.as_array() {
        return Some(array);
    }
    ["messages", "history", "items"]
        .iter()
        .find_map(|key| document.get(*key).and_then(Value::as_array))
}

/// Whether the first non-blank line already holds a whole message-list
/// document, as compact exports do
pub(crate) fn is_compact_document(path: &Path, max_bytes: u64) -> bool {
    let Ok(reader) = RecordReader::open(path, max_bytes) else {
        return false;
    };
    for record in reader {
        match record {
            Ok(RawRecord::Line(bytes)) if bytes.iter().all(u8::is_ascii_whitespace) => {}
            Ok(RawRecord::Line(bytes)) => {
                return serde_json::from_slice::<Value>(&bytes)
                    .is_ok_and(|value| document_records(&value).is_some());
            }
            _ => return false,
        }
    }
    false
}

fn load(path: &Path) -> Result<Value> {
    let file = File::open(path).map_err(|e| Error::unreadable(path, e))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| Error::not_indexable(path, format!("invalid JSON document: {}", e)))
}

fn records_of<'a>(path: &Path, document: &'a Value) -> Result<&'a Vec<Value>> {
    match document_records(document) {
        Some(records) if !records.is_empty() => Ok(records),
        Some(_) => Err(Error::not_indexable(path, "document has no messages")),
        None => Err(Error::not_indexable(path, "document has no message list")),
    }
}

/// Metadata from a parsed document; documents above the full-scan size are
/// described from file metadata only
pub(crate) fn parse_lightweight(
    mapper: &dyn RecordMapper,
    source: Source,
    path: &Path,
    ctx: &DecodeContext,
) -> Result<Session> {
    let mut session = stat_session(source, path)?;
    if session.file_size_bytes == 0 {
        return Err(Error::not_indexable(path, "empty file"));
    }

    let mut scan = MetadataScan::new(mapper.project_key(path));

    if session.file_size_bytes > ctx.limits.full_scan_bytes {
        tracing::debug!(path = ?path, bytes = session.file_size_bytes, "large document, stat-only metadata");
        scan.apply(&mut session, &ctx.resolver);
        return Ok(session);
    }

    let document = load(path)?;
    let records = records_of(path, &document)?;

    mapper.scan_document(&document, &mut scan);
    for (index, record) in records.iter().enumerate() {
        if index < ctx.limits.header_records {
            mapper.scan_record(record, &mut scan);
        } else if let Some(ts) = find_timestamp(record) {
            scan.observe_timestamp(ts);
        }
    }

    session.event_count = records.len();
    scan.apply(&mut session, &ctx.resolver);
    Ok(session)
}

pub(crate) fn parse_full(
    mapper: &dyn RecordMapper,
    source: Source,
    path: &Path,
    ctx: &DecodeContext,
) -> Result<Session> {
    let mut session = stat_session(source, path)?;
    if session.file_size_bytes == 0 {
        return Err(Error::not_indexable(path, "empty file"));
    }

    let document = load(path)?;
    let records = records_of(path, &document)?;

    let limit = ctx.limits.max_record_bytes;
    let mut scan = MetadataScan::new(mapper.project_key(path));
    let mut builder = EventBuilder::new(&session.id);
    let mut events = Vec::new();

    mapper.scan_document(&document, &mut scan);
    for (row, record) in records.iter().enumerate() {
        if row < ctx.limits.header_records {
            mapper.scan_record(record, &mut scan);
        } else if let Some(ts) = find_timestamp(record) {
            scan.observe_timestamp(ts);
        }

        let raw = record.to_string();
        // The document is already in memory; the cap only keeps huge messages out of the events
        if raw.len() as u64 > limit {
            tracing::debug!(path = ?path, row, bytes = raw.len(), "oversized message replaced by stub");
            let stub = builder.oversized(row, raw.len() as u64, limit);
            builder.push(&mut events, stub);
            continue;
        }
        map_or_fallback(mapper, row, record, &raw, &mut builder, &mut events);
    }

    scan.apply(&mut session, &ctx.resolver);
    session.replace_events(events);
    Ok(session)
}
