use agscope_types::{Session, Source};
use serde_json::Value;
use std::path::Path;

use super::{map_or_fallback, stat_session};
use crate::builder::EventBuilder;
use crate::normalization::{MetadataScan, find_timestamp};
use crate::reader::{RawRecord, RecordReader, count_lines, estimate_lines, read_tail_lines};
use crate::traits::{DecodeContext, RecordMapper};
use crate::{Error, Result};

fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(u8::is_ascii_whitespace)
}

/// Metadata from the leading records plus a bounded tail read
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

    let limits = ctx.limits;
    let mut scan = MetadataScan::new(mapper.project_key(path));
    let reader =
        RecordReader::open(path, limits.max_record_bytes).map_err(|e| Error::unreadable(path, e))?;

    let mut valid = 0usize;
    for record in reader.take(limits.header_records) {
        match record.map_err(|e| Error::unreadable(path, e))? {
            RawRecord::Oversized { .. } => valid += 1,
            RawRecord::Line(bytes) if is_blank(&bytes) => {}
            RawRecord::Line(bytes) => match serde_json::from_slice::<Value>(&bytes) {
                Ok(value) => {
                    valid += 1;
                    mapper.scan_record(&value, &mut scan);
                }
                Err(_) => scan.observe_corrupt(),
            },
        }
    }

    let tail = read_tail_lines(path, limits.tail_bytes).map_err(|e| Error::unreadable(path, e))?;
    let mut tail_valid = false;
    for line in tail.iter().rev() {
        if let Ok(value) = serde_json::from_slice::<Value>(line) {
            tail_valid = true;
            if let Some(ts) = find_timestamp(&value) {
                scan.observe_timestamp(ts);
                break;
            }
        }
    }

    if valid == 0 && !tail_valid {
        return Err(Error::not_indexable(path, "no valid JSON records"));
    }

    session.event_count = if session.file_size_bytes <= limits.full_scan_bytes {
        count_lines(path).map_err(|e| Error::unreadable(path, e))?
    } else {
        estimate_lines(session.file_size_bytes, &tail)
    };

    scan.apply(&mut session, &ctx.resolver);
    Ok(session)
}

/// Every record as an event; malformed lines are counted and skipped,
/// oversized lines become stub events
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

    let limit = ctx.limits.max_record_bytes;
    let mut scan = MetadataScan::new(mapper.project_key(path));
    let mut builder = EventBuilder::new(&session.id);
    let mut events = Vec::new();

    let reader = RecordReader::open(path, limit).map_err(|e| Error::unreadable(path, e))?;
    for (row, record) in reader.enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) if events.is_empty() => return Err(Error::unreadable(path, e)),
            Err(e) => {
                tracing::warn!(path = ?path, row, error = %e, "read failed mid-file, keeping decoded prefix");
                break;
            }
        };

        match record {
            RawRecord::Oversized { len } => {
                tracing::debug!(path = ?path, row, bytes = len, "oversized record replaced by stub");
                let stub = builder.oversized(row, len, limit);
                builder.push(&mut events, stub);
            }
            RawRecord::Line(bytes) if is_blank(&bytes) => {}
            RawRecord::Line(bytes) => {
                let raw = String::from_utf8_lossy(&bytes);
                match serde_json::from_str::<Value>(&raw) {
                    Ok(value) => {
                        if row < ctx.limits.header_records {
                            mapper.scan_record(&value, &mut scan);
                        } else if let Some(ts) = find_timestamp(&value) {
                            scan.observe_timestamp(ts);
                        }
                        map_or_fallback(mapper, row, &value, &raw, &mut builder, &mut events);
                    }
                    Err(e) => {
                        scan.observe_corrupt();
                        tracing::trace!(path = ?path, row, error = %e, "skipping malformed record");
                    }
                }
            }
        }
    }

    if events.is_empty() {
        return Err(Error::not_indexable(path, "no valid JSON records"));
    }

    scan.apply(&mut session, &ctx.resolver);
    session.replace_events(events);
    Ok(session)
}
