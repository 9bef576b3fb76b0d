//! Claude Code transcripts: `<root>/<encoded-project>/<session-uuid>.jsonl`.
//!
//! Transcripts are line-delimited; a file that holds a single JSON document
//! (exported transcripts, pretty-printed or on one line) is decoded as a
//! message list instead.

mod mapper;
mod schema;

use agscope_types::{Session, Source};
use std::path::Path;

use crate::Result;
use crate::pipeline::{document, jsonl};
use crate::traits::{DecodeContext, LogDecoder, ProbeResult};

use self::mapper::ClaudeMapper;

pub struct ClaudeDecoder;

fn under_claude_projects(path: &Path) -> bool {
    path.ancestors().any(|dir| {
        dir.file_name().is_some_and(|n| n == "projects")
            && dir
                .parent()
                .and_then(|p| p.file_name())
                .is_some_and(|n| n == ".claude")
    })
}

impl LogDecoder for ClaudeDecoder {
    fn source(&self) -> Source {
        Source::Claude
    }

    fn probe(&self, path: &Path) -> ProbeResult {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let filename = path.file_name().and_then(|f| f.to_str()).unwrap_or("");
        let line_delimited = matches!(ext, "jsonl" | "ndjson");

        if !(line_delimited || ext == "json") || filename.starts_with("rollout-") {
            return ProbeResult::NoMatch;
        }
        if under_claude_projects(path) {
            ProbeResult::match_high()
        } else if line_delimited {
            ProbeResult::match_medium()
        } else {
            ProbeResult::NoMatch
        }
    }

    fn parse_lightweight(&self, path: &Path, ctx: &DecodeContext) -> Result<Session> {
        if document::is_compact_document(path, ctx.limits.max_record_bytes) {
            return document::parse_lightweight(&ClaudeMapper, Source::Claude, path, ctx);
        }
        match jsonl::parse_lightweight(&ClaudeMapper, Source::Claude, path, ctx) {
            Err(e) if e.is_corrupt() => {
                document::parse_lightweight(&ClaudeMapper, Source::Claude, path, ctx).map_err(|_| e)
            }
            other => other,
        }
    }

    fn parse_full(&self, path: &Path, ctx: &DecodeContext) -> Result<Session> {
        if document::is_compact_document(path, ctx.limits.max_record_bytes) {
            return document::parse_full(&ClaudeMapper, Source::Claude, path, ctx);
        }
        match jsonl::parse_full(&ClaudeMapper, Source::Claude, path, ctx) {
            Err(e) if e.is_corrupt() => {
                document::parse_full(&ClaudeMapper, Source::Claude, path, ctx).map_err(|_| e)
            }
            other => other,
        }
    }
}
