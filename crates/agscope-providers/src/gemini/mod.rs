//! Gemini CLI sessions: `<root>/<project-hash>/chats/session-*.json`, one
//! JSON document per session. Older releases wrote `<project-hash>/logs.json`.

mod mapper;

use agscope_types::{Session, Source, is_64_char_hex};
use std::path::Path;

use crate::Result;
use crate::pipeline::document;
use crate::traits::{DecodeContext, LogDecoder, ProbeResult};

use self::mapper::GeminiMapper;

pub struct GeminiDecoder;

impl LogDecoder for GeminiDecoder {
    fn source(&self) -> Source {
        Source::Gemini
    }

    fn probe(&self, path: &Path) -> ProbeResult {
        let filename = path.file_name().and_then(|f| f.to_str()).unwrap_or("");
        let parent = path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .unwrap_or("");

        if filename.starts_with("session-") && filename.ends_with(".json") && parent == "chats" {
            ProbeResult::match_high()
        } else if filename == "logs.json" && is_64_char_hex(parent) {
            ProbeResult::match_medium()
        } else {
            ProbeResult::NoMatch
        }
    }

    fn parse_lightweight(&self, path: &Path, ctx: &DecodeContext) -> Result<Session> {
        document::parse_lightweight(&GeminiMapper, Source::Gemini, path, ctx)
    }

    fn parse_full(&self, path: &Path, ctx: &DecodeContext) -> Result<Session> {
        document::parse_full(&GeminiMapper, Source::Gemini, path, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agscope_core::{ProjectResolver, normalize_path, project_hash_from_root};
    use agscope_types::EventKind;
    use serde_json::json;
    use std::sync::Arc;

    fn write_session(root: &Path, hash: &str, doc: &serde_json::Value) -> std::path::PathBuf {
        let chats = root.join(hash).join("chats");
        std::fs::create_dir_all(&chats).unwrap();
        let path = chats.join("session-2025-03-01T09-00-abcd.json");
        std::fs::write(&path, serde_json::to_vec_pretty(doc).unwrap()).unwrap();
        path
    }

    fn sample(hash: &str) -> serde_json::Value {
        json!({
            "sessionId": "abcd",
            "projectHash": hash,
            "startTime": "2025-03-01T09:00:00.000Z",
            "lastUpdated": "2025-03-01T09:05:00.000Z",
            "messages": [
                {"id": "1", "timestamp": "2025-03-01T09:00:01.000Z", "type": "user", "content": "Refactor the cache"},
                {"id": "2", "timestamp": "2025-03-01T09:00:05.000Z", "type": "gemini", "content": "Reading it now.",
                 "model": "gemini-2.5-pro",
                 "thoughts": [{"subject": "Plan", "description": "Read cache.rs first"}],
                 "toolCalls": [{"id": "read-1", "name": "read_file", "args": {"path": "src/cache.rs"},
                                "result": [{"functionResponse": {"id": "read-1", "name": "read_file", "response": {"output": "pub struct Cache;"}}}],
                                "status": "success"}]},
                {"id": "3", "timestamp": "2025-03-01T09:00:06.000Z", "type": "info", "content": "Request cancelled."},
                {"id": "4", "timestamp": "2025-03-01T09:00:07.000Z", "type": "error", "content": "Quota exceeded"},
                {"id": "5", "type": "user", "content": [{"text": "see"}, {"inlineData": {"mimeType": "image/png", "data": "iVBORw0KGgo="}}]}
            ]
        })
    }

    #[test]
    fn test_probe() {
        let hash = "a".repeat(64);
        let decoder = GeminiDecoder;
        let chat = format!("/h/.gemini/tmp/{}/chats/session-1.json", hash);
        let legacy = format!("/h/.gemini/tmp/{}/logs.json", hash);
        assert_eq!(decoder.probe(Path::new(&chat)), ProbeResult::match_high());
        assert_eq!(decoder.probe(Path::new(&legacy)), ProbeResult::match_medium());
        assert!(!decoder.probe(Path::new("/h/.gemini/settings.json")).is_match());
    }

    #[test]
    fn test_full_parse_expands_tool_calls() {
        let root = tempfile::tempdir().unwrap();
        let hash = "b".repeat(64);
        let path = write_session(root.path(), &hash, &sample(&hash));

        let session = GeminiDecoder
            .parse_full(&path, &DecodeContext::default())
            .unwrap();
        let kinds: Vec<EventKind> = session.events.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::User,
                EventKind::Assistant,
                EventKind::Meta,
                EventKind::ToolCall,
                EventKind::ToolResult,
                EventKind::Meta,
                EventKind::Error,
                EventKind::User,
            ]
        );
        assert_eq!(session.events[4].tool_output.as_deref(), Some("pub struct Cache;"));
        assert_eq!(
            session.events[7].text.as_deref(),
            Some("see\n[binary image/png omitted]")
        );
        assert_eq!(session.model.as_deref(), Some("gemini-2.5-pro"));
        assert_eq!(session.project_hash.as_deref(), Some(hash.as_str()));
        assert_eq!(
            session.end_time.unwrap().to_rfc3339(),
            "2025-03-01T09:05:00+00:00"
        );
    }

    #[test]
    fn test_lightweight_counts_messages() {
        let root = tempfile::tempdir().unwrap();
        let hash = "c".repeat(64);
        let path = write_session(root.path(), &hash, &sample(&hash));

        let session = GeminiDecoder
            .parse_lightweight(&path, &DecodeContext::default())
            .unwrap();
        assert!(session.is_lightweight());
        assert_eq!(session.event_count, 5);
        assert_eq!(session.title(), "Refactor the cache");
    }

    #[test]
    fn test_cwd_comes_from_resolver_by_hash() {
        let root = tempfile::tempdir().unwrap();
        let project = tempfile::tempdir().unwrap();
        let hash = project_hash_from_root(&project.path().to_string_lossy());
        let path = write_session(root.path(), hash.as_str(), &sample(hash.as_str()));

        let mut builder = ProjectResolver::builder();
        builder.register_directory(project.path());
        let ctx = DecodeContext::with_resolver(Arc::new(builder.build()));

        let session = GeminiDecoder.parse_lightweight(&path, &ctx).unwrap();
        let expected = normalize_path(project.path());
        assert_eq!(session.cwd.as_deref(), Some(&*expected.to_string_lossy()));

        let unresolved = GeminiDecoder
            .parse_lightweight(&path, &DecodeContext::default())
            .unwrap();
        assert_eq!(unresolved.cwd, None);
    }

    #[test]
    fn test_bare_array_and_history_shapes() {
        let root = tempfile::tempdir().unwrap();
        let hash = "d".repeat(64);
        let legacy_dir = root.path().join(&hash);
        std::fs::create_dir_all(&legacy_dir).unwrap();
        let legacy = legacy_dir.join("logs.json");
        std::fs::write(
            &legacy,
            r#"[{"sessionId":"s","messageId":0,"type":"user","message":"legacy prompt","timestamp":"2025-01-01T00:00:00Z"}]"#,
        )
        .unwrap();
        let session = GeminiDecoder
            .parse_full(&legacy, &DecodeContext::default())
            .unwrap();
        assert_eq!(session.events.len(), 1);
        assert_eq!(session.events[0].message_id.as_deref(), Some("0"));
        assert_eq!(session.title(), "legacy prompt");

        let history = write_session(
            root.path(),
            &hash,
            &json!({"history": [
                {"role": "user", "parts": [{"text": "hello"}]},
                {"role": "model", "parts": [{"functionCall": {"name": "ls", "args": {"dir": "."}}}]},
                {"role": "user", "parts": [{"functionResponse": {"name": "ls", "response": {"output": "a.txt"}}}]}
            ]}),
        );
        let session = GeminiDecoder
            .parse_full(&history, &DecodeContext::default())
            .unwrap();
        let kinds: Vec<EventKind> = session.events.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![EventKind::User, EventKind::ToolCall, EventKind::ToolResult]
        );
    }

    #[test]
    fn test_empty_and_invalid_documents_are_not_indexable() {
        let root = tempfile::tempdir().unwrap();
        let hash = "e".repeat(64);
        let empty = write_session(root.path(), &hash, &json!({"messages": []}));
        let err = GeminiDecoder
            .parse_full(&empty, &DecodeContext::default())
            .unwrap_err();
        assert!(err.is_corrupt());

        std::fs::write(&empty, b"{\"messages\": [").unwrap();
        let err = GeminiDecoder
            .parse_lightweight(&empty, &DecodeContext::default())
            .unwrap_err();
        assert!(err.is_corrupt());
    }
}
