//! Codex CLI rollouts: `<root>/YYYY/MM/DD/rollout-<timestamp>-<uuid>.jsonl`,
//! one JSON record per line.

mod mapper;
mod schema;

use agscope_types::{Session, Source};
use std::path::Path;

use crate::Result;
use crate::pipeline::jsonl;
use crate::traits::{DecodeContext, LogDecoder, ProbeResult};

use self::mapper::CodexMapper;

pub struct CodexDecoder;

impl LogDecoder for CodexDecoder {
    fn source(&self) -> Source {
        Source::Codex
    }

    fn probe(&self, path: &Path) -> ProbeResult {
        let is_jsonl = path.extension().is_some_and(|e| e == "jsonl");
        let filename = path.file_name().and_then(|f| f.to_str()).unwrap_or("");

        if is_jsonl && filename.starts_with("rollout-") {
            ProbeResult::match_high()
        } else {
            ProbeResult::NoMatch
        }
    }

    fn parse_lightweight(&self, path: &Path, ctx: &DecodeContext) -> Result<Session> {
        jsonl::parse_lightweight(&CodexMapper, Source::Codex, path, ctx)
    }

    fn parse_full(&self, path: &Path, ctx: &DecodeContext) -> Result<Session> {
        jsonl::parse_full(&CodexMapper, Source::Codex, path, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agscope_types::EventKind;
    use std::io::Write;

    const ROLLOUT: &str = r#"{"timestamp":"2025-01-15T10:00:00.000Z","type":"session_meta","payload":{"id":"s1","timestamp":"2025-01-15T10:00:00.000Z","cwd":"/definitely/missing/agscope","originator":"codex_cli_rs","cli_version":"0.50.0","git":{"branch":"main"}}}
{"timestamp":"2025-01-15T10:00:01.000Z","type":"turn_context","payload":{"cwd":"/definitely/missing/agscope","model":"gpt-5-codex"}}
{"timestamp":"2025-01-15T10:00:02.000Z","type":"response_item","payload":{"type":"message","role":"user","content":[{"type":"input_text","text":"<environment_context>\n  <cwd>/x</cwd>\n</environment_context>"}]}}
{"timestamp":"2025-01-15T10:00:03.000Z","type":"response_item","payload":{"type":"message","role":"user","content":[{"type":"input_text","text":"List the files"}]}}
{"timestamp":"2025-01-15T10:00:04.000Z","type":"response_item","payload":{"type":"function_call","name":"shell","arguments":"{\"command\":[\"ls\",\"-la\"]}","call_id":"call_1"}}
{"timestamp":"2025-01-15T10:00:05.000Z","type":"response_item","payload":{"type":"function_call_output","call_id":"call_1","output":"{\"output\":\"Cargo.toml\\n\",\"metadata\":{\"exit_code\":0}}"}}
not json at all
{"timestamp":"2025-01-15T10:00:06.000Z","type":"event_msg","payload":{"type":"agent_message_delta","delta":"Here ","item_id":"m1"}}
{"timestamp":"2025-01-15T10:00:07.000Z","type":"response_item","payload":{"type":"message","role":"assistant","content":[{"type":"output_text","text":"One file."}]}}
"#;

    fn write_rollout(dir: &Path, body: &str) -> std::path::PathBuf {
        let path = dir.join("rollout-2025-01-15T10-00-00-s1.jsonl");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_probe() {
        let decoder = CodexDecoder;
        assert!(decoder.probe(Path::new("/x/rollout-1.jsonl")).is_match());
        assert!(!decoder.probe(Path::new("/x/history.jsonl")).is_match());
        assert!(!decoder.probe(Path::new("/x/rollout-1.json")).is_match());
    }

    #[test]
    fn test_lightweight_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_rollout(dir.path(), ROLLOUT);

        let session = CodexDecoder
            .parse_lightweight(&path, &DecodeContext::default())
            .unwrap();

        assert!(session.is_lightweight());
        assert_eq!(session.model.as_deref(), Some("gpt-5-codex"));
        assert_eq!(session.git_branch.as_deref(), Some("main"));
        assert_eq!(session.title(), "List the files");
        assert_eq!(session.event_count, 9);
        assert_eq!(session.corrupt_records, 1);
        assert_eq!(
            session.end_time.unwrap().to_rfc3339(),
            "2025-01-15T10:00:07+00:00"
        );
        // cwd named in the log does not exist on this machine
        assert_eq!(session.cwd, None);
    }

    #[test]
    fn test_full_parse_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_rollout(dir.path(), ROLLOUT);

        let session = CodexDecoder
            .parse_full(&path, &DecodeContext::default())
            .unwrap();

        let kinds: Vec<EventKind> = session.events.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::Meta,
                EventKind::Meta,
                EventKind::User,
                EventKind::User,
                EventKind::ToolCall,
                EventKind::ToolResult,
                EventKind::Assistant,
                EventKind::Assistant,
            ]
        );

        let call = &session.events[4];
        assert_eq!(call.tool_name.as_deref(), Some("shell"));
        assert_eq!(call.tool_input.as_deref(), Some("ls -la"));

        let result = &session.events[5];
        assert_eq!(result.tool_name.as_deref(), Some("shell"));
        assert_eq!(result.tool_output.as_deref(), Some("Cargo.toml\n"));

        let delta = &session.events[6];
        assert!(delta.is_delta);
        assert_eq!(delta.message_id.as_deref(), Some("m1"));

        assert_eq!(session.corrupt_records, 1);
        assert_eq!(session.message_count(), 6);
        assert!(session.events.iter().all(|e| !e.raw_json.is_empty()));
    }

    #[test]
    fn test_full_parse_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_rollout(dir.path(), ROLLOUT);
        let ctx = DecodeContext::default();

        let first = CodexDecoder.parse_full(&path, &ctx).unwrap();
        let second = CodexDecoder.parse_full(&path, &ctx).unwrap();
        assert_eq!(first.events, second.events);
    }

    #[test]
    fn test_late_records_do_not_change_header_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let project = tempfile::tempdir().unwrap();

        let mut body = String::new();
        for i in 0..30 {
            let record = serde_json::json!({
                "timestamp": format!("2025-01-15T10:00:{:02}.000Z", i),
                "type": "response_item",
                "payload": {"type": "message", "role": "user", "content": [{"type": "input_text", "text": format!("prompt {}", i)}]},
            });
            body.push_str(&record.to_string());
            body.push('\n');
        }
        let late = serde_json::json!({
            "timestamp": "2025-01-15T10:00:30.000Z",
            "type": "turn_context",
            "payload": {"cwd": project.path().to_string_lossy(), "model": "gpt-5-codex"},
        });
        body.push_str(&late.to_string());
        body.push('\n');
        let path = write_rollout(dir.path(), &body);
        let ctx = DecodeContext::default();

        let light = CodexDecoder.parse_lightweight(&path, &ctx).unwrap();
        let full = CodexDecoder.parse_full(&path, &ctx).unwrap();

        assert_eq!(light.cwd, None);
        assert_eq!(full.cwd, light.cwd);
        assert_eq!(full.repo_name, light.repo_name);
        assert_eq!(full.model, light.model);
        assert_eq!(full.title(), "prompt 0");
        assert_eq!(full.start_time, light.start_time);
        assert_eq!(full.end_time, light.end_time);
        assert_eq!(
            full.end_time.unwrap().to_rfc3339(),
            "2025-01-15T10:00:30+00:00"
        );
    }

    #[test]
    fn test_legacy_inline_items() {
        let dir = tempfile::tempdir().unwrap();
        let body = r#"{"id":"s0","timestamp":"2025-04-01T09:00:00Z","instructions":null}
{"type":"message","role":"user","content":[{"type":"input_text","text":"old format prompt"}]}
"#;
        let path = write_rollout(dir.path(), body);

        let session = CodexDecoder
            .parse_full(&path, &DecodeContext::default())
            .unwrap();
        assert_eq!(session.events.len(), 2);
        assert_eq!(session.events[0].kind, EventKind::Meta);
        assert_eq!(session.events[1].kind, EventKind::User);
        assert_eq!(session.title(), "old format prompt");
    }
}
