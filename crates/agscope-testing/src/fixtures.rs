//! Session log writers.
//!
//! Each writer produces a file in the exact layout its agent uses, built
//! record by record so tests state only the content they care about.
//! Timestamps advance one second per record from 2025-01-15T10:00:00Z.

use anyhow::Result;
use chrono::{DateTime, Duration, SecondsFormat, TimeZone, Utc};
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};

const FILLER_WORD: &str = "lorem ";

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Monotonic fixture clock
#[derive(Debug, Default)]
struct Clock {
    tick: i64,
}

impl Clock {
    fn next(&mut self) -> String {
        let ts = base_time() + Duration::seconds(self.tick);
        self.tick += 1;
        ts.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

fn write_file(dir: &Path, name: &str, content: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(name);
    fs::write(&path, content)?;
    Ok(path)
}

/// Codex CLI rollout (`rollout-*.jsonl`)
#[derive(Debug)]
pub struct CodexRollout {
    id: String,
    cwd: Option<String>,
    model: String,
    clock: Clock,
    lines: Vec<String>,
}

impl CodexRollout {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            cwd: None,
            model: "gpt-5-codex".to_string(),
            clock: Clock::default(),
            lines: Vec::new(),
        }
    }

    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_string_lossy().to_string());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn record(&mut self, kind: &str, payload: Value) {
        let line = json!({
            "timestamp": self.clock.next(),
            "type": kind,
            "payload": payload,
        });
        self.lines.push(line.to_string());
    }

    pub fn user(mut self, text: &str) -> Self {
        self.record(
            "response_item",
            json!({"type": "message", "role": "user", "content": [{"type": "input_text", "text": text}]}),
        );
        self
    }

    pub fn assistant(mut self, text: &str) -> Self {
        self.record(
            "response_item",
            json!({"type": "message", "role": "assistant", "content": [{"type": "output_text", "text": text}]}),
        );
        self
    }

    /// Streamed assistant reply, one `agent_message_delta` per chunk
    pub fn assistant_delta(mut self, item_id: &str, chunks: &[&str]) -> Self {
        for chunk in chunks {
            self.record(
                "event_msg",
                json!({"type": "agent_message_delta", "delta": chunk, "item_id": item_id}),
            );
        }
        self
    }

    /// A shell call and its output
    pub fn shell(mut self, command: &[&str], output: &str) -> Self {
        let call_id = format!("call_{}", self.lines.len());
        let arguments = json!({ "command": command }).to_string();
        self.record(
            "response_item",
            json!({"type": "function_call", "name": "shell", "arguments": arguments, "call_id": call_id}),
        );
        let output = json!({ "output": output, "metadata": {"exit_code": 0} }).to_string();
        self.record(
            "response_item",
            json!({"type": "function_call_output", "call_id": call_id, "output": output}),
        );
        self
    }

    /// A line that is not JSON
    pub fn garbage(mut self) -> Self {
        self.lines.push("not json {{{".to_string());
        self
    }

    /// Append assistant records of `line_bytes` filler until the file
    /// reaches `target_bytes`
    pub fn pad_to(mut self, target_bytes: usize, line_bytes: usize) -> Self {
        let filler = FILLER_WORD.repeat(line_bytes / FILLER_WORD.len() + 1);
        let mut len = self.render().len();
        while len < target_bytes {
            self.record(
                "response_item",
                json!({"type": "message", "role": "assistant", "content": [{"type": "output_text", "text": filler}]}),
            );
            len += self.lines.last().map_or(0, |l| l.len() + 1);
        }
        self
    }

    pub fn file_name(&self) -> String {
        format!("rollout-2025-01-15T10-00-00-{}.jsonl", self.id)
    }

    pub fn render(&self) -> String {
        let at = base_time().to_rfc3339_opts(SecondsFormat::Millis, true);
        let mut meta = json!({"id": self.id, "timestamp": at, "originator": "codex_cli_rs"});
        let mut context = json!({"model": self.model});
        if let Some(cwd) = &self.cwd {
            meta["cwd"] = json!(cwd);
            context["cwd"] = json!(cwd);
        }
        let header = [
            json!({"timestamp": at, "type": "session_meta", "payload": meta}).to_string(),
            json!({"timestamp": at, "type": "turn_context", "payload": context}).to_string(),
        ];

        let mut out = String::new();
        for line in header.iter().chain(self.lines.iter()) {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    /// Write under `dir` (a dated shard directory)
    pub fn write(&self, dir: &Path) -> Result<PathBuf> {
        write_file(dir, &self.file_name(), &self.render())
    }
}

/// Claude Code transcript (`<session-id>.jsonl` in an encoded project dir)
#[derive(Debug)]
pub struct ClaudeTranscript {
    session_id: String,
    cwd: String,
    clock: Clock,
    lines: Vec<String>,
}

impl ClaudeTranscript {
    pub fn new(session_id: impl Into<String>, cwd: impl AsRef<Path>) -> Self {
        Self {
            session_id: session_id.into(),
            cwd: cwd.as_ref().to_string_lossy().to_string(),
            clock: Clock::default(),
            lines: Vec::new(),
        }
    }

    fn record(&mut self, kind: &str, message: Value) {
        let uuid = format!("{}-{}", self.session_id, self.lines.len());
        let line = json!({
            "type": kind,
            "sessionId": self.session_id,
            "uuid": uuid,
            "cwd": self.cwd,
            "gitBranch": "main",
            "timestamp": self.clock.next(),
            "message": message,
        });
        self.lines.push(line.to_string());
    }

    pub fn user(mut self, text: &str) -> Self {
        self.record("user", json!({"role": "user", "content": text}));
        self
    }

    pub fn assistant(mut self, text: &str) -> Self {
        let id = format!("msg_{}", self.lines.len());
        self.record(
            "assistant",
            json!({"id": id, "role": "assistant", "model": "claude-sonnet-4-5", "content": [{"type": "text", "text": text}]}),
        );
        self
    }

    /// A tool_use block followed by its tool_result
    pub fn tool(mut self, name: &str, input: Value, result: &str) -> Self {
        let id = format!("toolu_{}", self.lines.len());
        self.record(
            "assistant",
            json!({"id": format!("msg_{}", self.lines.len()), "role": "assistant", "content": [{"type": "tool_use", "id": id, "name": name, "input": input}]}),
        );
        self.record(
            "user",
            json!({"role": "user", "content": [{"type": "tool_result", "tool_use_id": id, "content": result}]}),
        );
        self
    }

    pub fn file_name(&self) -> String {
        format!("{}.jsonl", self.session_id)
    }

    pub fn render(&self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }

    /// Write under `dir` (the encoded project directory)
    pub fn write(&self, dir: &Path) -> Result<PathBuf> {
        write_file(dir, &self.file_name(), &self.render())
    }
}

/// Gemini CLI chat document (`session-*.json` under `<hash>/chats`)
#[derive(Debug)]
pub struct GeminiChat {
    session_id: String,
    project_hash: String,
    clock: Clock,
    messages: Vec<Value>,
}

impl GeminiChat {
    pub fn new(session_id: impl Into<String>, project_hash: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            project_hash: project_hash.into(),
            clock: Clock::default(),
            messages: Vec::new(),
        }
    }

    fn message(&mut self, kind: &str, content: &str) {
        let id = format!("{}-{}", self.session_id, self.messages.len());
        self.messages.push(json!({
            "id": id,
            "timestamp": self.clock.next(),
            "type": kind,
            "content": content,
        }));
    }

    pub fn user(mut self, text: &str) -> Self {
        self.message("user", text);
        self
    }

    pub fn gemini(mut self, text: &str) -> Self {
        self.message("gemini", text);
        self
    }

    pub fn file_name(&self) -> String {
        format!("session-2025-01-15T10-00-{}.json", self.session_id)
    }

    pub fn render(&self) -> String {
        let start = base_time().to_rfc3339_opts(SecondsFormat::Millis, true);
        let document = json!({
            "sessionId": self.session_id,
            "projectHash": self.project_hash,
            "startTime": start,
            "lastUpdated": start,
            "messages": self.messages,
        });
        serde_json::to_string_pretty(&document).unwrap_or_default()
    }

    /// Write under `dir` (the `chats` directory)
    pub fn write(&self, dir: &Path) -> Result<PathBuf> {
        write_file(dir, &self.file_name(), &self.render())
    }
}
