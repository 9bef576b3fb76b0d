use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use super::source::Source;
use crate::event::SessionEvent;
use crate::util::{normalize_path, sha256_hex};

/// Stable session identity derived from the log file path
///
/// Content-independent: reparsing a file (or the file growing) never changes
/// its id, which is what lets a store replace a lightweight session with its
/// fully-parsed version in place.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn from_path(path: &Path) -> Self {
        let normalized = normalize_path(path);
        Self(sha256_hex(normalized.to_string_lossy().as_bytes()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form for display (first 12 hex chars)
    pub fn short(&self) -> &str {
        let end = self.0.len().min(12);
        &self.0[..end]
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One logical conversation backed by one log file.
///
/// A session with no events is *lightweight*: only metadata was read and
/// `event_count` is an estimate. A session with events is *fully parsed*.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub source: Source,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub file_path: PathBuf,
    pub file_size_bytes: u64,
    /// File modification time at discovery, used for recency ordering
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
    /// Record count; an estimate while lightweight
    pub event_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_branch: Option<String>,
    /// Project hash (Gemini) or encoded project directory name (Claude)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lightweight_title: Option<String>,
    /// Malformed records skipped during the most recent parse
    #[serde(default)]
    pub corrupt_records: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<SessionEvent>,
}

impl Session {
    /// Empty metadata shell for a file; decoders fill in the rest
    pub fn for_file(source: Source, path: &Path, size_bytes: u64) -> Self {
        Self {
            id: SessionId::from_path(path),
            source,
            start_time: None,
            end_time: None,
            model: None,
            file_path: path.to_path_buf(),
            file_size_bytes: size_bytes,
            modified_at: None,
            event_count: 0,
            cwd: None,
            repo_name: None,
            git_branch: None,
            project_hash: None,
            lightweight_title: None,
            corrupt_records: 0,
            events: Vec::new(),
        }
    }

    pub fn is_lightweight(&self) -> bool {
        self.events.is_empty()
    }

    pub fn is_fully_parsed(&self) -> bool {
        !self.events.is_empty()
    }

    /// Displayed message count: the estimate while lightweight, otherwise the
    /// number of non-meta events actually present.
    pub fn message_count(&self) -> usize {
        if self.is_lightweight() {
            self.event_count
        } else {
            self.events.iter().filter(|e| !e.kind.is_meta()).count()
        }
    }

    pub fn title(&self) -> &str {
        self.lightweight_title.as_deref().unwrap_or("No prompt")
    }

    /// Timestamp used for recency ordering (most recent activity first)
    pub fn recency(&self) -> Option<DateTime<Utc>> {
        self.modified_at.or(self.end_time).or(self.start_time)
    }

    /// Timestamp used for date-range filtering
    pub fn activity_time(&self) -> Option<DateTime<Utc>> {
        self.end_time.or(self.start_time).or(self.modified_at)
    }

    /// Replace the event payload with a full parse result.
    ///
    /// Events are always replaced, never appended, so reparsing a session
    /// cannot duplicate events.
    pub fn replace_events(&mut self, events: Vec<SessionEvent>) {
        self.event_count = events.len();
        self.events = events;
    }
}

/// Recency ordering: newest first, sessions without any timestamp last,
/// file path as a deterministic tie-breaker.
pub fn sort_by_recency<S: AsRef<Session>>(sessions: &mut [S]) {
    sessions.sort_by(|a, b| {
        let (a, b) = (a.as_ref(), b.as_ref());
        b.recency()
            .cmp(&a.recency())
            .then_with(|| a.file_path.cmp(&b.file_path))
    });
}

impl AsRef<Session> for Session {
    fn as_ref(&self) -> &Session {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EventKind;
    use chrono::TimeZone;

    fn event(kind: EventKind) -> SessionEvent {
        SessionEvent::new("e", kind, "{}")
    }

    #[test]
    fn test_session_id_is_stable_for_same_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rollout-a.jsonl");
        std::fs::write(&path, "{}\n").unwrap();

        let first = SessionId::from_path(&path);
        std::fs::write(&path, "{}\n{}\n").unwrap();
        let second = SessionId::from_path(&path);

        assert_eq!(first, second);
        assert_eq!(first.as_str().len(), 64);
        assert_eq!(first.short().len(), 12);
    }

    #[test]
    fn test_message_count_uses_estimate_while_lightweight() {
        let mut session = Session::for_file(Source::Codex, Path::new("/tmp/a.jsonl"), 10);
        session.event_count = 42;
        assert!(session.is_lightweight());
        assert_eq!(session.message_count(), 42);
    }

    #[test]
    fn test_message_count_excludes_meta_when_parsed() {
        let mut session = Session::for_file(Source::Codex, Path::new("/tmp/a.jsonl"), 10);
        session.replace_events(vec![
            event(EventKind::Meta),
            event(EventKind::User),
            event(EventKind::Assistant),
        ]);
        assert!(session.is_fully_parsed());
        assert_eq!(session.event_count, 3);
        assert_eq!(session.message_count(), 2);
    }

    #[test]
    fn test_replace_events_never_appends() {
        let mut session = Session::for_file(Source::Claude, Path::new("/tmp/b.jsonl"), 10);
        session.replace_events(vec![event(EventKind::User)]);
        session.replace_events(vec![event(EventKind::User)]);
        assert_eq!(session.events.len(), 1);
    }

    #[test]
    fn test_sort_by_recency_newest_first() {
        let mut old = Session::for_file(Source::Codex, Path::new("/tmp/old.jsonl"), 1);
        old.modified_at = Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let mut new = Session::for_file(Source::Codex, Path::new("/tmp/new.jsonl"), 1);
        new.modified_at = Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        let undated = Session::for_file(Source::Codex, Path::new("/tmp/undated.jsonl"), 1);

        let mut sessions = vec![old, undated, new];
        sort_by_recency(&mut sessions);
        let names: Vec<_> = sessions
            .iter()
            .map(|s| s.file_path.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["new.jsonl", "old.jsonl", "undated.jsonl"]);
    }
}
