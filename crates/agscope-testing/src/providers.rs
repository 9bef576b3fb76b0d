//! Source definitions for tests.
//!
//! Maps each source to the directory layout its agent writes, so tests
//! place files where discovery expects them.

use agscope_core::{claude_project_dir_name, normalize_path, project_hash_from_root};
use agscope_types::Source;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestProvider {
    Codex,
    Claude,
    Gemini,
}

impl TestProvider {
    /// Name used in config.toml and CLI flags
    pub fn name(&self) -> &'static str {
        self.source().id()
    }

    pub fn source(&self) -> Source {
        match self {
            TestProvider::Codex => Source::Codex,
            TestProvider::Claude => Source::Claude,
            TestProvider::Gemini => Source::Gemini,
        }
    }

    /// Log root directory name relative to the temp root
    pub fn default_log_dir_name(&self) -> &'static str {
        match self {
            TestProvider::Codex => ".codex/sessions",
            TestProvider::Claude => ".claude/projects",
            TestProvider::Gemini => ".gemini/tmp",
        }
    }

    /// Directory under the log root that holds sessions for `project`.
    ///
    /// Codex shards by date instead of project, so `project` is ignored.
    pub fn session_dir(&self, log_root: &Path, project: &Path) -> PathBuf {
        let project = normalize_path(project);
        match self {
            TestProvider::Codex => log_root.join("2025").join("01").join("15"),
            TestProvider::Claude => log_root.join(claude_project_dir_name(&project)),
            TestProvider::Gemini => log_root
                .join(project_hash_from_root(&project.to_string_lossy()).as_str())
                .join("chats"),
        }
    }

    pub fn all() -> &'static [TestProvider] {
        &[TestProvider::Codex, TestProvider::Claude, TestProvider::Gemini]
    }
}

impl std::fmt::Display for TestProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
