use agscope_runtime::{CorpusReport, IndexReport};
use agscope_types::{SearchProgress, SearchState, Session, Source, collapse_whitespace};
use chrono::{DateTime, Utc};
use is_terminal::IsTerminal;
use owo_colors::OwoColorize;
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Colors are applied only when stdout is a terminal
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn detect() -> Self {
        Self {
            enabled: std::io::stdout().is_terminal(),
        }
    }

    pub fn plain() -> Self {
        Self { enabled: false }
    }

    fn dim(&self, s: &str) -> String {
        if self.enabled {
            s.bright_black().to_string()
        } else {
            s.to_string()
        }
    }

    fn id(&self, s: &str) -> String {
        if self.enabled {
            s.yellow().to_string()
        } else {
            s.to_string()
        }
    }

    fn warn(&self, s: &str) -> String {
        if self.enabled {
            s.red().to_string()
        } else {
            s.to_string()
        }
    }

    fn source(&self, source: Source) -> String {
        let label = format!("{:<6}", source.id());
        if !self.enabled {
            return label;
        }
        match source {
            Source::Codex => label.green().to_string(),
            Source::Claude => label.blue().to_string(),
            Source::Gemini => label.magenta().to_string(),
        }
    }
}

/// JSON shape of one session in `list` and `search` output
#[derive(Debug, Serialize)]
pub struct SessionSummary<'a> {
    pub id: &'a str,
    pub source: Source,
    pub title: &'a str,
    pub fully_parsed: bool,
    pub message_count: usize,
    pub model: Option<&'a str>,
    pub project: Option<&'a str>,
    pub cwd: Option<&'a str>,
    pub git_branch: Option<&'a str>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
    pub file_path: &'a Path,
    pub file_size_bytes: u64,
}

impl<'a> From<&'a Session> for SessionSummary<'a> {
    fn from(session: &'a Session) -> Self {
        Self {
            id: session.id.as_str(),
            source: session.source,
            title: session.title(),
            fully_parsed: session.is_fully_parsed(),
            message_count: session.message_count(),
            model: session.model.as_deref(),
            project: session.repo_name.as_deref(),
            cwd: session.cwd.as_deref(),
            git_branch: session.git_branch.as_deref(),
            start_time: session.start_time,
            end_time: session.end_time,
            modified_at: session.modified_at,
            file_path: &session.file_path,
            file_size_bytes: session.file_size_bytes,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionListJson<'a> {
    pub sessions: Vec<SessionSummary<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<SearchProgress>,
}

impl<'a> SessionListJson<'a> {
    pub fn new<S: AsRef<Session> + 'a>(sessions: &'a [S]) -> Self {
        Self {
            sessions: sessions
                .iter()
                .map(|s| SessionSummary::from(s.as_ref()))
                .collect(),
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: SearchProgress) -> Self {
        self.progress = Some(progress);
        self
    }
}

fn truncate_for_display(s: &str, max_chars: usize) -> String {
    let normalized = collapse_whitespace(s);
    if normalized.chars().count() <= max_chars {
        normalized
    } else {
        let truncated: String = normalized.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

/// One line per session: time, id, source, message count, model, project, title
pub struct SessionRow<'a> {
    session: &'a Session,
    palette: Palette,
}

impl<'a> SessionRow<'a> {
    pub fn new(session: &'a Session, palette: Palette) -> Self {
        Self { session, palette }
    }
}

impl fmt::Display for SessionRow<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.session;
        let time = s
            .activity_time()
            .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        // an approximate count until the session has been fully parsed
        let count = if s.is_lightweight() {
            format!("~{}", s.message_count())
        } else {
            s.message_count().to_string()
        };
        let model = s.model.as_deref().unwrap_or("-");
        let project = s.repo_name.as_deref().unwrap_or("-");

        write!(
            f,
            "{} {} {} {:>6} {} {} {}",
            self.palette.dim(&time),
            self.palette.id(s.id.short()),
            self.palette.source(s.source),
            count,
            self.palette.dim(model),
            project,
            truncate_for_display(s.title(), 80)
        )
    }
}

pub struct SessionListView<'a, S> {
    sessions: &'a [S],
    palette: Palette,
}

impl<'a, S: AsRef<Session>> SessionListView<'a, S> {
    pub fn new(sessions: &'a [S], palette: Palette) -> Self {
        Self { sessions, palette }
    }
}

impl<S: AsRef<Session>> fmt::Display for SessionListView<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for session in self.sessions {
            writeln!(f, "{}", SessionRow::new(session.as_ref(), self.palette))?;
        }
        Ok(())
    }
}

pub struct IndexView<'a> {
    report: &'a CorpusReport,
    palette: Palette,
}

impl<'a> IndexView<'a> {
    pub fn new(report: &'a CorpusReport, palette: Palette) -> Self {
        Self { report, palette }
    }

    fn source_line(&self, f: &mut fmt::Formatter<'_>, r: &IndexReport) -> fmt::Result {
        let label = self.palette.source(r.source);
        if let Some(err) = &r.root_error {
            return writeln!(
                f,
                "{} {} {}",
                label,
                r.root.display(),
                self.palette.warn(&format!("(not accessible: {})", err))
            );
        }
        write!(f, "{} {} {} sessions", label, r.root.display(), r.indexed)?;
        if r.skipped() > 0 || r.corrupt_records > 0 {
            write!(
                f,
                " {}",
                self.palette.dim(&format!(
                    "({} not indexable, {} unreadable, {} corrupt records)",
                    r.not_indexable, r.unreadable, r.corrupt_records
                ))
            )?;
        }
        writeln!(f)
    }
}

impl fmt::Display for IndexView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.report.sources.is_empty() {
            return writeln!(f, "No sources enabled. Add [sources.<name>] entries to config.toml.");
        }
        for r in &self.report.sources {
            self.source_line(f, r)?;
        }
        writeln!(f, "Total: {} sessions", self.report.indexed())
    }
}

/// Trailing summary line of a search
pub struct SearchSummary {
    pub shown: usize,
    pub progress: SearchProgress,
}

impl fmt::Display for SearchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = &self.progress;
        match p.state {
            SearchState::Cancelled => write!(
                f,
                "Search cancelled: {} matches after scanning {} of {} sessions",
                self.shown,
                p.scanned(),
                p.total()
            ),
            _ => write!(
                f,
                "{} matches in {} sessions ({} small, {} large)",
                self.shown,
                p.total(),
                p.total_small,
                p.total_large
            ),
        }
    }
}
