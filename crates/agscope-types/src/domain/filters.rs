use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::session::Session;
use super::source::Source;
use crate::event::EventKind;

/// Inclusive date range; either bound may be open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.since.is_none_or(|since| ts >= since) && self.until.is_none_or(|until| ts <= until)
    }

    pub fn is_open(&self) -> bool {
        self.since.is_none() && self.until.is_none()
    }
}

/// Immutable description of a search/filter request
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Filters {
    /// Free-text query; empty matches everything
    pub query: String,
    pub date_range: Option<DateRange>,
    /// Case-insensitive substring of the session model
    pub model: Option<String>,
    /// Restrict to sessions containing these event kinds
    pub kinds: Option<BTreeSet<EventKind>>,
    /// Repository/project name (case-insensitive)
    pub project: Option<String>,
    /// Sources to include; `None` includes all
    pub sources: Option<BTreeSet<Source>>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.date_range.get_or_insert_with(DateRange::default).since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.date_range.get_or_insert_with(DateRange::default).until = Some(until);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn kind(mut self, kind: EventKind) -> Self {
        self.kinds.get_or_insert_with(BTreeSet::new).insert(kind);
        self
    }

    pub fn project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn source(mut self, source: Source) -> Self {
        self.sources.get_or_insert_with(BTreeSet::new).insert(source);
        self
    }

    pub fn has_query(&self) -> bool {
        !self.query.trim().is_empty()
    }

    pub fn includes_source(&self, source: Source) -> bool {
        self.sources.as_ref().is_none_or(|set| set.contains(&source))
    }

    /// Evaluate every non-text filter against a session.
    ///
    /// The kind filter can only be judged once events are loaded; a
    /// lightweight session passes it and is re-checked after parsing.
    pub fn matches_metadata(&self, session: &Session) -> bool {
        if !self.includes_source(session.source) {
            return false;
        }

        if let Some(range) = &self.date_range
            && !range.is_open()
        {
            match session.activity_time() {
                Some(ts) if range.contains(ts) => {}
                _ => return false,
            }
        }

        if let Some(model) = &self.model {
            let wanted = model.to_lowercase();
            match &session.model {
                Some(m) if m.to_lowercase().contains(&wanted) => {}
                _ => return false,
            }
        }

        if let Some(project) = &self.project {
            let wanted = project.to_lowercase();
            let repo_match = session
                .repo_name
                .as_ref()
                .is_some_and(|r| r.to_lowercase() == wanted);
            let cwd_match = session
                .cwd
                .as_ref()
                .is_some_and(|c| c.to_lowercase().contains(&wanted));
            if !repo_match && !cwd_match {
                return false;
            }
        }

        if let Some(kinds) = &self.kinds
            && session.is_fully_parsed()
            && !session.events.iter().any(|e| kinds.contains(&e.kind))
        {
            return false;
        }

        true
    }
}
