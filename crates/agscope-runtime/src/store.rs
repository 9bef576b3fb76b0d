//! Canonical per-source session store.
//!
//! The store owns the lightweight → fully-parsed transition: any full parse
//! that should outlive the caller goes through [`SessionStore::update_session`]
//! (or [`SessionStore::ensure_parsed`], which routes there). Sessions are held
//! as `Arc<Session>` and swapped whole under the write lock, so a reader sees
//! either the old or the new version, never a mix.

use agscope_core::ProjectResolver;
use agscope_providers::{DecodeContext, LogDecoder, list_candidate_files};
use agscope_types::{Session, SessionId, Source, sort_by_recency};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::cache::TranscriptCache;
use crate::report::IndexReport;
use crate::{Error, Result};

#[derive(Default)]
struct StoreState {
    /// Recency order as of the last index
    sessions: Vec<Arc<Session>>,
    positions: HashMap<SessionId, usize>,
}

impl StoreState {
    fn new(sessions: Vec<Arc<Session>>) -> Self {
        let positions = sessions
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id.clone(), i))
            .collect();
        Self {
            sessions,
            positions,
        }
    }
}

pub struct SessionStore {
    source: Source,
    root: PathBuf,
    decoder: Box<dyn LogDecoder>,
    context: RwLock<DecodeContext>,
    state: RwLock<StoreState>,
    report: Mutex<IndexReport>,
    cache: Option<Arc<TranscriptCache>>,
}

impl SessionStore {
    pub fn new(
        decoder: Box<dyn LogDecoder>,
        root: impl Into<PathBuf>,
        context: DecodeContext,
        cache: Option<Arc<TranscriptCache>>,
    ) -> Self {
        let source = decoder.source();
        let root = root.into();
        Self {
            source,
            report: Mutex::new(IndexReport::new(source, &root)),
            root,
            decoder,
            context: RwLock::new(context),
            state: RwLock::new(StoreState::default()),
            cache,
        }
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read_state(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn context(&self) -> DecodeContext {
        self.context
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Swap the project resolver used by later parses
    pub fn set_resolver(&self, resolver: Arc<ProjectResolver>) {
        self.context
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .resolver = resolver;
    }

    /// Rebuild the store from the filesystem with lightweight parses.
    ///
    /// Replaces every session, discarding earlier full parses. Per-file
    /// failures are counted in the report; only an inaccessible root is
    /// recorded as `root_error`.
    pub fn index(&self) -> IndexReport {
        let mut report = IndexReport::new(self.source, &self.root);

        let candidates = match list_candidate_files(&self.root, self.decoder.as_ref()) {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!(source = %self.source, root = ?self.root, error = %e, "source root not accessible");
                report.root_error = Some(e.to_string());
                *self.write_state() = StoreState::default();
                self.set_report(report.clone());
                return report;
            }
        };
        report.discovered = candidates.len();

        let context = self.context();
        let outcomes: Vec<_> = candidates
            .par_iter()
            .map(|candidate| {
                let parsed = self.decoder.parse_lightweight(&candidate.path, &context);
                (candidate, parsed)
            })
            .collect();

        let mut sessions = Vec::with_capacity(outcomes.len());
        for (candidate, outcome) in outcomes {
            match outcome {
                Ok(mut session) => {
                    if session.modified_at.is_none() {
                        session.modified_at = candidate.modified_at;
                    }
                    report.corrupt_records += session.corrupt_records;
                    sessions.push(Arc::new(session));
                }
                Err(e) if e.is_corrupt() => {
                    tracing::debug!(path = ?candidate.path, error = %e, "file not indexable");
                    report.not_indexable += 1;
                }
                Err(e) => {
                    tracing::warn!(path = ?candidate.path, error = %e, "skipping unreadable session file");
                    report.unreadable += 1;
                }
            }
        }

        sort_by_recency(&mut sessions);
        report.indexed = sessions.len();
        *self.write_state() = StoreState::new(sessions);
        if let Some(cache) = &self.cache {
            cache.clear();
        }

        tracing::info!(
            source = %self.source,
            indexed = report.indexed,
            not_indexable = report.not_indexable,
            unreadable = report.unreadable,
            corrupt_records = report.corrupt_records,
            "indexed source"
        );
        self.set_report(report.clone());
        report
    }

    fn set_report(&self, report: IndexReport) {
        *self.report.lock().unwrap_or_else(PoisonError::into_inner) = report;
    }

    /// Report from the most recent [`SessionStore::index`]
    pub fn report(&self) -> IndexReport {
        self.report
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Read-only snapshot in recency order
    pub fn all(&self) -> Vec<Arc<Session>> {
        self.read_state().sessions.clone()
    }

    pub fn get(&self, id: &SessionId) -> Option<Arc<Session>> {
        let state = self.read_state();
        state.positions.get(id).map(|&i| Arc::clone(&state.sessions[i]))
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.read_state().positions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.read_state().sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_state().sessions.is_empty()
    }

    /// Replace a session by id. No-op (returns false) when the id is absent,
    /// e.g. after a concurrent reindex dropped it.
    pub fn update_session(&self, updated: Session) -> bool {
        self.replace(Arc::new(updated))
    }

    pub(crate) fn replace(&self, updated: Arc<Session>) -> bool {
        let id = updated.id.clone();
        {
            let mut state = self.write_state();
            let Some(&i) = state.positions.get(&id) else {
                tracing::debug!(session = %id.short(), "update ignored: session not in store");
                return false;
            };
            state.sessions[i] = updated;
        }
        if let Some(cache) = &self.cache {
            cache.invalidate(&id);
        }
        tracing::trace!(session = %id.short(), source = %self.source, "session updated");
        true
    }

    /// Decode a session's file completely without touching the store
    pub fn parse_full(&self, session: &Session) -> Result<Session> {
        let context = self.context();
        Ok(self.decoder.parse_full(&session.file_path, &context)?)
    }

    /// Fully parsed version of `session`, parsing and persisting it if needed
    pub fn ensure_parsed(&self, session: &Arc<Session>) -> Result<Arc<Session>> {
        if session.is_fully_parsed() {
            return Ok(Arc::clone(session));
        }
        let parsed = Arc::new(self.parse_full(session)?);
        self.replace(Arc::clone(&parsed));
        Ok(parsed)
    }

    /// Parse a stored session in full, persist it and return the stored version
    pub fn reload(&self, id: &SessionId) -> Result<Arc<Session>> {
        let current = self
            .get(id)
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))?;
        let parsed = Arc::new(self.parse_full(&current)?);
        self.replace(Arc::clone(&parsed));
        tracing::debug!(
            session = %id.short(),
            events = parsed.events.len(),
            "session reloaded"
        );
        Ok(parsed)
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("source", &self.source)
            .field("root", &self.root)
            .field("sessions", &self.len())
            .finish()
    }
}
