use agscope_types::{Filters, Session, SessionId, Source, sort_by_recency};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::report::CorpusReport;
use crate::store::SessionStore;
use crate::{Error, Result};

/// Read view over several per-source stores.
///
/// Holds no sessions of its own; every query snapshots the stores, and
/// updates are routed to the store that owns the session's source.
#[derive(Debug, Default)]
pub struct UnifiedIndex {
    stores: Vec<Arc<SessionStore>>,
}

impl UnifiedIndex {
    pub fn new(stores: Vec<Arc<SessionStore>>) -> Self {
        Self { stores }
    }

    pub fn stores(&self) -> &[Arc<SessionStore>] {
        &self.stores
    }

    pub fn store_for(&self, source: Source) -> Option<&Arc<SessionStore>> {
        self.stores.iter().find(|s| s.source() == source)
    }

    /// Every session, newest first
    pub fn all(&self) -> Vec<Arc<Session>> {
        let mut sessions: Vec<Arc<Session>> = self.stores.iter().flat_map(|s| s.all()).collect();
        sort_by_recency(&mut sessions);
        sessions
    }

    /// Sessions passing the non-text filters, newest first
    pub fn filtered(&self, filters: &Filters) -> Vec<Arc<Session>> {
        let mut sessions: Vec<Arc<Session>> = self
            .stores
            .iter()
            .filter(|store| filters.includes_source(store.source()))
            .flat_map(|store| store.all())
            .filter(|session| filters.matches_metadata(session))
            .collect();
        sort_by_recency(&mut sessions);
        sessions
    }

    pub fn counts(&self) -> BTreeMap<Source, usize> {
        self.stores.iter().map(|s| (s.source(), s.len())).collect()
    }

    pub fn len(&self) -> usize {
        self.stores.iter().map(|s| s.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.iter().all(|s| s.is_empty())
    }

    pub fn find(&self, id: &SessionId) -> Option<Arc<Session>> {
        self.stores.iter().find_map(|s| s.get(id))
    }

    /// Session whose id starts with `prefix`; ambiguity is an error
    pub fn find_by_prefix(&self, prefix: &str) -> Result<Arc<Session>> {
        let prefix = prefix.trim().to_ascii_lowercase();
        if prefix.is_empty() {
            return Err(Error::SessionNotFound(prefix));
        }
        let mut found: Vec<Arc<Session>> = self
            .stores
            .iter()
            .flat_map(|s| s.all())
            .filter(|s| s.id.as_str().starts_with(&prefix))
            .collect();
        match found.len() {
            0 => Err(Error::SessionNotFound(prefix)),
            1 => Ok(found.remove(0)),
            count => Err(Error::AmbiguousSession { prefix, count }),
        }
    }

    /// Route an update to the owning store; false when no store holds it
    pub fn update_session(&self, session: Session) -> bool {
        match self.store_for(session.source) {
            Some(store) => store.update_session(session),
            None => false,
        }
    }

    /// Full parse through the owning store, persisted
    pub fn reload(&self, id: &SessionId) -> Result<Arc<Session>> {
        let session = self
            .find(id)
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))?;
        let store = self
            .store_for(session.source)
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))?;
        store.reload(id)
    }

    pub fn report(&self) -> CorpusReport {
        CorpusReport {
            sources: self.stores.iter().map(|s| s.report()).collect(),
        }
    }
}
