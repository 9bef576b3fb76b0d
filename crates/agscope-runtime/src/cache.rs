//! Time-bounded transcript cache.
//!
//! Keyed on `(SessionId, RenderOptions)`. Expired entries are dropped lazily
//! on lookup and in bulk by [`TranscriptCache::sweep`]. A lookup that races
//! an eviction sees a miss.

use agscope_engine::{RenderOptions, TranscriptLookup, render};
use agscope_types::{Session, SessionId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

struct Entry {
    text: Arc<str>,
    inserted_at: Instant,
}

type CacheKey = (SessionId, RenderOptions);

pub struct TranscriptCache {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, Entry>>,
}

impl TranscriptCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<CacheKey, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_expired(&self, entry: &Entry, now: Instant) -> bool {
        now.duration_since(entry.inserted_at) >= self.ttl
    }

    /// Rendered transcript, rendering and storing it on a miss
    pub fn get_or_render(&self, session: &Session, options: &RenderOptions) -> Arc<str> {
        if let Some(text) = self.get(&session.id, options) {
            return text;
        }
        let text: Arc<str> = Arc::from(render(session, options));
        self.put(&session.id, options, Arc::clone(&text));
        text
    }

    /// Drop every cached render of a session
    pub fn invalidate(&self, id: &SessionId) {
        self.entries().retain(|(key, _), _| key != id);
    }

    /// Remove expired entries; returns how many were dropped
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|_, entry| !self.is_expired(entry, now));
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!(removed, remaining = entries.len(), "transcript cache swept");
        }
        removed
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

impl Default for TranscriptCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(15 * 60))
    }
}

impl TranscriptLookup for TranscriptCache {
    fn get(&self, id: &SessionId, options: &RenderOptions) -> Option<Arc<str>> {
        let now = Instant::now();
        let mut entries = self.entries();
        let key = (id.clone(), *options);
        let expired = match entries.get(&key) {
            Some(entry) if !self.is_expired(entry, now) => return Some(Arc::clone(&entry.text)),
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.remove(&key);
        }
        None
    }

    fn put(&self, id: &SessionId, options: &RenderOptions, text: Arc<str>) {
        self.entries().insert(
            (id.clone(), *options),
            Entry {
                text,
                inserted_at: Instant::now(),
            },
        );
    }
}
