use agscope_engine::{TranscriptLookup, TranscriptPolicy, evaluate};
use agscope_types::{Filters, SearchProgress, SearchState, Session};
use rayon::prelude::*;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::mpsc::Sender;

use super::emitter::UpdateEmitter;
use super::{SearchControl, SearchUpdate};
use crate::aggregator::UnifiedIndex;
use crate::cache::TranscriptCache;
use crate::config::SearchConfig;
use crate::{Error, Result};

/// Marks the search finished even if the worker unwinds
struct FinishGuard(Arc<SearchControl>);

impl Drop for FinishGuard {
    fn drop(&mut self) {
        self.0.mark_finished();
    }
}

pub(crate) struct SearchJob {
    pub(crate) index: Arc<UnifiedIndex>,
    pub(crate) cache: Arc<TranscriptCache>,
    pub(crate) config: SearchConfig,
    pub(crate) filters: Filters,
    pub(crate) control: Arc<SearchControl>,
    /// Search this one superseded; must stop before this one starts
    pub(crate) previous: Option<Arc<SearchControl>>,
}

impl SearchJob {
    pub(crate) fn run(self, tx: Sender<SearchUpdate>) -> SearchProgress {
        let _guard = FinishGuard(Arc::clone(&self.control));
        if let Some(previous) = &self.previous {
            previous.wait_finished();
        }

        let mut emitter = UpdateEmitter::new(tx, self.config.update_interval());
        let (small, large) = self.partition();
        let mut progress = SearchProgress::new(small.len(), large.len());
        self.publish(&mut emitter, progress);

        tracing::debug!(
            small = small.len(),
            large = large.len(),
            query = %self.filters.query,
            "search started"
        );

        for batch in small.chunks(self.config.batch_size.max(1)) {
            if self.control.is_cancelled() {
                break;
            }
            let matched: Vec<Arc<Session>> = batch
                .par_iter()
                .filter_map(|session| self.process(session, TranscriptPolicy::BuildOnMiss))
                .collect();
            progress.scanned_small += batch.len();
            emitter.push_matches(matched);
            self.publish(&mut emitter, progress);
        }

        let mut remaining: VecDeque<Arc<Session>> = large.into();
        while !self.control.is_cancelled() {
            let moved = self.control.apply_promotions(&mut remaining);
            if moved > 0 {
                tracing::debug!(moved, "promoted sessions to front of large queue");
            }
            let Some(session) = remaining.pop_front() else {
                break;
            };
            if let Some(matched) = self.process(&session, TranscriptPolicy::CachedOnly) {
                emitter.push_matches([matched]);
            }
            progress.scanned_large += 1;
            self.publish(&mut emitter, progress);
        }

        progress.state = if progress.scanned() == progress.total() {
            SearchState::Completed
        } else {
            SearchState::Cancelled
        };
        self.control.set_progress(progress);
        emitter.finish(progress);

        tracing::info!(
            state = ?progress.state,
            scanned_small = progress.scanned_small,
            scanned_large = progress.scanned_large,
            "search finished"
        );
        progress
    }

    fn publish(&self, emitter: &mut UpdateEmitter, progress: SearchProgress) {
        self.control.set_progress(progress);
        emitter.progress(progress);
    }

    /// Candidates split at the large-file threshold, each newest first
    fn partition(&self) -> (Vec<Arc<Session>>, Vec<Arc<Session>>) {
        let threshold = self.config.large_file_threshold_bytes;
        let (large, small): (Vec<_>, Vec<_>) = self
            .index
            .filtered(&self.filters)
            .into_iter()
            .partition(|s| s.file_size_bytes >= threshold);
        (small, large)
    }

    /// Content can only be judged on parsed events
    fn needs_events(&self) -> bool {
        self.filters.has_query() || self.filters.kinds.is_some()
    }

    /// Parse if needed, persist, then evaluate. `None` means no match.
    fn process(&self, session: &Arc<Session>, policy: TranscriptPolicy) -> Option<Arc<Session>> {
        let session = if session.is_lightweight() && self.needs_events() {
            match self.parse_and_persist(session) {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::debug!(path = ?session.file_path, error = %e, "skipping session that failed to parse");
                    return None;
                }
            }
        } else {
            Arc::clone(session)
        };

        let cache: &dyn TranscriptLookup = self.cache.as_ref();
        evaluate(&session, &self.filters, Some(cache), policy)
            .is_match()
            .then_some(session)
    }

    fn parse_and_persist(&self, session: &Arc<Session>) -> Result<Arc<Session>> {
        let store = self
            .index
            .store_for(session.source)
            .ok_or_else(|| Error::SessionNotFound(session.id.to_string()))?;
        store.ensure_parsed(session)
    }
}
