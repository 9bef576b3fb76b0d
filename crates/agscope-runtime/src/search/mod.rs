//! Two-phase progressive search.
//!
//! Phase 1 walks sessions below the large-file threshold in batches,
//! parsing each batch in parallel. Phase 2 walks large sessions one at a
//! time, honoring promotion requests before each pick. Every full parse is
//! written back to the owning store before the match check, and stays there
//! when the search is cancelled.
//!
//! Lifecycle per search: `Idle → Running → {Completed | Cancelled}`. Starting
//! a search cancels the previous one, and the new worker waits for the old
//! one to stop before touching the stores.

mod emitter;
mod promotion;
mod worker;

pub use promotion::PromotionQueue;

use agscope_types::{Filters, SearchProgress, SearchState, Session, SessionId};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, channel};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use crate::Result;
use crate::aggregator::UnifiedIndex;
use crate::cache::TranscriptCache;
use crate::config::SearchConfig;
use worker::SearchJob;

/// Delivered to the caller at a bounded rate
#[derive(Debug, Clone)]
pub enum SearchUpdate {
    /// Newly matched sessions, in discovery order
    Matches(Vec<Arc<Session>>),
    Progress(SearchProgress),
    /// Always the last update of a search
    Finished(SearchState),
}

/// State shared between a search worker and its handles
#[derive(Debug, Default)]
pub(crate) struct SearchControl {
    cancelled: AtomicBool,
    promotions: Mutex<PromotionQueue>,
    progress: Mutex<SearchProgress>,
    finished: Mutex<bool>,
    finished_cv: Condvar,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SearchControl {
    pub(crate) fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub(crate) fn promote(&self, id: SessionId) {
        lock(&self.promotions).request(id);
    }

    pub(crate) fn apply_promotions(&self, remaining: &mut VecDeque<Arc<Session>>) -> usize {
        lock(&self.promotions).apply(remaining)
    }

    pub(crate) fn progress(&self) -> SearchProgress {
        *lock(&self.progress)
    }

    pub(crate) fn set_progress(&self, progress: SearchProgress) {
        *lock(&self.progress) = progress;
    }

    pub(crate) fn mark_finished(&self) {
        *lock(&self.finished) = true;
        self.finished_cv.notify_all();
    }

    pub(crate) fn is_finished(&self) -> bool {
        *lock(&self.finished)
    }

    /// Block until the worker for this search has stopped
    pub(crate) fn wait_finished(&self) {
        let mut finished = lock(&self.finished);
        while !*finished {
            finished = self
                .finished_cv
                .wait(finished)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// Cancels a search from another thread (e.g. a signal handler)
#[derive(Debug, Clone)]
pub struct SearchCanceller(Arc<SearchControl>);

impl SearchCanceller {
    pub fn cancel(&self) {
        self.0.cancel();
    }
}

/// Matches and final progress of a search that ran to its end
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub matches: Vec<Arc<Session>>,
    pub progress: SearchProgress,
}

/// Caller side of one running search
pub struct SearchHandle {
    control: Arc<SearchControl>,
    updates: Receiver<SearchUpdate>,
    worker: Option<JoinHandle<SearchProgress>>,
}

impl SearchHandle {
    pub fn updates(&self) -> &Receiver<SearchUpdate> {
        &self.updates
    }

    /// Latest progress, unthrottled
    pub fn progress(&self) -> SearchProgress {
        self.control.progress()
    }

    pub fn cancel(&self) {
        self.control.cancel();
    }

    pub fn canceller(&self) -> SearchCanceller {
        SearchCanceller(Arc::clone(&self.control))
    }

    /// Move a not-yet-processed large session to the front of phase 2
    pub fn promote(&self, id: SessionId) {
        self.control.promote(id);
    }

    pub fn is_finished(&self) -> bool {
        self.control.is_finished()
    }

    /// Join the worker and return its final progress
    pub fn wait(mut self) -> SearchProgress {
        self.join()
    }

    fn join(&mut self) -> SearchProgress {
        match self.worker.take().map(JoinHandle::join) {
            Some(Ok(progress)) => progress,
            Some(Err(_)) => {
                tracing::warn!("search worker panicked");
                let mut progress = self.control.progress();
                progress.state = SearchState::Cancelled;
                progress
            }
            None => self.control.progress(),
        }
    }

    /// Drain every update until the search finishes
    pub fn collect(mut self) -> SearchOutcome {
        let mut matches = Vec::new();
        for update in self.updates.iter() {
            match update {
                SearchUpdate::Matches(batch) => matches.extend(batch),
                SearchUpdate::Progress(_) => {}
                SearchUpdate::Finished(_) => break,
            }
        }
        let progress = self.join();
        SearchOutcome { matches, progress }
    }
}

/// Starts searches over a [`UnifiedIndex`], one at a time
pub struct SearchCoordinator {
    index: Arc<UnifiedIndex>,
    cache: Arc<TranscriptCache>,
    config: SearchConfig,
    current: Mutex<Option<Arc<SearchControl>>>,
}

impl SearchCoordinator {
    pub fn new(index: Arc<UnifiedIndex>, cache: Arc<TranscriptCache>, config: SearchConfig) -> Self {
        Self {
            index,
            cache,
            config,
            current: Mutex::new(None),
        }
    }

    pub fn start(&self, filters: Filters) -> Result<SearchHandle> {
        self.launch(filters, None)
    }

    /// Start with `id` already promoted
    pub fn start_prioritized(&self, filters: Filters, id: SessionId) -> Result<SearchHandle> {
        self.launch(filters, Some(id))
    }

    /// Cancel the running search, if any
    pub fn cancel(&self) {
        if let Some(control) = lock(&self.current).as_ref() {
            control.cancel();
        }
    }

    /// Promote on the running search; false when none is running
    pub fn promote(&self, id: SessionId) -> bool {
        match lock(&self.current).as_ref() {
            Some(control) if !control.is_finished() => {
                control.promote(id);
                true
            }
            _ => false,
        }
    }

    fn launch(&self, filters: Filters, promoted: Option<SessionId>) -> Result<SearchHandle> {
        let control = Arc::new(SearchControl::default());
        if let Some(id) = promoted {
            control.promote(id);
        }

        let previous = lock(&self.current).replace(Arc::clone(&control));
        if let Some(previous) = &previous
            && !previous.is_finished()
        {
            tracing::debug!("superseding running search");
            previous.cancel();
        }

        let (tx, rx) = channel();
        let job = SearchJob {
            index: Arc::clone(&self.index),
            cache: Arc::clone(&self.cache),
            config: self.config.clone(),
            filters,
            control: Arc::clone(&control),
            previous,
        };
        let worker = std::thread::Builder::new()
            .name("search-coordinator".to_string())
            .spawn(move || job.run(tx))
            .inspect_err(|_| control.mark_finished())?;

        Ok(SearchHandle {
            control,
            updates: rx,
            worker: Some(worker),
        })
    }
}
