use agscope_types::{SearchProgress, SearchState, Session};
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

use super::SearchUpdate;

/// Coalesces matches and progress into at most one delivery per interval.
///
/// Matches found between deliveries are buffered; [`UpdateEmitter::finish`]
/// flushes whatever is left. Send errors mean the receiver was dropped and
/// are ignored.
pub(crate) struct UpdateEmitter {
    tx: Sender<SearchUpdate>,
    interval: Duration,
    last_sent: Option<Instant>,
    pending: Vec<Arc<Session>>,
    dirty: bool,
}

impl UpdateEmitter {
    pub(crate) fn new(tx: Sender<SearchUpdate>, interval: Duration) -> Self {
        Self {
            tx,
            interval,
            last_sent: None,
            pending: Vec::new(),
            dirty: false,
        }
    }

    pub(crate) fn push_matches(&mut self, matches: impl IntoIterator<Item = Arc<Session>>) {
        self.pending.extend(matches);
    }

    /// Record new progress; delivers if the interval has elapsed
    pub(crate) fn progress(&mut self, progress: SearchProgress) {
        self.dirty = true;
        let due = self
            .last_sent
            .is_none_or(|last| last.elapsed() >= self.interval);
        if due {
            self.flush(progress);
        }
    }

    fn flush(&mut self, progress: SearchProgress) {
        if !self.pending.is_empty() {
            let matches = std::mem::take(&mut self.pending);
            let _ = self.tx.send(SearchUpdate::Matches(matches));
        }
        if self.dirty {
            let _ = self.tx.send(SearchUpdate::Progress(progress));
            self.dirty = false;
        }
        self.last_sent = Some(Instant::now());
    }

    pub(crate) fn finish(mut self, progress: SearchProgress) {
        self.dirty = true;
        self.flush(progress);
        let _ = self.tx.send(SearchUpdate::Finished(progress.state));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agscope_types::Source;
    use std::path::Path;
    use std::sync::mpsc::channel;

    fn session(name: &str) -> Arc<Session> {
        Arc::new(Session::for_file(Source::Codex, Path::new(name), 1))
    }

    #[test]
    fn test_throttles_between_deliveries() {
        let (tx, rx) = channel();
        let mut emitter = UpdateEmitter::new(tx, Duration::from_secs(3600));

        emitter.push_matches([session("/a")]);
        emitter.progress(SearchProgress::new(2, 0));
        emitter.push_matches([session("/b")]);
        emitter.progress(SearchProgress::new(2, 0));

        let first: Vec<SearchUpdate> = rx.try_iter().collect();
        assert_eq!(first.len(), 2);
        assert!(matches!(&first[0], SearchUpdate::Matches(m) if m.len() == 1));

        let mut done = SearchProgress::new(2, 0);
        done.state = SearchState::Completed;
        emitter.finish(done);

        let rest: Vec<SearchUpdate> = rx.try_iter().collect();
        assert!(matches!(&rest[0], SearchUpdate::Matches(m) if m.len() == 1));
        assert!(matches!(rest.last(), Some(SearchUpdate::Finished(SearchState::Completed))));
    }
}
