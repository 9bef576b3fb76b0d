use agscope_types::{Session, SessionId};
use std::collections::VecDeque;
use std::sync::Arc;

/// Pending requests to move large sessions to the front of the phase-2 queue.
///
/// Requests are applied just before each large-file pick. An id that is not
/// in the remaining queue (already processed, or a small session) is dropped
/// without effect.
#[derive(Debug, Default)]
pub struct PromotionQueue {
    requests: Vec<SessionId>,
}

impl PromotionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self, id: SessionId) {
        self.requests.push(id);
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Apply pending requests in arrival order; the latest request ends up first.
    /// Returns how many sessions moved.
    pub fn apply(&mut self, remaining: &mut VecDeque<Arc<Session>>) -> usize {
        let mut moved = 0;
        for id in self.requests.drain(..) {
            if let Some(pos) = remaining.iter().position(|s| s.id == id) {
                if let Some(session) = remaining.remove(pos) {
                    remaining.push_front(session);
                    moved += 1;
                }
            } else {
                tracing::debug!(session = %id.short(), "promotion ignored: not queued");
            }
        }
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agscope_types::Source;
    use std::path::Path;

    fn queue(names: &[&str]) -> VecDeque<Arc<Session>> {
        names
            .iter()
            .map(|n| {
                Arc::new(Session::for_file(
                    Source::Codex,
                    Path::new(&format!("/tmp/{}.jsonl", n)),
                    1,
                ))
            })
            .collect()
    }

    fn names(queue: &VecDeque<Arc<Session>>) -> Vec<String> {
        queue
            .iter()
            .map(|s| s.file_path.file_stem().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_promoted_session_moves_to_front() {
        let mut remaining = queue(&["a", "b", "c", "d"]);
        let target = remaining[2].id.clone();
        let mut promotions = PromotionQueue::new();
        promotions.request(target);

        assert_eq!(promotions.apply(&mut remaining), 1);
        assert_eq!(names(&remaining), vec!["c", "a", "b", "d"]);
        assert!(promotions.is_empty());
    }

    #[test]
    fn test_latest_request_wins_front() {
        let mut remaining = queue(&["a", "b", "c"]);
        let mut promotions = PromotionQueue::new();
        promotions.request(remaining[1].id.clone());
        promotions.request(remaining[2].id.clone());
        promotions.apply(&mut remaining);
        assert_eq!(names(&remaining), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_unknown_id_is_noop() {
        let mut remaining = queue(&["a", "b"]);
        let mut promotions = PromotionQueue::new();
        promotions.request(SessionId::new("not-queued"));
        assert_eq!(promotions.apply(&mut remaining), 0);
        assert_eq!(names(&remaining), vec!["a", "b"]);
    }
}
