use serde::{Deserialize, Serialize};

/// Lifecycle of one search invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchState {
    #[default]
    Idle,
    Running,
    Completed,
    Cancelled,
}

impl SearchState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SearchState::Completed | SearchState::Cancelled)
    }
}

/// Progress counters for a running search, split by size group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchProgress {
    pub scanned_small: usize,
    pub scanned_large: usize,
    pub total_small: usize,
    pub total_large: usize,
    pub state: SearchState,
}

impl SearchProgress {
    pub fn new(total_small: usize, total_large: usize) -> Self {
        Self {
            total_small,
            total_large,
            state: SearchState::Running,
            ..Default::default()
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == SearchState::Running
    }

    pub fn is_cancelled(&self) -> bool {
        self.state == SearchState::Cancelled
    }

    pub fn scanned(&self) -> usize {
        self.scanned_small + self.scanned_large
    }

    pub fn total(&self) -> usize {
        self.total_small + self.total_large
    }

    /// Completion ratio in [0, 1]; an empty search counts as complete
    pub fn fraction(&self) -> f64 {
        if self.total() == 0 {
            1.0
        } else {
            self.scanned() as f64 / self.total() as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction() {
        let mut progress = SearchProgress::new(3, 1);
        assert!(progress.is_running());
        progress.scanned_small = 3;
        assert_eq!(progress.fraction(), 0.75);
        assert_eq!(SearchProgress::default().fraction(), 1.0);
    }
}
