use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// A log file found under a source root, before any parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified_at: Option<DateTime<Utc>>,
}
