use agscope_core::{ProjectResolver, repo_name_from_cwd};
use agscope_types::Session;
use chrono::{DateTime, Utc};
use serde_json::Value;

use super::cwd::{cwd_candidates, cwd_markers, resolve_cwd};
use super::timestamp::find_timestamp;
use super::title::derive_title;

/// Session metadata accumulated while records stream past.
///
/// Lightweight and full parses feed the same scan, so both produce the
/// same title, model, branch and working directory for a file.
#[derive(Debug, Default, Clone)]
pub struct MetadataScan {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub model: Option<String>,
    pub git_branch: Option<String>,
    pub title: Option<String>,
    pub cwd_candidates: Vec<String>,
    /// Project hash or encoded project directory name, when the source has one
    pub project_key: Option<String>,
    pub records: usize,
    pub corrupt: usize,
}

impl MetadataScan {
    pub fn new(project_key: Option<String>) -> Self {
        Self {
            project_key,
            ..Default::default()
        }
    }

    /// Generic fields every source may carry: timestamp, model, branch, cwd
    pub fn observe_record(&mut self, record: &Value) {
        self.records += 1;

        if let Some(ts) = find_timestamp(record) {
            self.observe_timestamp(ts);
        }

        if self.model.is_none() {
            let model = [Some(record), record.get("payload"), record.get("message")]
                .into_iter()
                .flatten()
                .find_map(|scope| scope.get("model").and_then(Value::as_str));
            if let Some(model) = model {
                self.observe_model(model);
            }
        }

        if self.git_branch.is_none() {
            let branch = record
                .get("gitBranch")
                .or_else(|| record.get("git_branch"))
                .or_else(|| record.get("branch"))
                .or_else(|| record.pointer("/payload/git/branch"))
                .or_else(|| record.pointer("/git/branch"))
                .or_else(|| record.pointer("/repo/branch"))
                .and_then(Value::as_str);
            if let Some(branch) = branch.filter(|b| !b.trim().is_empty()) {
                self.git_branch = Some(branch.trim().to_string());
            }
        }

        cwd_candidates(record, &mut self.cwd_candidates);
    }

    pub fn observe_timestamp(&mut self, ts: DateTime<Utc>) {
        self.start_time = Some(self.start_time.map_or(ts, |s| s.min(ts)));
        self.end_time = Some(self.end_time.map_or(ts, |e| e.max(ts)));
    }

    /// First real model name wins; placeholders like `<synthetic>` are ignored
    pub fn observe_model(&mut self, model: &str) {
        let model = model.trim();
        if self.model.is_none() && !model.is_empty() && !model.starts_with('<') {
            self.model = Some(model.to_string());
        }
    }

    /// User-authored text: title candidate and `<cwd>` markers
    pub fn observe_user_text(&mut self, text: &str) {
        cwd_markers(text, &mut self.cwd_candidates);
        if self.title.is_none() {
            self.title = derive_title(text);
        }
    }

    pub fn observe_corrupt(&mut self) {
        self.corrupt += 1;
    }

    /// Write the scan into a session, trusting cwd only after validation
    pub fn apply(self, session: &mut Session, resolver: &ProjectResolver) {
        session.start_time = self.start_time;
        session.end_time = self.end_time;
        session.model = self.model;
        session.git_branch = self.git_branch;
        session.lightweight_title = self.title;
        session.corrupt_records = self.corrupt;

        let cwd = resolve_cwd(self.project_key.as_deref(), &self.cwd_candidates, resolver);
        session.repo_name = cwd.as_deref().and_then(repo_name_from_cwd);
        session.cwd = cwd;
        session.project_hash = self.project_key;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agscope_types::Source;
    use serde_json::json;
    use std::path::Path;

    #[test]
    fn test_time_range_is_min_max() {
        let mut scan = MetadataScan::default();
        scan.observe_record(&json!({"timestamp": "2025-01-02T00:00:00Z"}));
        scan.observe_record(&json!({"timestamp": "2025-01-01T00:00:00Z"}));
        scan.observe_record(&json!({"timestamp": "2025-01-03T00:00:00Z"}));
        assert_eq!(
            scan.start_time.unwrap().to_rfc3339(),
            "2025-01-01T00:00:00+00:00"
        );
        assert_eq!(scan.end_time.unwrap().to_rfc3339(), "2025-01-03T00:00:00+00:00");
        assert_eq!(scan.records, 3);
    }

    #[test]
    fn test_first_title_and_model_win() {
        let mut scan = MetadataScan::default();
        scan.observe_user_text("<command-name>/init</command-name>");
        scan.observe_user_text("first real prompt");
        scan.observe_user_text("second prompt");
        scan.observe_record(&json!({"payload": {"model": "gpt-5"}}));
        scan.observe_record(&json!({"model": "o3"}));
        assert_eq!(scan.title.as_deref(), Some("first real prompt"));
        assert_eq!(scan.model.as_deref(), Some("gpt-5"));
    }

    #[test]
    fn test_apply_drops_unverified_cwd() {
        let dir = tempfile::tempdir().unwrap();
        let mut scan = MetadataScan::default();
        scan.observe_record(&json!({"cwd": "/no/such/agscope/dir"}));
        scan.observe_record(&json!({"cwd": dir.path().to_string_lossy()}));

        let mut session = Session::for_file(Source::Claude, Path::new("/tmp/s.jsonl"), 1);
        scan.apply(&mut session, &ProjectResolver::empty());
        let expected = agscope_core::normalize_path(dir.path());
        assert_eq!(session.cwd.as_deref(), Some(&*expected.to_string_lossy()));
        assert_eq!(
            session.repo_name,
            expected.file_name().map(|n| n.to_string_lossy().to_string())
        );
    }
}
