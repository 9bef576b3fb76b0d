use agscope_core::{ProjectResolver, normalize_path};
use regex::Regex;
use serde_json::Value;
use std::path::Path;
use std::sync::LazyLock;

/// Keys that may hold a working directory, at the top level or under `payload`
const CWD_KEYS: &[&str] = &[
    "cwd",
    "working_directory",
    "workingDirectory",
    "workdir",
    "project_root",
    "projectRoot",
];

/// `<cwd>/path</cwd>` markers embedded in message text
static CWD_MARKER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<cwd>\s*([^<]+?)\s*</cwd>").unwrap());

/// Working-directory values a record claims, unverified
pub fn cwd_candidates(record: &Value, out: &mut Vec<String>) {
    for scope in [Some(record), record.get("payload")].into_iter().flatten() {
        let Some(obj) = scope.as_object() else {
            continue;
        };
        for key in CWD_KEYS {
            if let Some(cwd) = obj.get(*key).and_then(Value::as_str)
                && !cwd.trim().is_empty()
                && !out.iter().any(|c| c == cwd)
            {
                out.push(cwd.trim().to_string());
            }
        }
    }
}

/// Working directories named by `<cwd>` markers in text
pub fn cwd_markers(text: &str, out: &mut Vec<String>) {
    for cap in CWD_MARKER_REGEX.captures_iter(text) {
        let cwd = cap[1].to_string();
        if !out.contains(&cwd) {
            out.push(cwd);
        }
    }
}

/// Pick a trusted working directory.
///
/// A directory the resolver registered for the project key wins. Otherwise a
/// candidate from log content is accepted only if it exists as a directory
/// and, when a project key is known, hashes or encodes to that key.
pub fn resolve_cwd(
    project_key: Option<&str>,
    candidates: &[String],
    resolver: &ProjectResolver,
) -> Option<String> {
    if let Some(key) = project_key
        && let Some(dir) = resolver.resolve(key)
    {
        return Some(dir.to_string_lossy().to_string());
    }

    candidates.iter().find_map(|candidate| {
        let path = Path::new(candidate);
        if !path.is_dir() {
            tracing::trace!(cwd = %candidate, "rejecting cwd: not a directory");
            return None;
        }
        if let Some(key) = project_key
            && !ProjectResolver::verify(key, path)
        {
            tracing::debug!(cwd = %candidate, key, "rejecting cwd: project key mismatch");
            return None;
        }
        Some(normalize_path(path).to_string_lossy().to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use agscope_core::project_hash_from_root;
    use serde_json::json;

    #[test]
    fn test_candidates_from_keys_and_payload() {
        let mut out = Vec::new();
        cwd_candidates(
            &json!({"cwd": "/a", "payload": {"workingDirectory": "/b", "cwd": "/a"}}),
            &mut out,
        );
        assert_eq!(out, vec!["/a".to_string(), "/b".to_string()]);
    }

    #[test]
    fn test_markers() {
        let mut out = Vec::new();
        cwd_markers(
            "<environment_context>\n  <cwd>/home/me/proj</cwd>\n</environment_context>",
            &mut out,
        );
        assert_eq!(out, vec!["/home/me/proj".to_string()]);
    }

    #[test]
    fn test_missing_directory_is_rejected() {
        let resolver = ProjectResolver::empty();
        let candidates = vec!["/definitely/not/here/agscope".to_string()];
        assert_eq!(resolve_cwd(None, &candidates, &resolver), None);
    }

    #[test]
    fn test_spoofed_cwd_is_rejected_by_hash() {
        let real = tempfile::tempdir().unwrap();
        let spoof = tempfile::tempdir().unwrap();
        let hash = project_hash_from_root(&real.path().to_string_lossy());
        let resolver = ProjectResolver::empty();

        let candidates = vec![spoof.path().to_string_lossy().to_string()];
        assert_eq!(resolve_cwd(Some(hash.as_str()), &candidates, &resolver), None);

        let candidates = vec![real.path().to_string_lossy().to_string()];
        assert_eq!(
            resolve_cwd(Some(hash.as_str()), &candidates, &resolver),
            Some(normalize_path(real.path()).to_string_lossy().to_string())
        );
    }

    #[test]
    fn test_resolver_entry_wins() {
        let dir = tempfile::tempdir().unwrap();
        let mut builder = ProjectResolver::builder();
        builder.register_directory(dir.path());
        let resolver = builder.build();
        let hash = project_hash_from_root(&dir.path().to_string_lossy());

        let resolved = resolve_cwd(Some(hash.as_str()), &[], &resolver);
        assert_eq!(
            resolved,
            Some(normalize_path(dir.path()).to_string_lossy().to_string())
        );
    }
}
