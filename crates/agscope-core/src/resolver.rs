//! Project-key to working-directory lookup.
//!
//! Gemini CLI stores sessions under `sha256(project_root)` and Claude Code
//! under an encoded copy of the project path; neither records the directory
//! itself reliably. The resolver maps those keys back to directories that are
//! known to exist.
//!
//! Lifecycle is populate-then-query: a [`ProjectResolverBuilder`] collects
//! directories (config roots, cwds already read from other sources), then
//! [`ProjectResolverBuilder::build`] freezes it into an immutable
//! [`ProjectResolver`] that decoders share through an `Arc`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::path::{
    claude_project_dir_name, legacy_claude_project_dir_name, normalize_path,
    project_hash_from_root,
};

#[derive(Debug, Default)]
pub struct ProjectResolverBuilder {
    by_key: HashMap<String, PathBuf>,
}

impl ProjectResolverBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a directory under every key form; non-directories are ignored.
    pub fn register_directory(&mut self, dir: &Path) -> &mut Self {
        if !dir.is_dir() {
            tracing::trace!(dir = ?dir, "resolver ignoring non-directory");
            return self;
        }

        let normalized = normalize_path(dir);
        let hash = project_hash_from_root(&normalized.to_string_lossy());
        self.by_key
            .entry(hash.as_str().to_string())
            .or_insert_with(|| normalized.clone());
        self.by_key
            .entry(legacy_claude_project_dir_name(&normalized))
            .or_insert_with(|| normalized.clone());
        self.by_key
            .entry(claude_project_dir_name(&normalized))
            .or_insert(normalized);
        self
    }

    pub fn register_all<'a, I>(&mut self, dirs: I) -> &mut Self
    where
        I: IntoIterator<Item = &'a Path>,
    {
        for dir in dirs {
            self.register_directory(dir);
        }
        self
    }

    pub fn build(self) -> ProjectResolver {
        tracing::debug!(keys = self.by_key.len(), "project resolver built");
        ProjectResolver {
            by_key: self.by_key,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct ProjectResolver {
    by_key: HashMap<String, PathBuf>,
}

impl ProjectResolver {
    pub fn builder() -> ProjectResolverBuilder {
        ProjectResolverBuilder::new()
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Directory registered for a project hash or encoded project name
    pub fn resolve(&self, key: &str) -> Option<&Path> {
        self.by_key.get(key).map(PathBuf::as_path)
    }

    /// Whether `candidate` is the directory a project key was derived from
    pub fn verify(key: &str, candidate: &Path) -> bool {
        let normalized = normalize_path(candidate);
        if project_hash_from_root(&normalized.to_string_lossy()).as_str() == key {
            return true;
        }
        [normalized.as_path(), candidate].iter().any(|path| {
            claude_project_dir_name(path) == key || legacy_claude_project_dir_name(path) == key
        })
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_hash_and_encoded_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut builder = ProjectResolver::builder();
        builder.register_directory(dir.path());
        let resolver = builder.build();

        let normalized = normalize_path(dir.path());
        let hash = project_hash_from_root(&normalized.to_string_lossy());
        assert_eq!(resolver.resolve(hash.as_str()), Some(normalized.as_path()));

        let encoded = claude_project_dir_name(&normalized);
        assert_eq!(resolver.resolve(&encoded), Some(normalized.as_path()));
    }

    #[test]
    fn test_ignores_missing_directories() {
        let mut builder = ProjectResolver::builder();
        builder.register_directory(Path::new("/no/such/dir/for/agscope"));
        assert!(builder.build().is_empty());
    }

    #[test]
    fn test_verify_rejects_other_directory() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        let hash = project_hash_from_root(&a.path().to_string_lossy());
        assert!(ProjectResolver::verify(hash.as_str(), a.path()));
        assert!(!ProjectResolver::verify(hash.as_str(), b.path()));
    }
}
