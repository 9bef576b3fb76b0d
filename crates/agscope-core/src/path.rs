use agscope_types::sha256_hex;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

pub use agscope_types::normalize_path;

/// SHA-256 of a normalized project directory, as Gemini CLI names its per-project folders
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectHash(String);

impl ProjectHash {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolve the data directory path based on priority:
/// 1. Explicit path (with tilde expansion)
/// 2. AGSCOPE_PATH environment variable (with tilde expansion)
/// 3. System data directory (recommended default)
/// 4. ~/.agscope (fallback for systems without standard data directory)
pub fn resolve_data_dir(explicit_path: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit_path {
        return Ok(expand_tilde(path));
    }

    if let Ok(env_path) = std::env::var("AGSCOPE_PATH") {
        return Ok(expand_tilde(&env_path));
    }

    if let Some(data_dir) = dirs::data_dir() {
        return Ok(data_dir.join("agscope"));
    }

    if let Some(home) = dirs::home_dir() {
        return Ok(home.join(".agscope"));
    }

    Err(Error::Config(
        "Could not determine data path: no HOME directory or system data directory found"
            .to_string(),
    ))
}

/// Expand tilde (~) in paths to the user's home directory
pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(stripped);
    }
    PathBuf::from(path)
}

/// Calculate project_hash from project_root using SHA256
///
/// The path is canonicalized first, so `/var/folders/...` and
/// `/private/var/folders/...` hash the same on macOS.
pub fn project_hash_from_root(project_root: &str) -> ProjectHash {
    let normalized = normalize_path(Path::new(project_root));
    ProjectHash::new(sha256_hex(normalized.to_string_lossy().as_bytes()))
}

/// Directory name Claude Code uses for a project: `/Users/foo/bar.rs` -> `-Users-foo-bar-rs`
///
/// Every character outside `[A-Za-z0-9]` becomes `-`.
pub fn claude_project_dir_name(project_root: &Path) -> String {
    project_root
        .to_string_lossy()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}

/// Older Claude Code releases only replaced separators and dots
pub fn legacy_claude_project_dir_name(project_root: &Path) -> String {
    project_root
        .to_string_lossy()
        .replace(['/', '\\', '.', ':'], "-")
}

/// Repository name shown for a working directory (its final path component)
pub fn repo_name_from_cwd(cwd: &str) -> Option<String> {
    let trimmed = cwd.trim_end_matches(['/', '\\']);
    Path::new(trimmed)
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .filter(|name| !name.is_empty())
}

/// Check if two paths are equivalent after normalization
pub fn paths_equal(path1: &Path, path2: &Path) -> bool {
    normalize_path(path1) == normalize_path(path2)
}
