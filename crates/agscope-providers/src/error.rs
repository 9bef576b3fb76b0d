use std::path::PathBuf;
use thiserror::Error;

/// Result type for agscope-providers operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the providers layer
#[derive(Error, Debug)]
pub enum Error {
    /// File could not be opened or read (permissions, vanished file)
    #[error("Unreadable file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File was read but holds nothing decodable (empty, not JSON, no valid records)
    #[error("Not indexable {path}: {reason}")]
    NotIndexable { path: PathBuf, reason: String },

    /// A source root could not be enumerated
    #[error("Source root not accessible: {0}")]
    RootNotAccessible(PathBuf),

    /// Source name did not match any decoder
    #[error("Unknown source: {0}")]
    UnknownSource(String),

    /// IO operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Walkdir error
    #[error("Directory traversal error: {0}")]
    WalkDir(#[from] walkdir::Error),
}

impl Error {
    pub(crate) fn unreadable(path: &std::path::Path, source: std::io::Error) -> Self {
        Error::Unreadable {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn not_indexable(path: &std::path::Path, reason: impl Into<String>) -> Self {
        Error::NotIndexable {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Whether the file was readable but held no decodable content
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Error::NotIndexable { .. })
    }
}
