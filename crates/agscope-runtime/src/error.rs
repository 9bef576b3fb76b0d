use thiserror::Error;

/// Result type for agscope-runtime operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the runtime layer
#[derive(Error, Debug)]
pub enum Error {
    /// Provider layer error
    #[error("Provider error: {0}")]
    Provider(#[from] agscope_providers::Error),

    /// Path/resolver layer error
    #[error("{0}")]
    Core(#[from] agscope_core::Error),

    /// IO operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Every enabled source was empty or inaccessible
    #[error("No sessions found in any enabled source")]
    NoSessionsFound,

    /// No session matched the requested id or prefix
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// An id prefix matched more than one session
    #[error("Ambiguous session id {prefix}: {count} sessions match")]
    AmbiguousSession { prefix: String, count: usize },
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}
