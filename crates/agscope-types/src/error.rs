use thiserror::Error;

/// Result type for agscope-types operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the types layer
#[derive(Error, Debug)]
pub enum Error {
    /// IO operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be parsed from its textual form
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}
