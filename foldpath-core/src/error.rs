//! Error types for foldpath-core.

use thiserror::Error;

/// Result type alias for foldpath operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for foldpath operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Invalid analysis parameter (cluster count, window size, cutoffs, ...).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Malformed native-contact rows or analysis input.
    #[error("format error: {0}")]
    Format(String),

    /// The native contact map holds no contacts, so Q is undefined.
    #[error("native contact map is empty")]
    EmptyMap,
}

impl Error {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub(crate) fn format(message: impl Into<String>) -> Self {
        Self::Format(message.into())
    }
}
