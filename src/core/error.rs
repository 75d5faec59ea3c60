//! Error types and handling for Massive Stub
//!
//! This module defines all error types used throughout the emulator.
//! A read of a missing path is never an error; it yields a null snapshot.

use thiserror::Error;

/// Main result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the emulator
#[derive(Error, Debug)]
pub enum Error {
    /// A path string that resolves to zero segments
    #[error("Invalid path: {0:?}")]
    InvalidPath(String),

    /// An async operation or listener was scheduled with no tokio runtime
    #[error("No async runtime available to schedule event delivery")]
    NoRuntime,

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Seed data could not be loaded
    #[error("Seed error: {0}")]
    Seed(String),

    /// A listener callback panicked during delivery
    #[error("Listener panicked while handling {event} at {path:?}")]
    ListenerPanicked {
        /// Event type being delivered
        event: String,
        /// Path the listener was registered at
        path: String,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors from std
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Prometheus metrics errors
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl Error {
    /// Create an invalid path error
    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self::InvalidPath(path.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a seed error
    pub fn seed(msg: impl Into<String>) -> Self {
        Self::Seed(msg.into())
    }

    /// Check if this error was caused by caller input
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidPath(_) | Error::Config(_) | Error::Seed(_) | Error::Serialization(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_path_is_client_error() {
        let err = Error::invalid_path("//");
        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "Invalid path: \"//\"");
    }

    #[test]
    fn runtime_errors_are_not_client_errors() {
        assert!(!Error::NoRuntime.is_client_error());
        let panicked = Error::ListenerPanicked { event: "value".into(), path: "resumes".into() };
        assert!(!panicked.is_client_error());
    }
}
