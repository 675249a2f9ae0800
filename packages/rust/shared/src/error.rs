//! Error types for collectonce.
//!
//! Library crates use [`CollectError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all collectonce operations.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    /// Configuration loading error (unreadable source, broken prompt, ...).
    #[error("config error: {message}")]
    Config { message: String },

    /// A configuration was found but fails the crawl bounds.
    #[error("invalid crawl configuration: {message}")]
    Validation { message: String },

    /// Network/HTTP error during a crawl.
    #[error("network error: {0}")]
    Network(String),

    /// A keyword's collection failed hard; the batch was aborted.
    #[error("collecting '{keyword}' failed during {stage}: {source}")]
    Keyword {
        keyword: String,
        stage: String,
        #[source]
        source: Box<CollectError>,
    },

    /// JSON (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CollectError>;

impl CollectError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Attach the failing keyword and stage to a hard collection error.
    pub fn keyword(keyword: impl Into<String>, stage: impl Into<String>, source: Self) -> Self {
        Self::Keyword {
            keyword: keyword.into(),
            stage: stage.into(),
            source: Box::new(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = CollectError::validation("branches must be at least 1");
        assert_eq!(
            err.to_string(),
            "invalid crawl configuration: branches must be at least 1"
        );

        let err = CollectError::config("prompt closed");
        assert_eq!(err.to_string(), "config error: prompt closed");
    }

    #[test]
    fn keyword_error_names_keyword_and_stage() {
        let err = CollectError::keyword(
            "rust",
            "seed expansion",
            CollectError::Network("connection refused".into()),
        );
        let msg = err.to_string();
        assert!(msg.contains("'rust'"));
        assert!(msg.contains("seed expansion"));
        assert!(msg.contains("connection refused"));
    }
}
