//! Error types for pagetrail.
//!
//! Library crates use [`PagetrailError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Only argument, start-URL, config and persistence errors are fatal to a
//! crawl. [`PagetrailError::Fetch`] and [`PagetrailError::InvalidUrl`] raised
//! for discovered links are recovered page-by-page inside the engine.

use std::path::PathBuf;

/// Top-level error type for all pagetrail operations.
#[derive(Debug, thiserror::Error)]
pub enum PagetrailError {
    /// A caller-supplied argument is out of range (e.g. negative depth).
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// A URL could not be parsed or resolved.
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Network, HTTP or body-read failure for a single page.
    #[error("fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    /// Report writer could not persist its artifact.
    #[error("failed to persist report to {path:?}: {source}")]
    Persistence {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error outside of report persistence.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// HTML-to-Markdown conversion error.
    #[error("conversion error: {0}")]
    Conversion(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PagetrailError>;

impl PagetrailError {
    /// Create an invalid-argument error from any displayable message.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: msg.into(),
        }
    }

    /// Create an invalid-URL error for `url`.
    pub fn invalid_url(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a per-page fetch error.
    pub fn fetch(url: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            message: msg.into(),
        }
    }

    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Wrap a report-writing `std::io::Error` with the artifact path.
    pub fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persistence {
            path: path.into(),
            source,
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
