//! Harness error types.
//!
//! [`HarnessError`] covers everything that can go wrong *around* an
//! assertion: malformed JSON, filesystem trouble, an unbuildable request or a
//! bad configuration. Assertion operations never hand these back to the test;
//! they convert them into a [`TestFailure`](crate::TestFailure) instead.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`HarnessError`].
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Errors produced by the harness plumbing.
#[derive(Error, Debug)]
pub enum HarnessError {
    /// JSON text failed to parse or serialize.
    #[error("malformed JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),

    /// Filesystem operation failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Path the operation was applied to.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The temporary directory could not be created or removed.
    ///
    /// The underlying error already names the directory.
    #[error("temporary directory error: {0}")]
    TempDir(#[source] std::io::Error),

    /// A file name that would resolve outside the context's directory.
    #[error("file name {} must be relative and stay inside the test directory", name.display())]
    OutsideDirectory {
        /// The rejected name.
        name: PathBuf,
    },

    /// The context was built without a temporary directory.
    #[error("test context has no temporary directory")]
    NoDirectory,

    /// A synthetic request could not be constructed.
    #[error("failed to build request: {reason}")]
    RequestBuild {
        /// What was wrong with the request.
        reason: String,
        /// The typed error that caused it.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Invalid configuration value.
    #[error("invalid configuration value for {field}: {reason}")]
    InvalidConfig {
        /// The field with the invalid value.
        field: String,
        /// Explanation of why the value is invalid.
        reason: String,
    },
}

impl HarnessError {
    /// Creates an I/O error bound to a path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a request build error caused by `source`.
    pub fn request_build_from<E>(reason: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::RequestBuild {
            reason: reason.into(),
            source: Box::new(source),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
