//! Error types for the template transform.

use std::path::PathBuf;

/// Errors that abort the transform of one document.
#[derive(Debug, thiserror::Error)]
pub enum AtelierError {
    /// IO error while reading a configuration file.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The global template configuration is not valid JSON or has the wrong shape.
    #[error("invalid template config {path}: {source}")]
    TemplateConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A rule or fallback pattern does not compile.
    #[error("invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A dependency package manifest is not valid JSON or has the wrong shape.
    #[error("invalid package manifest {path}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Fallback rule without a `test` pattern.
    #[error("fallback rule is missing `test`")]
    FallbackMissingTest,

    /// Fallback rule without a `use` chain.
    #[error("fallback rule is missing `use`")]
    FallbackMissingUse,

    /// Empty path handed to the fallback chain builder.
    #[error("fallback path must be a non-empty string")]
    InvalidFallbackPath,

    /// Document located outside the build's working root.
    #[error("document {document} is outside the working root {root}")]
    OutsideWorkingRoot { document: PathBuf, root: PathBuf },

    /// Invalid per-document loader options.
    #[error("invalid loader options: {0}")]
    Options(#[from] serde_json::Error),
}

/// Result type for transform operations.
pub type AtelierResult<T> = Result<T, AtelierError>;
