//! Error types for the audit pipeline.
//!
//! Provider failures live in `perceptor-providers`; the engine only sees
//! them as `anyhow::Error` and turns them into placeholder responses.

use thiserror::Error;

/// Errors raised while reading the synthesis call's output.
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// No `{ ... }` span could be found in the model output.
    #[error("no JSON object found in synthesis response")]
    NoJsonObject,

    /// A JSON span was found but did not parse.
    #[error("invalid synthesis JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Errors raised by an [`AuditStore`](crate::store::AuditStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The referenced project does not exist.
    #[error("project not found: {0}")]
    ProjectNotFound(String),

    /// The referenced report does not exist.
    #[error("report not found: {0}")]
    ReportNotFound(uuid::Uuid),

    /// Reading or writing the backing files failed.
    #[error("storage I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The backing files contain malformed JSON.
    #[error("corrupt store file {path}: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
