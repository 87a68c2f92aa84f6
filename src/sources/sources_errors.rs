use thiserror::Error;

use super::sources_model::ResourceKind;

/// Failure classes for source resolution and fetching.
///
/// `UnknownSource` is a configuration error: it is raised during descriptor
/// resolution, before any fan-out, and is never isolated. Every other
/// variant is scoped to a single fetch task.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Unknown source '{0}'")]
    UnknownSource(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP error {0}")]
    Status(reqwest::StatusCode),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Rate limit exceeded, try again later")]
    RateLimitExceeded,

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Unexpected payload: {0}")]
    Parse(String),

    #[error("{1} checking is not supported by {0}")]
    Unsupported(String, ResourceKind),
}

impl SourceError {
    /// True for errors that abort the whole call rather than a single task.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SourceError::UnknownSource(_))
    }
}
