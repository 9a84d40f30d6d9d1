//! Error types for update resolution

use thiserror::Error;

use crate::version::{MalformedBuildIdError, MalformedVersionError};

/// Failure of an external collaborator (rule, release or shutoff lookup)
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid catalog document: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ResolveError {
    /// Client sent a version we cannot parse
    #[error(transparent)]
    MalformedVersion(#[from] MalformedVersionError),

    /// Client sent a build id we cannot parse
    #[error(transparent)]
    MalformedBuildId(#[from] MalformedBuildIdError),

    /// Client request could not be decoded
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A stored rule pattern is malformed
    #[error("Bad rule data: {0}")]
    BadData(String),

    #[error("No rule matches the query")]
    NoMatch,

    #[error("{0} not found")]
    NotFound(String),

    #[error("Collaborator lookup failed: {0}")]
    Source(#[from] SourceError),
}

impl ResolveError {
    /// Errors caused by the request itself; these should be rejected, not retried
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ResolveError::MalformedVersion(_)
                | ResolveError::MalformedBuildId(_)
                | ResolveError::BadRequest(_)
        )
    }

    /// Outcomes that mean "serve nothing" rather than a failure
    pub fn is_no_update(&self) -> bool {
        matches!(self, ResolveError::NoMatch | ResolveError::NotFound(_))
    }
}
