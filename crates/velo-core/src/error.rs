//! Error types for the route segment engine.

use thiserror::Error;

/// Why an edit was rejected. Rejected edits leave the store untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidEdit {
    #[error("edit requires both start and end to be set")]
    MissingEndpoints,
    #[error("waypoint index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// Transport failure, non-2xx status or malformed response body.
    #[error("routing request failed: {0}")]
    FetchFailure(String),
    /// The routing service answered but found no route.
    #[error("routing service returned no route")]
    EmptyResult,
    #[error(transparent)]
    InvalidEdit(#[from] InvalidEdit),
}

pub type Result<T, E = RouteError> = std::result::Result<T, E>;
